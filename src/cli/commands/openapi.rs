use anyhow::Result;
use utoipa::OpenApi;

use crate::cli::OpenApiFormat;
use crate::schemas::ApiDoc;

/// Writes the OpenAPI document to stdout.
pub fn print_openapi(format: OpenApiFormat) -> Result<()> {
    let doc = ApiDoc::openapi();
    let rendered = match format {
        OpenApiFormat::Json => serde_json::to_string_pretty(&doc)?,
        OpenApiFormat::Yaml => serde_yaml::to_string(&doc)?,
    };
    println!("{}", rendered);
    Ok(())
}
