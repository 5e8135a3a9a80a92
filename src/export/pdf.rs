use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{ExportError, ExportTable};

// A4 landscape
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 6.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 9.0;

/// Cuts `text` so it fits a column of `width` mm at body size.
fn fit(text: &str, width: f32) -> String {
    // Helvetica at 9pt averages about 1.8mm per character
    let max_chars = ((width - 2.0) / 1.8).max(3.0) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn write_row(layer: &PdfLayerReference, cells: &[String], y: f32, column_width: f32, font: &IndirectFontRef) {
    for (index, cell) in cells.iter().enumerate() {
        let x = MARGIN + index as f32 * column_width;
        layer.use_text(fit(cell, column_width), BODY_SIZE, Mm(x), Mm(y), font);
    }
}

/// Renders the table on as many landscape pages as it needs, repeating the
/// header row on each.
pub fn render(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(table.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let columns = table.headers.len().max(1);
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(
        table.title.as_str(),
        TITLE_SIZE,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - MARGIN),
        &bold,
    );
    let mut y = PAGE_HEIGHT - MARGIN - 12.0;
    write_row(&layer, &table.headers, y, column_width, &bold);

    for row in &table.rows {
        y -= ROW_HEIGHT;
        if y < MARGIN {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - MARGIN;
            write_row(&layer, &table.headers, y, column_width, &bold);
            y -= ROW_HEIGHT;
        }
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        write_row(&layer, &cells, y, column_width, &regular);
    }

    doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))
}
