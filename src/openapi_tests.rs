#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        for schema in [
            "ErrorResponse",
            "HealthResponse",
            "StudentResponse",
            "StudentAccountResponse",
            "CalendarEventRequest",
            "RolloverSummary",
            "BalanceBreakdown",
            "FinancialReport",
        ] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }

        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");

        assert!(properties.contains(&"success".to_string()));
        assert!(properties.contains(&"message".to_string()));
        assert!(properties.contains(&"code".to_string()));
        assert!(properties.contains(&"error".to_string()));
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");

        assert!(properties.contains(&"status".to_string()));
        assert!(properties.contains(&"version".to_string()));
        assert!(properties.contains(&"database".to_string()));
    }

    #[test]
    fn test_student_account_exposes_computed_balance() {
        let properties = object_properties("StudentAccountResponse");

        assert!(properties.contains(&"balance".to_string()));
        assert!(properties.contains(&"balance_status".to_string()));
        assert!(properties.contains(&"total_due".to_string()));
    }

    #[test]
    fn test_openapi_paths() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/auth/login", PathItemType::Post),
            ("/api/students", PathItemType::Get),
            ("/api/students/{student_id}/balance", PathItemType::Get),
            ("/api/applications/{application_id}/approve", PathItemType::Post),
            ("/api/payments", PathItemType::Post),
            ("/api/academic-calendar", PathItemType::Post),
            ("/api/academic-calendar/{event_id}", PathItemType::Put),
            ("/api/reports/dues", PathItemType::Get),
            ("/api/export/{entity}/{format}", PathItemType::Get),
        ];
        for (path, method) in expected {
            let item = paths.get(path).unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "missing operation on {}", path);
        }
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
