#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;
    use utoipa::openapi::PathItemType;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("FieldErrors"));
        assert!(components.schemas.contains_key("RegisterForm"));
        assert!(components.schemas.contains_key("ProfileUpdateRequest"));
        assert!(components.schemas.contains_key("RelationState"));

        // Verify that the schema can be serialized to JSON without errors
        let json_result = serde_json::to_string(&openapi);
        assert!(json_result.is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) =
            error_response_schema
        {
            let properties = &obj.properties;
            assert!(properties.contains_key("error"));
            assert!(properties.contains_key("code"));
            assert!(properties.contains_key("success"));
            assert!(properties.contains_key("field_errors"));
            assert!(!obj.required.contains(&"field_errors".to_string()));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let health_response_schema = components.schemas.get("HealthResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) =
            health_response_schema
        {
            let properties = &obj.properties;
            assert!(properties.contains_key("status"));
            assert!(properties.contains_key("version"));
            assert!(properties.contains_key("database"));
        } else {
            panic!("HealthResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        let health_path = openapi.paths.paths.get("/health").unwrap();
        let health_get = health_path.operations.get(&PathItemType::Get).unwrap();

        let responses = &health_get.responses;
        assert!(responses.responses.contains_key("200"));
        assert!(responses.responses.contains_key("500"));
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/api/v1/register", PathItemType::Get),
            ("/api/v1/register", PathItemType::Post),
            ("/api/v1/login", PathItemType::Post),
            ("/api/v1/profile", PathItemType::Get),
            ("/api/v1/profile", PathItemType::Post),
            ("/api/v1/profiles", PathItemType::Get),
            ("/api/v1/profiles/to-invite", PathItemType::Get),
            ("/api/v1/invitations", PathItemType::Get),
            ("/api/v1/invitations/send", PathItemType::Post),
            ("/api/v1/invitations/accept", PathItemType::Post),
            ("/api/v1/invitations/reject", PathItemType::Post),
            ("/api/v1/friends", PathItemType::Get),
            ("/api/v1/friends/remove", PathItemType::Post),
            ("/api/v1/reports", PathItemType::Post),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(
                item.operations.contains_key(&method),
                "missing operation on {}",
                path
            );
        }
    }

    #[test]
    fn test_protected_routes_require_bearer() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer"));

        let send = openapi
            .paths
            .paths
            .get("/api/v1/invitations/send")
            .and_then(|item| item.operations.get(&PathItemType::Post))
            .unwrap();
        assert!(send.security.is_some());

        let register = openapi
            .paths
            .paths
            .get("/api/v1/register")
            .and_then(|item| item.operations.get(&PathItemType::Post))
            .unwrap();
        assert!(register.security.is_none());
    }
}
