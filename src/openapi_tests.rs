#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components are generated");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            other => panic!("{} should be an object schema, got {:?}", name, other),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        for schema in ["ErrorResponse", "HealthResponse", "ReceiptDto", "PaymentDto", "CreatePaymentRequest"] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }
        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_receipt_schema_exposes_balances() {
        let properties = object_properties("ReceiptDto");
        for field in ["amount", "pending_amount", "outstanding", "credit_balance", "status"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_payment_lifecycle_paths() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let create = paths.get("/api/v1/payments").expect("create path");
        assert!(create.operations.contains_key(&PathItemType::Post));

        let single = paths.get("/api/v1/payments/{payment_id}").expect("payment path");
        for method in [PathItemType::Get, PathItemType::Put, PathItemType::Delete] {
            assert!(single.operations.contains_key(&method));
        }

        let delete = single.operations.get(&PathItemType::Delete).unwrap();
        assert!(delete.responses.responses.contains_key("409"));

        assert!(paths.contains_key("/api/v1/receipts/{receipt_id}/payments"));
        assert!(paths.contains_key("/health"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
