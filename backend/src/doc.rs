//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the attendance endpoints, the store probe and the
//! wrapper schemas that describe domain types without coupling them to
//! utoipa. Swagger UI serves it in debug builds and `openapi-dump` prints it.

use utoipa::OpenApi;

use crate::inbound::http::attendance::{
    AttendanceResponseBody, ConfirmAttendanceBody, RegisterAttendanceBody,
    RegisterAttendanceResponseBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorMessageSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Frequencia API",
        description = "Registration, confirmation and lookup of shooting club attendance."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::attendance::register_attendance,
        crate::inbound::http::attendance::get_attendance,
        crate::inbound::http::attendance::confirm_attendance,
        crate::inbound::http::health::ping,
    ),
    components(schemas(
        ErrorMessageSchema,
        ErrorCodeSchema,
        RegisterAttendanceBody,
        RegisterAttendanceResponseBody,
        ConfirmAttendanceBody,
        AttendanceResponseBody,
    )),
    tags(
        (name = "frequencia", description = "Attendance registration and confirmation"),
        (name = "health", description = "Store reachability probe")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        let attendance = paths
            .get("/frequencia/{cr}/{controlNumber}")
            .expect("attendance path");
        assert!(attendance.get.is_some());
        assert!(attendance.put.is_some());
        assert!(
            paths
                .get("/frequencia/{cr}")
                .and_then(|item| item.post.as_ref())
                .is_some()
        );
        assert!(paths.get("/ping").and_then(|item| item.get.as_ref()).is_some());
    }

    #[test]
    fn error_message_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let fields = object_fields(schemas.get("crate.domain.ErrorMessage").expect("schema"));

        assert!(fields.contains(&"code".to_owned()));
        assert!(fields.contains(&"field".to_owned()));
        assert!(fields.contains(&"value".to_owned()));
        assert!(schemas.contains_key("crate.domain.ErrorCode"));
    }

    #[test]
    fn registration_schemas_use_wire_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;

        let request = object_fields(schemas.get("RegisterAttendanceBody").expect("request"));
        assert!(request.contains(&"numeroSerie".to_owned()));
        assert!(request.contains(&"dataInicioTreino".to_owned()));

        let response = object_fields(
            schemas
                .get("RegisterAttendanceResponseBody")
                .expect("response"),
        );
        assert!(response.contains(&"controlNumber".to_owned()));
        assert!(response.contains(&"verificationCode".to_owned()));
    }
}
