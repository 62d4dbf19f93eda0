//! End-to-end tests for the attendance endpoints over in-memory adapters.

use std::sync::Arc;

use actix_web::body::to_bytes;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;
use regex::Regex;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::{
    AttendanceDraft, AttendancePolicy, AttendanceService, AuditAction, HkdfVerificationCodeDeriver,
    TRACE_ID_HEADER, derive_verification_code,
};
use crate::inbound::http::{JSON_CONTENT_TYPE, configure};
use crate::middleware::{Recover, Trace};
use crate::outbound::imaging::{ControlNumberImageConfig, ImageControlNumberRenderer};
use crate::test_support::fixtures::font_path;
use crate::test_support::{CountingTokenSource, InMemoryAttendanceRepository, MutableClock};

const SECRET: &str = "abc123";
const CR: &str = "380308";
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct Harness {
    clock: Arc<MutableClock>,
    repository: Arc<InMemoryAttendanceRepository>,
    state: HttpState,
}

impl Harness {
    async fn app(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(web::PayloadConfig::new(1024 * 1024))
                .wrap(Recover)
                .wrap(Trace)
                .configure(configure),
        )
        .await
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn registration_body(&self) -> Value {
        let now = self.now();
        json!({
            "calibre": "calibre .380",
            "armaUtilizada": "arma do clube",
            "numeroSerie": "za785671",
            "quantidadeMunicao": 50,
            "dataInicioTreino": (now - Duration::minutes(30)).to_rfc3339(),
            "dataTerminoTreino": (now - Duration::minutes(10)).to_rfc3339(),
        })
    }

    /// Seed a pending attendance created `age` ago.
    fn seed_pending(&self, age: Duration) -> Attendance {
        let created = self.now() - age;
        let draft = AttendanceDraft {
            cr: CR.to_owned(),
            caliber: "CALIBRE .380".to_owned(),
            weapon: "ARMA DO CLUBE".to_owned(),
            serial_number: "ZA785671".to_owned(),
            traffic_guide: None,
            ammunition_count: 50,
            training_start: created - Duration::minutes(20),
            training_end: created - Duration::minutes(5),
        };
        let mut attendance = Attendance::new(draft, 7_000_000_007, created);
        attendance.control_number_image = STANDARD.encode(PNG_MAGIC);
        self.repository.seed(attendance)
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 15, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn png_base64() -> String {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    STANDARD.encode(bytes)
}

fn code_for(attendance: &Attendance) -> String {
    derive_verification_code(
        &attendance.cr,
        attendance.id,
        attendance.control,
        SECRET.as_bytes(),
    )
    .expect("secret present")
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::new(start()));
    let repository = Arc::new(InMemoryAttendanceRepository::new(clock.clone()));
    let renderer = ImageControlNumberRenderer::new(ControlNumberImageConfig {
        width: 400,
        height: 200,
        font_size: 32.0,
        qr_size: 80,
        font_path: font_path(),
        ..ControlNumberImageConfig::default()
    });
    let service = Arc::new(AttendanceService::new(
        Arc::clone(&repository),
        Arc::new(HkdfVerificationCodeDeriver::new(SECRET)),
        Arc::new(renderer),
        Arc::new(CountingTokenSource::starting_at(4_000_000_001)),
        clock.clone(),
        AttendancePolicy::default(),
    ));
    let state = HttpState::new(service.clone(), service, repository.clone());
    Harness {
        clock,
        repository,
        state,
    }
}

fn content_type(response: &ServiceResponse) -> Option<&str> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

async fn json_body(response: ServiceResponse) -> Value {
    let bytes = to_bytes(response.into_body()).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[rstest]
#[actix_web::test]
async fn registration_returns_ticket_and_location(harness: Harness) {
    let app = harness.app().await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/frequencia/{CR}"))
        .insert_header(("X-Forwarded-For", "203.0.113.7"))
        .set_json(harness.registration_body())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(content_type(&response), Some(JSON_CONTENT_TYPE));
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("location header");
    let body: RegisterAttendanceResponseBody =
        serde_json::from_value(json_body(response).await).expect("registration body");

    let pattern = Regex::new(r"^\d+-\d+$").expect("pattern");
    assert!(pattern.is_match(&body.control_number));

    let row = harness.repository.rows().pop().expect("stored row");
    assert_eq!(body.verification_code, code_for(&row));
    assert_eq!(
        location,
        format!(
            "/frequencia/{CR}/{}?verificacao={}",
            body.control_number, body.verification_code
        )
    );

    let image = STANDARD.decode(&body.image).expect("base64 image");
    assert!(image.starts_with(&PNG_MAGIC));
    assert_eq!(row.control_number_image, body.image);
    assert_eq!(
        harness
            .repository
            .transactions()
            .first()
            .and_then(|tx| tx.remote_addr.clone())
            .as_deref(),
        Some("203.0.113.7")
    );
}

#[rstest]
#[actix_web::test]
async fn empty_body_reports_every_required_field(harness: Harness) {
    let app = harness.app().await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/frequencia/{CR}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), Some(JSON_CONTENT_TYPE));
    assert_eq!(
        json_body(response).await,
        json!([
            {"code": "ErrRequiredField", "field": "calibre"},
            {"code": "ErrRequiredField", "field": "armaUtilizada"},
            {"code": "ErrRequiredField", "field": "quantidadeMunicao", "value": "0"}
        ])
    );
    assert!(harness.repository.rows().is_empty());
}

#[rstest]
#[actix_web::test]
async fn bad_serial_and_inverted_dates_are_reported_together(harness: Harness) {
    let app = harness.app().await;
    let now = harness.now();
    let mut body = harness.registration_body();
    body["numeroSerie"] = json!("785671");
    body["dataInicioTreino"] = json!((now - Duration::minutes(10)).to_rfc3339());
    body["dataTerminoTreino"] = json!((now - Duration::minutes(30)).to_rfc3339());

    let request = actix_test::TestRequest::post()
        .uri(&format!("/frequencia/{CR}"))
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let codes: Vec<&str> = body
        .as_array()
        .expect("message array")
        .iter()
        .filter_map(|message| message["code"].as_str())
        .collect();
    assert_eq!(codes, ["ErrSerialFormat", "ErrDateRange"]);
    assert_eq!(body[0]["value"], "785671");
}

#[rstest]
#[actix_web::test]
async fn malformed_json_is_a_bad_request(harness: Harness) {
    let app = harness.app().await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/frequencia/{CR}"))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"calibre\":")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body[0]["code"], "ErrRequiredField");
}

#[rstest]
#[actix_web::test]
async fn lookup_returns_the_projection(harness: Harness) {
    let app = harness.app().await;
    let stored = harness.seed_pending(Duration::minutes(5));
    let uri = attendance_location(CR, &stored.control_number().to_string(), &code_for(&stored));

    let response = actix_test::call_service(&app, actix_test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), Some(JSON_CONTENT_TYPE));
    let body = json_body(response).await;
    assert_eq!(body["cr"], CR);
    assert_eq!(body["controlNumber"], stored.control_number().to_string());
    assert_eq!(body["numeroSerie"], "ZA785671");
    assert_eq!(body["quantidadeMunicao"], 50);
    assert_eq!(body["dataConfirmacao"], Value::Null);
    assert!(body.get("imagemConfirmacao").is_none());
}

#[rstest]
#[case::missing_code(None)]
#[case::wrong_code(Some("not-the-code"))]
#[actix_web::test]
async fn lookup_rejects_a_bad_verification_code(
    harness: Harness,
    #[case] code: Option<&str>,
) {
    let app = harness.app().await;
    let stored = harness.seed_pending(Duration::minutes(5));
    let mut uri = format!("/frequencia/{CR}/{}", stored.control_number());
    if let Some(code) = code {
        uri.push_str(&format!("?verificacao={code}"));
    }

    let response = actix_test::call_service(&app, actix_test::TestRequest::get().uri(&uri).to_request()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await[0]["code"],
        "ErrVerificationCodeMismatch"
    );
}

#[rstest]
#[case::unknown_id("/frequencia/380308/999-1", StatusCode::NOT_FOUND, "ErrNotFound")]
#[case::bad_format(
    "/frequencia/380308/abc",
    StatusCode::BAD_REQUEST,
    "ErrControlNumberFormat"
)]
#[actix_web::test]
async fn lookup_maps_missing_rows(
    harness: Harness,
    #[case] uri: &str,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let app = harness.app().await;
    let response = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(response.status(), status);
    assert_eq!(json_body(response).await[0]["code"], code);
}

#[rstest]
#[actix_web::test]
async fn confirmation_marks_the_row_confirmed(harness: Harness) {
    let app = harness.app().await;
    let stored = harness.seed_pending(Duration::minutes(5));
    let uri = attendance_location(CR, &stored.control_number().to_string(), &code_for(&stored));

    let request = actix_test::TestRequest::put()
        .uri(&uri)
        .set_json(json!({ "imagem": png_base64() }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    assert!(bytes.is_empty());

    let row = harness.repository.row(stored.id).expect("row");
    assert_eq!(row.confirmed_at, Some(harness.now()));
    assert_eq!(row.confirmation_image, png_base64());
    assert_eq!(row.revision, stored.revision + 1);
}

#[rstest]
#[actix_web::test]
async fn confirmation_accepts_the_image_alias(harness: Harness) {
    let app = harness.app().await;
    let stored = harness.seed_pending(Duration::minutes(5));

    let request = actix_test::TestRequest::put()
        .uri(&format!("/frequencia/{CR}/{}", stored.control_number()))
        .set_json(json!({ "image": png_base64() }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn confirmation_after_the_window_changes_nothing(harness: Harness) {
    let app = harness.app().await;
    let stored = harness.seed_pending(Duration::minutes(31));

    let request = actix_test::TestRequest::put()
        .uri(&format!("/frequencia/{CR}/{}", stored.control_number()))
        .set_json(json!({ "imagem": png_base64() }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!([{"code": "ErrConfirmationExpired"}])
    );
    let row = harness.repository.row(stored.id).expect("row");
    assert_eq!(row.revision, stored.revision);
    assert_eq!(row.confirmed_at, None);
    assert!(harness.repository.audit_rows().is_empty());
}

#[rstest]
#[actix_web::test]
async fn replayed_confirmation_has_one_winner(harness: Harness) {
    let app = harness.app().await;
    let register = actix_test::TestRequest::post()
        .uri(&format!("/frequencia/{CR}"))
        .set_json(harness.registration_body())
        .to_request();
    let created: RegisterAttendanceResponseBody =
        actix_test::call_and_read_body_json(&app, register).await;
    let uri = attendance_location(CR, &created.control_number, &created.verification_code);

    let put = || {
        actix_test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "imagem": png_base64() }))
            .to_request()
    };
    let (first, second) = futures::join!(
        actix_test::call_service(&app, put()),
        actix_test::call_service(&app, put())
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses[0], StatusCode::NO_CONTENT);
    assert!(
        matches!(statuses[1], StatusCode::BAD_REQUEST | StatusCode::CONFLICT),
        "loser answered {}",
        statuses[1]
    );

    let rows = harness.repository.rows();
    assert_eq!(rows.len(), 1);
    let confirmed_at = rows[0].confirmed_at.expect("confirmed");

    let updates = harness
        .repository
        .audit_rows()
        .into_iter()
        .filter(|record| record.action == AuditAction::Update)
        .count();
    // One update attaches the ticket image, one confirms.
    assert_eq!(updates, 2);

    harness.clock.advance(chrono::TimeDelta::minutes(1));
    let response = actix_test::call_service(&app, put()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        harness.repository.rows()[0].confirmed_at,
        Some(confirmed_at)
    );
}

#[rstest]
fn unparseable_dates_read_as_missing() {
    let body = RegisterAttendanceBody {
        data_inicio_treino: Some("yesterday".to_owned()),
        data_termino_treino: Some("2026-03-14T14:50:00-03:00".to_owned()),
        ..RegisterAttendanceBody::default()
    };
    let input = body.into_input(CR.to_owned());
    assert_eq!(input.training_start, None);
    assert_eq!(
        input.training_end,
        Utc.with_ymd_and_hms(2026, 3, 14, 17, 50, 0).single()
    );
}

#[rstest]
#[case::plain("380308", "1-2", "abc", "/frequencia/380308/1-2?verificacao=abc")]
#[case::escaped("38 03/08", "1-2", "a&b", "/frequencia/38%2003%2F08/1-2?verificacao=a%26b")]
fn location_escapes_its_parts(
    #[case] cr: &str,
    #[case] control_number: &str,
    #[case] code: &str,
    #[case] expected: &str,
) {
    assert_eq!(attendance_location(cr, control_number, code), expected);
}

#[rstest]
#[actix_web::test]
async fn ping_answers_through_the_middleware_stack(harness: Harness) {
    let app = harness.app().await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/ping").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
}
