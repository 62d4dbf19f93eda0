//! Tests for error bundles and their wire format.

use super::*;
use crate::domain::TraceId;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn required_fields() -> Error {
    Error::from_messages(vec![
        ErrorMessage::new(ErrorCode::RequiredField).with_field("calibre"),
        ErrorMessage::new(ErrorCode::RequiredField)
            .with_field("quantidadeMunicao")
            .with_value("0"),
    ])
}

#[rstest]
fn bundle_serialises_as_array_in_order(required_fields: Error) {
    let value = serde_json::to_value(&required_fields).expect("serialise bundle");
    assert_eq!(
        value,
        json!([
            {"code": "ErrRequiredField", "field": "calibre"},
            {"code": "ErrRequiredField", "field": "quantidadeMunicao", "value": "0"},
        ])
    );
}

#[rstest]
fn context_is_not_serialised() {
    let err = Error::storage("insert attendance", "connection reset");
    let value = serde_json::to_value(&err).expect("serialise bundle");
    assert_eq!(value, json!([{"code": "ErrStorageUnavailable"}]));
    assert_eq!(err.context(), Some("insert attendance: connection reset"));
}

#[rstest]
#[case(ErrorCode::RequiredField, ErrorCategory::Input)]
#[case(ErrorCode::VerificationCodeMismatch, ErrorCategory::Input)]
#[case(ErrorCode::AlreadyConfirmed, ErrorCategory::Input)]
#[case(ErrorCode::NotFound, ErrorCategory::State)]
#[case(ErrorCode::Stale, ErrorCategory::State)]
#[case(ErrorCode::SecretMissing, ErrorCategory::Resource)]
#[case(ErrorCode::StorageUnavailable, ErrorCategory::Resource)]
fn codes_map_to_categories(#[case] code: ErrorCode, #[case] expected: ErrorCategory) {
    assert_eq!(code.category(), expected);
}

#[rstest]
#[case(ErrorCode::SerialFormat)]
#[case(ErrorCode::ImageNotAccepted)]
#[case(ErrorCode::RenderFailed)]
fn code_wire_name_matches_as_str(#[case] code: ErrorCode) {
    let value = serde_json::to_value(code).expect("serialise code");
    assert_eq!(value, json!(code.as_str()));
    let parsed: ErrorCode = serde_json::from_value(value).expect("parse code");
    assert_eq!(parsed, code);
}

#[rstest]
fn resource_message_dominates_category() {
    let err = Error::from_messages(vec![
        ErrorMessage::new(ErrorCode::RequiredField),
        ErrorMessage::new(ErrorCode::NotFound),
        ErrorMessage::new(ErrorCode::FontMissing),
    ]);
    assert_eq!(err.category(), ErrorCategory::Resource);
}

#[rstest]
fn empty_bundle_is_resource_failure() {
    assert_eq!(Error::from_messages(Vec::new()).category(), ErrorCategory::Resource);
}

#[rstest]
fn trace_id_absent_out_of_scope() {
    assert!(Error::not_found().trace_id().is_none());
}

#[tokio::test]
async fn trace_id_captured_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("valid UUID");
    let err = TraceId::scope(trace_id, async { Error::stale() }).await;
    assert_eq!(err.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn violations_keep_insertion_order() {
    let mut violations = Violations::default();
    violations.check(true, || ErrorMessage::new(ErrorCode::DateRange));
    violations.check(false, || ErrorMessage::new(ErrorCode::TrainingTooLong));
    violations.push(ErrorMessage::new(ErrorCode::SerialFormat).with_value("x"));
    let err = violations.into_result().expect_err("two violations");
    assert_eq!(err.codes(), vec![ErrorCode::DateRange, ErrorCode::SerialFormat]);
}

#[rstest]
fn empty_violations_are_ok() {
    assert!(Violations::default().into_result().is_ok());
}

#[rstest]
fn display_joins_messages(required_fields: Error) {
    let text = required_fields.to_string();
    assert_eq!(
        text,
        "ErrRequiredField (calibre); ErrRequiredField (quantidadeMunicao) = \"0\""
    );
}
