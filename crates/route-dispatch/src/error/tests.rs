//! Unit tests for dispatch error types.

use std::sync::Arc;

use rstest::rstest;

use super::*;

#[test]
fn unit_not_found_message_includes_location() {
    let error = DispatchError::unit_not_found("Widget", "handlers/WidgetController.rs");
    let message = error.to_string();
    assert!(
        message.contains("handlers/WidgetController.rs"),
        "expected location in message: {message}"
    );
    assert!(
        message.contains("Widget"),
        "expected handler in message: {message}"
    );
}

#[test]
fn operation_not_found_names_type_and_operation() {
    let error = DispatchError::operation_not_found("app::WidgetController", "bar");
    let message = error.to_string();
    assert!(message.contains("app::WidgetController"), "{message}");
    assert!(message.contains("'bar'"), "{message}");
}

#[test]
fn unit_load_exposes_loader_fault_as_source() {
    let error = DispatchError::UnitLoad {
        location: "handlers/Broken.rs".into(),
        source: Arc::new(LoadError::failed("unexpected token")),
    };
    let source = std::error::Error::source(&error).expect("load error has a source");
    assert_eq!(source.to_string(), "unexpected token");
}

#[test]
fn operation_failure_passes_source_through() {
    let error = DispatchError::Operation {
        type_name: "WidgetController".into(),
        operation: "show".into(),
        source: "widget offline".into(),
    };
    let source = std::error::Error::source(&error).expect("operation error has a source");
    assert_eq!(source.to_string(), "widget offline");
}

#[rstest]
#[case::handler_missing(DispatchError::HandlerNotSpecified, Disposition::BadRequest)]
#[case::operation_missing(
    DispatchError::operation_not_specified("Widget"),
    Disposition::BadRequest
)]
#[case::invalid_name(DispatchError::invalid_handler_name("../x"), Disposition::BadRequest)]
#[case::unit_missing(
    DispatchError::unit_not_found("Foo", "FooController.rs"),
    Disposition::NotFound
)]
#[case::type_missing(
    DispatchError::type_not_found("FooController", "FooController.rs"),
    Disposition::NotFound
)]
#[case::operation_unknown(
    DispatchError::operation_not_found("FooController", "bar"),
    Disposition::NotFound
)]
#[case::instance_unavailable(
    DispatchError::instance_unavailable("FooController", "fresh construction"),
    Disposition::Internal
)]
fn disposition_classifies_each_kind(#[case] error: DispatchError, #[case] expected: Disposition) {
    assert_eq!(error.disposition(), expected, "for {error}");
}

#[rstest]
#[case::taxonomy(DispatchError::HandlerNotSpecified, true)]
#[case::taxonomy_not_found(DispatchError::type_not_found("A", "A.rs"), true)]
#[case::instance(DispatchError::instance_unavailable("A", "accessor 'instance'"), false)]
fn resolution_failures_are_flagged(#[case] error: DispatchError, #[case] expected: bool) {
    assert_eq!(error.is_resolution_failure(), expected, "for {error}");
}

#[test]
fn dispatch_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DispatchError>();
}

#[test]
fn duplicate_unit_message_includes_location() {
    let error = RegistryError::DuplicateUnit {
        location: "handlers/WidgetController.rs".into(),
    };
    assert!(
        error
            .to_string()
            .contains("handlers/WidgetController.rs is already registered")
    );
}

#[test]
fn duplicate_type_message_names_type() {
    let error = LoadError::duplicate_type("WidgetController");
    assert_eq!(
        error.to_string(),
        "type 'WidgetController' is already defined"
    );
}
