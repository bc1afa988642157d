//! Unit tests for the handler registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};
use serde_json::Value;

use super::*;

struct Widget;

fn widget_type(name: &str) -> HandlerType<()> {
    HandlerType::builder(name)
        .constructor(|_context: Option<&()>| Widget)
        .operation("show", |_widget: &Widget, arguments: Value| Ok(arguments))
        .build()
}

const WIDGET_UNIT: &str = "handlers/WidgetController.rs";

#[fixture]
fn loads() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn registry_with_widget(loads: &Arc<AtomicUsize>) -> HandlerRegistry<()> {
    let counter = Arc::clone(loads);
    let mut registry = HandlerRegistry::new();
    registry
        .register_unit(WIDGET_UNIT, move |catalog| {
            counter.fetch_add(1, Ordering::SeqCst);
            catalog.define(widget_type("WidgetController"))
        })
        .expect("register widget unit");
    registry
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn new_registry_is_empty() {
    let registry: HandlerRegistry<()> = HandlerRegistry::new();
    assert_eq!(registry.unit_count(), 0);
    assert!(registry.loaded_type_names().is_empty());
}

#[rstest]
fn registration_does_not_load(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    assert!(registry.contains_unit(Utf8Path::new(WIDGET_UNIT)));
    assert!(!registry.is_loaded(Utf8Path::new(WIDGET_UNIT)));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[rstest]
fn register_rejects_duplicate_location(loads: Arc<AtomicUsize>) {
    let mut registry = registry_with_widget(&loads);
    let err = registry
        .register_unit(WIDGET_UNIT, |_catalog| Ok(()))
        .expect_err("duplicate should fail");
    assert!(matches!(err, RegistryError::DuplicateUnit { .. }));
    assert_eq!(registry.unit_count(), 1);
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[rstest]
fn ensure_loaded_runs_installer_once(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    let location = Utf8Path::new(WIDGET_UNIT);

    registry
        .ensure_loaded("Widget", location)
        .expect("first load");
    registry
        .ensure_loaded("Widget", location)
        .expect("second load");

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(registry.is_loaded(location));
    assert_eq!(registry.loaded_type_names(), vec!["WidgetController"]);
}

#[rstest]
fn ensure_loaded_reports_missing_unit(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    let err = registry
        .ensure_loaded("Gadget", Utf8Path::new("handlers/GadgetController.rs"))
        .expect_err("unit is not registered");
    assert!(matches!(
        err,
        DispatchError::HandlerUnitNotFound { ref handler, .. } if handler == "Gadget"
    ));
}

#[test]
fn failed_load_is_remembered() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
    registry
        .register_unit("Broken.rs", move |_catalog| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LoadError::failed("unexpected token"))
        })
        .expect("register broken unit");

    for _ in 0..2 {
        let err = registry
            .ensure_loaded("Broken", Utf8Path::new("Broken.rs"))
            .expect_err("load fails");
        assert!(matches!(err, DispatchError::UnitLoad { .. }), "got {err}");
        assert!(!err.is_resolution_failure());
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(!registry.is_loaded(Utf8Path::new("Broken.rs")));
}

#[test]
fn unit_redefining_a_loaded_type_fails_without_partial_registration() {
    let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
    registry
        .register_unit("First.rs", |catalog| {
            catalog.define(widget_type("SharedController"))
        })
        .expect("register first unit");
    registry
        .register_unit("Second.rs", |catalog| {
            catalog.define(widget_type("ExtraController"))?;
            catalog.define(widget_type("SharedController"))
        })
        .expect("register second unit");

    registry
        .ensure_loaded("First", Utf8Path::new("First.rs"))
        .expect("first unit loads");
    let err = registry
        .ensure_loaded("Second", Utf8Path::new("Second.rs"))
        .expect_err("second unit clashes");

    match err {
        DispatchError::UnitLoad { source, .. } => {
            assert!(matches!(*source, LoadError::DuplicateType { .. }));
        }
        other => panic!("expected UnitLoad, got {other}"),
    }
    assert!(registry.resolve_type("ExtraController").is_none());
}

#[test]
fn catalog_rejects_duplicate_within_unit() {
    let mut catalog: TypeCatalog<()> = TypeCatalog::new();
    catalog
        .define(widget_type("WidgetController"))
        .expect("first definition");
    let err = catalog
        .define(widget_type("WidgetController"))
        .expect_err("second definition clashes");
    assert!(matches!(err, LoadError::DuplicateType { .. }));
    assert!(catalog.contains("WidgetController"));
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[rstest]
fn resolve_type_before_load_is_none(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    assert!(registry.resolve_type("WidgetController").is_none());
}

#[rstest]
fn resolve_type_after_load(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    registry
        .ensure_loaded("Widget", Utf8Path::new(WIDGET_UNIT))
        .expect("load");
    let resolved = registry
        .resolve_type("WidgetController")
        .expect("type is loaded");
    assert!(resolved.has_operation("show"));
}

#[rstest]
fn debug_lists_units_and_types(loads: Arc<AtomicUsize>) {
    let registry = registry_with_widget(&loads);
    let rendered = format!("{registry:?}");
    assert!(rendered.contains(WIDGET_UNIT), "{rendered}");
}
