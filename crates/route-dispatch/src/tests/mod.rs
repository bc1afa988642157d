//! Crate-level integration and BDD tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, LoadError, RegistryError};
use crate::handler::HandlerType;
use crate::invoker::{ProviderInvoker, TracedInvoker};
use crate::registry::HandlerRegistry;
use crate::route::RouteDescriptor;


/// Counters observed by the handlers a test registers.
#[derive(Debug, Default)]
struct Probe {
    loads: AtomicUsize,
    constructed: AtomicUsize,
    accessed: AtomicUsize,
}

impl Probe {
    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    fn accessed(&self) -> usize {
        self.accessed.load(Ordering::SeqCst)
    }
}

struct Page {
    owner: Option<String>,
}

/// Registers `handlers/{handler}Controller.rs` defining `{handler}Controller`
/// with a `show` operation and a `getInstance` accessor.
fn register_page_unit(
    registry: &mut HandlerRegistry<String>,
    handler: &str,
    probe: &Arc<Probe>,
) -> Result<(), RegistryError> {
    let type_name = format!("{handler}Controller");
    let loader = Arc::clone(probe);
    registry.register_unit(format!("handlers/{type_name}.rs"), move |catalog| {
        loader.loads.fetch_add(1, Ordering::SeqCst);
        let constructed = Arc::clone(&loader);
        let accessed = Arc::clone(&loader);
        let shared = Arc::new(Page {
            owner: Some("shared".to_owned()),
        });
        catalog.define(
            HandlerType::builder(type_name.clone())
                .constructor(move |context: Option<&String>| {
                    constructed.constructed.fetch_add(1, Ordering::SeqCst);
                    Page {
                        owner: context.cloned(),
                    }
                })
                .accessor("getInstance", move |_context: Option<&String>| {
                    accessed.accessed.fetch_add(1, Ordering::SeqCst);
                    Arc::clone(&shared)
                })
                .operation("show", |page: &Page, arguments: Value| {
                    Ok(json!({ "owner": page.owner, "arguments": arguments }))
                })
                .build(),
        )
    })
}

fn handlers_config() -> DispatcherConfig {
    DispatcherConfig::default()
        .with_search_root("handlers")
        .with_suffix("Controller")
}

#[test]
fn end_to_end_dispatch_with_traced_invoker() {
    let probe = Arc::new(Probe::default());
    let mut registry = HandlerRegistry::new();
    register_page_unit(&mut registry, "Page", &probe).expect("register page unit");
    register_page_unit(&mut registry, "Report", &probe).expect("register report unit");

    let dispatcher = Dispatcher::from_config(handlers_config(), Arc::new(registry))
        .with_invoker(TracedInvoker::new(ProviderInvoker));
    let owner = "alice".to_owned();

    let page = dispatcher
        .dispatch(&RouteDescriptor::new("Page", "show", json!([1])), Some(&owner))
        .expect("page dispatch");
    assert_eq!(page, json!({ "owner": "alice", "arguments": [1] }));

    // Only the unit a route resolves to is loaded.
    assert_eq!(probe.loads(), 1);
    assert_eq!(
        dispatcher.registry().loaded_type_names(),
        vec!["PageController"]
    );
}

#[test]
fn units_are_isolated_from_each_others_failures() {
    let probe = Arc::new(Probe::default());
    let mut registry = HandlerRegistry::new();
    register_page_unit(&mut registry, "Page", &probe).expect("register page unit");
    registry
        .register_unit("handlers/BrokenController.rs", |_catalog| {
            Err(LoadError::failed("missing dependency"))
        })
        .expect("register broken unit");

    let dispatcher = Dispatcher::from_config(handlers_config(), Arc::new(registry));
    let broken = dispatcher
        .dispatch(&RouteDescriptor::without_arguments("Broken", "show"), None)
        .expect_err("broken unit fails");
    assert!(matches!(broken, DispatchError::UnitLoad { .. }));

    let page = dispatcher
        .dispatch(&RouteDescriptor::without_arguments("Page", "show"), None)
        .expect("page unit still loads");
    assert_eq!(page, json!({ "owner": null, "arguments": null }));
}
