//! Resolve untrusted route descriptors to handler operations and invoke them.
//!
//! A route names a handler and an operation and carries an argument
//! aggregate. The [`Dispatcher`] validates the handler name, derives the
//! location of the handler unit that defines it, loads that unit on first
//! use, checks that the expected type and operation exist, obtains an
//! instance, and returns whatever the operation returns.
//!
//! # Architecture
//!
//! Handler units are registered up front in a [`HandlerRegistry`], keyed by
//! the location the dispatcher derives for them
//! (`search_root + name + suffix`). Each unit carries an installer that
//! defines one or more [`HandlerType`]s when the unit is first needed; the
//! types then stay registered for the life of the registry. Resolution is a
//! fixed sequence of checks in [`Dispatcher::resolve`]. Obtaining the
//! instance and making the call sit behind the [`Invoker`] trait so hosts can
//! substitute their own strategy.
//!
//! Every rejection is a typed [`DispatchError`]. The dispatcher never
//! produces user-facing responses; [`DispatchError::disposition`] tells the
//! caller how to treat a failure.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use route_dispatch::{DispatchError, Dispatcher, HandlerRegistry, HandlerType, RouteDescriptor};
//! use serde_json::{Value, json};
//!
//! struct Article;
//!
//! let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
//! registry
//!     .register_unit("controllers/ArticleController.rs", |catalog| {
//!         catalog.define(
//!             HandlerType::builder("ArticleController")
//!                 .constructor(|_context: Option<&()>| Article)
//!                 .operation("list", |_article: &Article, arguments: Value| {
//!                     Ok(json!({ "page": arguments }))
//!                 })
//!                 .build(),
//!         )
//!     })
//!     .expect("registration succeeds");
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry))
//!     .with_search_root("controllers")
//!     .with_suffix("Controller");
//!
//! let listed = dispatcher
//!     .dispatch(&RouteDescriptor::new("Article", "list", json!(2)), None)
//!     .expect("dispatch succeeds");
//! assert_eq!(listed, json!({ "page": 2 }));
//!
//! let rejected = dispatcher
//!     .dispatch(&RouteDescriptor::without_arguments("../Article", "list"), None)
//!     .expect_err("traversal is rejected");
//! assert!(matches!(rejected, DispatchError::InvalidHandlerName { .. }));
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod invoker;
pub mod registry;
pub mod route;

#[cfg(test)]
mod tests;

pub use self::config::{DispatcherConfig, QUALIFIER_SEPARATOR, UNIT_EXTENSION};
pub use self::dispatcher::{Dispatcher, ResolvedTarget};
pub use self::error::{DispatchError, Disposition, LoadError, RegistryError};
pub use self::handler::{
    HandlerType, HandlerTypeBuilder, Instance, OperationError, OperationResult,
};
pub use self::invoker::{InstancePolicy, Invoker, ProviderInvoker, TracedInvoker};
pub use self::registry::{HandlerRegistry, TypeCatalog};
pub use self::route::{Route, RouteDescriptor};
