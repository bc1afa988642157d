//! Route descriptors consumed by the dispatcher.
//!
//! Route matching happens elsewhere; the dispatcher only needs the three
//! accessors of the [`Route`] trait. [`RouteDescriptor`] is a plain owned
//! implementation for callers that do not have their own route type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of route matching, as seen by the dispatcher.
///
/// All three values are untrusted. The dispatcher trims the names, validates
/// the handler name, and forwards the arguments verbatim.
pub trait Route {
    /// Name of the handler to dispatch to.
    fn handler_name(&self) -> &str;

    /// Name of the operation to invoke on the handler.
    fn operation_name(&self) -> &str;

    /// Argument aggregate passed to the operation as a single value.
    fn arguments(&self) -> &Value;
}

/// Owned route descriptor.
///
/// # Example
///
/// ```
/// use route_dispatch::{Route, RouteDescriptor};
/// use serde_json::json;
///
/// let route = RouteDescriptor::new("widget", "show", json!([42]));
/// assert_eq!(route.handler_name(), "widget");
/// assert_eq!(route.arguments(), &json!([42]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    handler: String,
    operation: String,
    #[serde(default)]
    arguments: Value,
}

impl RouteDescriptor {
    /// Creates a descriptor from its three parts.
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        operation: impl Into<String>,
        arguments: impl Into<Value>,
    ) -> Self {
        Self {
            handler: handler.into(),
            operation: operation.into(),
            arguments: arguments.into(),
        }
    }

    /// Creates a descriptor with no arguments.
    #[must_use]
    pub fn without_arguments(handler: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(handler, operation, Value::Null)
    }
}

impl Route for RouteDescriptor {
    fn handler_name(&self) -> &str {
        &self.handler
    }

    fn operation_name(&self) -> &str {
        &self.operation
    }

    fn arguments(&self) -> &Value {
        &self.arguments
    }
}
