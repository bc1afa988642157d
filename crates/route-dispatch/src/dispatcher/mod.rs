//! Route resolution and dispatch.
//!
//! [`Dispatcher::resolve`] turns an untrusted [`Route`] into a
//! [`ResolvedTarget`] through a fixed sequence of checks; the first failing
//! check decides the error:
//!
//! 1. the handler name is empty after trimming;
//! 2. the operation name is empty after trimming;
//! 3. the handler name, with backslash separators stripped and optionally
//!    its first character upper-cased, is not made only of ASCII letters,
//!    digits, and underscores;
//! 4. no unit is registered at `search_root + name + suffix`;
//! 5. the unit fails to load (reported as a loader fault);
//! 6. the unit did not define the derived type name;
//! 7. the type does not define the operation.
//!
//! Step 3 is the only gate between untrusted input and the unit location, so
//! nothing touches the registry until the name has passed it.
//!
//! [`Dispatcher::dispatch`] resolves and then hands the target to the
//! configured [`Invoker`].

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::handler::HandlerType;
use crate::invoker::{InstancePolicy, Invoker, ProviderInvoker};
use crate::registry::HandlerRegistry;
use crate::route::Route;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Qualifier separator removed from handler names before validation.
const STRIPPED_SEPARATOR: char = '\\';

/// A route that passed every resolution check.
pub struct ResolvedTarget<C> {
    handler: String,
    location: Utf8PathBuf,
    type_name: String,
    operation: String,
    handler_type: HandlerType<C>,
    policy: InstancePolicy,
}

impl<C> ResolvedTarget<C> {
    /// Returns the sanitised handler name.
    #[must_use]
    pub const fn handler(&self) -> &str {
        self.handler.as_str()
    }

    /// Returns the unit location the handler was loaded from.
    #[must_use]
    pub fn location(&self) -> &Utf8Path {
        self.location.as_path()
    }

    /// Returns the fully-qualified type name.
    #[must_use]
    pub const fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Returns the trimmed operation name.
    #[must_use]
    pub const fn operation(&self) -> &str {
        self.operation.as_str()
    }

    /// Returns the resolved handler type.
    #[must_use]
    pub const fn handler_type(&self) -> &HandlerType<C> {
        &self.handler_type
    }

    /// Returns the instance policy configured on the dispatcher.
    #[must_use]
    pub const fn instance_policy(&self) -> &InstancePolicy {
        &self.policy
    }
}

impl<C> Clone for ResolvedTarget<C> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            location: self.location.clone(),
            type_name: self.type_name.clone(),
            operation: self.operation.clone(),
            handler_type: self.handler_type.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<C> fmt::Debug for ResolvedTarget<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTarget")
            .field("handler", &self.handler)
            .field("location", &self.location)
            .field("type_name", &self.type_name)
            .field("operation", &self.operation)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Resolves routes against a [`HandlerRegistry`] and invokes them.
///
/// Configuration is set with the consuming `with_*` methods before the
/// dispatcher is shared; `dispatch` only reads it, so one dispatcher can
/// serve concurrent callers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use route_dispatch::{Dispatcher, HandlerRegistry, HandlerType, RouteDescriptor};
/// use serde_json::{Value, json};
///
/// struct Widget {
///     owner: String,
/// }
///
/// let mut registry: HandlerRegistry<String> = HandlerRegistry::new();
/// registry
///     .register_unit("handlers/WidgetController.rs", |catalog| {
///         catalog.define(
///             HandlerType::builder("WidgetController")
///                 .constructor(|context: Option<&String>| Widget {
///                     owner: context.cloned().unwrap_or_default(),
///                 })
///                 .operation("show", |widget: &Widget, arguments: Value| {
///                     Ok(json!({ "owner": widget.owner, "arguments": arguments }))
///                 })
///                 .build(),
///         )
///     })
///     .expect("registration succeeds");
///
/// let dispatcher = Dispatcher::new(Arc::new(registry))
///     .with_search_root("handlers")
///     .with_suffix("Controller")
///     .with_case_normalization(true);
///
/// let route = RouteDescriptor::new("widget", "show", json!([42]));
/// let owner = String::from("ops");
/// let result = dispatcher.dispatch(&route, Some(&owner)).expect("dispatch succeeds");
/// assert_eq!(result, json!({ "owner": "ops", "arguments": [42] }));
/// ```
pub struct Dispatcher<C, I = ProviderInvoker> {
    config: DispatcherConfig,
    policy: InstancePolicy,
    registry: Arc<HandlerRegistry<C>>,
    invoker: I,
}

impl<C> Dispatcher<C> {
    /// Creates a dispatcher with default configuration and the default
    /// invoker.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry<C>>) -> Self {
        Self::from_config(DispatcherConfig::default(), registry)
    }

    /// Creates a dispatcher from loaded configuration.
    #[must_use]
    pub fn from_config(config: DispatcherConfig, registry: Arc<HandlerRegistry<C>>) -> Self {
        Self {
            policy: config.instance_policy(),
            config,
            registry,
            invoker: ProviderInvoker,
        }
    }
}

impl<C, I> Dispatcher<C, I> {
    fn reconfigure(mut self, update: impl FnOnce(DispatcherConfig) -> DispatcherConfig) -> Self {
        self.config = update(self.config);
        self.policy = self.config.instance_policy();
        self
    }

    /// Sets the directory holding handler units.
    #[must_use]
    pub fn with_search_root(self, root: impl AsRef<str>) -> Self {
        self.reconfigure(|config| config.with_search_root(root))
    }

    /// Sets the handler-name suffix; the unit extension is appended.
    #[must_use]
    pub fn with_suffix(self, suffix: impl AsRef<str>) -> Self {
        self.reconfigure(|config| config.with_suffix(suffix))
    }

    /// Sets the namespace prepended to type names.
    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        self.reconfigure(|config| config.with_namespace(namespace))
    }

    /// Sets the accessor used to fetch shared instances.
    #[must_use]
    pub fn with_singleton_accessor(self, accessor: impl Into<String>) -> Self {
        self.reconfigure(|config| config.with_singleton_accessor(accessor))
    }

    /// Enables or disables upper-casing the first handler-name character.
    #[must_use]
    pub fn with_case_normalization(self, enabled: bool) -> Self {
        self.reconfigure(|config| config.with_case_normalization(enabled))
    }

    /// Replaces the invocation strategy.
    #[must_use]
    pub fn with_invoker<J>(self, invoker: J) -> Dispatcher<C, J> {
        Dispatcher {
            config: self.config,
            policy: self.policy,
            registry: self.registry,
            invoker,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the shared registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<HandlerRegistry<C>> {
        &self.registry
    }

    /// Returns the invocation strategy.
    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Validates `route` and resolves it to a loaded handler type and
    /// operation without invoking anything.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as described in the module
    /// documentation.
    pub fn resolve<R>(&self, route: &R) -> Result<ResolvedTarget<C>, DispatchError>
    where
        R: Route + ?Sized,
    {
        let raw_handler = route.handler_name().trim();
        if raw_handler.is_empty() {
            return Err(DispatchError::HandlerNotSpecified);
        }

        let operation = route.operation_name().trim();
        if operation.is_empty() {
            return Err(DispatchError::operation_not_specified(raw_handler));
        }

        let handler = sanitise_handler_name(raw_handler, self.config.normalize_case())?;
        let location = self.config.unit_location(&handler);
        let type_name = self.config.type_name(&handler);

        self.registry.ensure_loaded(&handler, &location)?;

        let handler_type = self
            .registry
            .resolve_type(&type_name)
            .ok_or_else(|| DispatchError::type_not_found(&type_name, &location))?;

        if !handler_type.has_operation(operation) {
            return Err(DispatchError::operation_not_found(type_name, operation));
        }

        debug!(
            target: DISPATCH_TARGET,
            %handler,
            %location,
            %type_name,
            operation,
            "route resolved"
        );

        Ok(ResolvedTarget {
            handler,
            location,
            type_name,
            operation: operation.to_owned(),
            handler_type,
            policy: self.policy.clone(),
        })
    }
}

impl<C, I: Invoker<C>> Dispatcher<C, I> {
    /// Resolves `route` and invokes its operation with the route's
    /// arguments, returning the operation's value unchanged.
    ///
    /// `context` is forwarded to the constructor or shared accessor; the
    /// dispatcher never inspects it.
    ///
    /// # Errors
    ///
    /// Returns any resolution failure from [`Dispatcher::resolve`], or the
    /// invoker's error.
    pub fn dispatch<R>(&self, route: &R, context: Option<&C>) -> Result<Value, DispatchError>
    where
        R: Route + ?Sized,
    {
        let target = self.resolve(route).inspect_err(|error| {
            debug!(
                target: DISPATCH_TARGET,
                handler = route.handler_name(),
                operation = route.operation_name(),
                %error,
                "route rejected"
            );
        })?;
        self.invoker
            .invoke(&target, route.arguments().clone(), context)
    }
}

impl<C, I: fmt::Debug> fmt::Debug for Dispatcher<C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("invoker", &self.invoker)
            .finish()
    }
}

/// Strips qualifier separators, applies case normalisation, and checks the
/// result against `^[A-Za-z0-9_]+$`.
fn sanitise_handler_name(raw: &str, normalize_case: bool) -> Result<String, DispatchError> {
    let stripped: String = raw.chars().filter(|ch| *ch != STRIPPED_SEPARATOR).collect();
    let name = if normalize_case {
        upper_first(&stripped)
    } else {
        stripped
    };

    let allowed = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if allowed {
        Ok(name)
    } else {
        Err(DispatchError::invalid_handler_name(name))
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut upper = String::with_capacity(name.len());
        upper.push(first.to_ascii_uppercase());
        upper.push_str(chars.as_str());
        upper
    })
}
