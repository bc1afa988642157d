//! The swappable "obtain an instance, then invoke" step.
//!
//! [`crate::Dispatcher::resolve`] performs every check that guards untrusted
//! input and hands a [`ResolvedTarget`] to an [`Invoker`]. The invoker decides
//! how an instance is obtained and how the call is made. The default
//! [`ProviderInvoker`] follows the target's [`InstancePolicy`]; deployments
//! can inject their own strategy (dependency-injected construction, decorated
//! calls) without touching validation. Plain closures with the right
//! signature are invokers too.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::dispatcher::ResolvedTarget;
use crate::error::DispatchError;
use crate::handler::{HandlerType, Instance};

/// Tracing target for invocation.
const INVOKE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::invoke");

/// How the default invoker obtains a handler instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstancePolicy {
    /// Construct a new instance for every dispatch.
    FreshConstruct,
    /// Fetch a shared instance through the named accessor.
    SharedAccessor(String),
}

impl InstancePolicy {
    /// Obtains an instance of `handler_type`, passing `context` through.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InstanceUnavailable`] when the type has no
    /// constructor or lacks the named accessor.
    pub fn obtain<C>(
        &self,
        handler_type: &HandlerType<C>,
        context: Option<&C>,
    ) -> Result<Instance, DispatchError> {
        let instance = match self {
            Self::FreshConstruct => handler_type.construct(context),
            Self::SharedAccessor(accessor) => handler_type.access(accessor, context),
        };
        instance.ok_or_else(|| {
            DispatchError::instance_unavailable(handler_type.name(), self.to_string())
        })
    }
}

impl fmt::Display for InstancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreshConstruct => f.write_str("fresh construction"),
            Self::SharedAccessor(accessor) => write!(f, "accessor '{accessor}'"),
        }
    }
}

/// Strategy for turning a resolved target into a result.
///
/// # Example
///
/// ```
/// use route_dispatch::{DispatchError, Invoker, ResolvedTarget};
/// use serde_json::{Value, json};
///
/// struct Refuse;
///
/// impl Invoker<()> for Refuse {
///     fn invoke(
///         &self,
///         target: &ResolvedTarget<()>,
///         _arguments: Value,
///         _context: Option<&()>,
///     ) -> Result<Value, DispatchError> {
///         Ok(json!({ "refused": target.type_name() }))
///     }
/// }
/// ```
pub trait Invoker<C> {
    /// Obtains an instance for `target` and invokes its operation with
    /// `arguments`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when no instance can be obtained or the
    /// operation fails.
    fn invoke(
        &self,
        target: &ResolvedTarget<C>,
        arguments: Value,
        context: Option<&C>,
    ) -> Result<Value, DispatchError>;
}

impl<C, F> Invoker<C> for F
where
    F: Fn(&ResolvedTarget<C>, Value, Option<&C>) -> Result<Value, DispatchError>,
{
    fn invoke(
        &self,
        target: &ResolvedTarget<C>,
        arguments: Value,
        context: Option<&C>,
    ) -> Result<Value, DispatchError> {
        self(target, arguments, context)
    }
}

/// Default invoker: obtains an instance per the target's
/// [`InstancePolicy`] and calls the operation.
///
/// Instances are never cached here; a shared accessor may cache its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderInvoker;

impl<C> Invoker<C> for ProviderInvoker {
    fn invoke(
        &self,
        target: &ResolvedTarget<C>,
        arguments: Value,
        context: Option<&C>,
    ) -> Result<Value, DispatchError> {
        let instance = target
            .instance_policy()
            .obtain(target.handler_type(), context)?;
        let outcome = instance
            .invoke(target.operation(), arguments)
            .ok_or_else(|| {
                DispatchError::operation_not_found(target.type_name(), target.operation())
            })?;
        outcome.map_err(|source| DispatchError::Operation {
            type_name: target.type_name().to_owned(),
            operation: target.operation().to_owned(),
            source,
        })
    }
}

/// Wraps another invoker and records each call's outcome.
#[derive(Debug, Clone, Default)]
pub struct TracedInvoker<I> {
    inner: I,
}

impl<I> TracedInvoker<I> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: I) -> Self {
        Self { inner }
    }

    /// Returns the wrapped invoker.
    #[must_use]
    pub const fn inner(&self) -> &I {
        &self.inner
    }
}

impl<C, I: Invoker<C>> Invoker<C> for TracedInvoker<I> {
    fn invoke(
        &self,
        target: &ResolvedTarget<C>,
        arguments: Value,
        context: Option<&C>,
    ) -> Result<Value, DispatchError> {
        let outcome = self.inner.invoke(target, arguments, context);
        match &outcome {
            Ok(_) => debug!(
                target: INVOKE_TARGET,
                type_name = target.type_name(),
                operation = target.operation(),
                "operation completed"
            ),
            Err(error) => debug!(
                target: INVOKE_TARGET,
                type_name = target.type_name(),
                operation = target.operation(),
                %error,
                "operation failed"
            ),
        }
        outcome
    }
}
