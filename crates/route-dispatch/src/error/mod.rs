//! Error types for route resolution, unit loading, and registration.
//!
//! [`DispatchError`] is what callers of [`crate::Dispatcher::dispatch`] see.
//! Its first six variants form the resolution taxonomy: they describe bad
//! caller input or a deployment mismatch and are never retried. The remaining
//! variants cover faults raised after resolution succeeded (unit loading,
//! instance construction, and the invoked operation itself).
//!
//! Shared sources are wrapped in `Arc` to satisfy the `result_large_err`
//! Clippy lint and to let a memoised load failure be reported more than once.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::handler::OperationError;

/// How the boundary in front of the dispatcher should treat a failure.
///
/// The dispatcher never produces responses itself; this is a hint for front
/// controllers translating errors into user-facing replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// The route descriptor was malformed or unsafe.
    BadRequest,
    /// The route was well formed but names nothing dispatchable.
    NotFound,
    /// Resolution succeeded but loading, construction, or invocation failed.
    Internal,
}

/// Errors surfaced while resolving and invoking a route.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The handler name was empty after trimming.
    #[error("handler name not specified")]
    HandlerNotSpecified,

    /// The operation name was empty after trimming.
    #[error("operation name not specified for handler '{handler}'")]
    OperationNotSpecified {
        /// Handler name supplied alongside the empty operation.
        handler: String,
    },

    /// The sanitised handler name contains disallowed characters.
    #[error("disallowed characters in handler name '{name}'")]
    InvalidHandlerName {
        /// Handler name after separator stripping and case normalisation.
        name: String,
    },

    /// No unit is registered at the derived location.
    #[error("handler unit for '{handler}' not found at {location}")]
    HandlerUnitNotFound {
        /// Sanitised handler name.
        handler: String,
        /// Location that was checked.
        location: Utf8PathBuf,
    },

    /// The unit loaded but did not define the expected type.
    #[error("handler type '{type_name}' not found after loading {location}")]
    HandlerTypeNotFound {
        /// Fully-qualified type name that was looked up.
        type_name: String,
        /// Unit location that was loaded.
        location: Utf8PathBuf,
    },

    /// The resolved type does not define the requested operation.
    #[error("operation '{operation}' not found on handler type '{type_name}'")]
    OperationNotFound {
        /// Fully-qualified type name.
        type_name: String,
        /// Operation name that was looked up.
        operation: String,
    },

    /// Loading the handler unit failed.
    #[error("failed to load handler unit {location}: {source}")]
    UnitLoad {
        /// Unit location whose installer failed.
        location: Utf8PathBuf,
        /// Underlying loader fault.
        #[source]
        source: Arc<LoadError>,
    },

    /// The type cannot satisfy the configured instance policy.
    #[error("handler type '{type_name}' cannot provide an instance via {policy}")]
    InstanceUnavailable {
        /// Fully-qualified type name.
        type_name: String,
        /// Description of the instance policy in force.
        policy: String,
    },

    /// The invoked operation returned an error.
    #[error("operation '{operation}' on '{type_name}' failed: {source}")]
    Operation {
        /// Fully-qualified type name.
        type_name: String,
        /// Operation that failed.
        operation: String,
        /// Error returned by the operation, passed through untouched.
        #[source]
        source: OperationError,
    },
}

impl DispatchError {
    /// Returns `true` for the six resolution failures raised before any
    /// handler code runs.
    #[must_use]
    pub const fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::HandlerNotSpecified
                | Self::OperationNotSpecified { .. }
                | Self::InvalidHandlerName { .. }
                | Self::HandlerUnitNotFound { .. }
                | Self::HandlerTypeNotFound { .. }
                | Self::OperationNotFound { .. }
        )
    }

    /// Classifies the error for the caller's response translation.
    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        match self {
            Self::HandlerNotSpecified
            | Self::OperationNotSpecified { .. }
            | Self::InvalidHandlerName { .. } => Disposition::BadRequest,
            Self::HandlerUnitNotFound { .. }
            | Self::HandlerTypeNotFound { .. }
            | Self::OperationNotFound { .. } => Disposition::NotFound,
            Self::UnitLoad { .. } | Self::InstanceUnavailable { .. } | Self::Operation { .. } => {
                Disposition::Internal
            }
        }
    }

    /// Creates an operation-not-specified error.
    pub fn operation_not_specified(handler: impl Into<String>) -> Self {
        Self::OperationNotSpecified {
            handler: handler.into(),
        }
    }

    /// Creates an invalid handler name error.
    pub fn invalid_handler_name(name: impl Into<String>) -> Self {
        Self::InvalidHandlerName { name: name.into() }
    }

    /// Creates a unit-not-found error.
    pub fn unit_not_found(handler: impl Into<String>, location: impl Into<Utf8PathBuf>) -> Self {
        Self::HandlerUnitNotFound {
            handler: handler.into(),
            location: location.into(),
        }
    }

    /// Creates a type-not-found error.
    pub fn type_not_found(type_name: impl Into<String>, location: impl Into<Utf8PathBuf>) -> Self {
        Self::HandlerTypeNotFound {
            type_name: type_name.into(),
            location: location.into(),
        }
    }

    /// Creates an operation-not-found error.
    pub fn operation_not_found(type_name: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::OperationNotFound {
            type_name: type_name.into(),
            operation: operation.into(),
        }
    }

    /// Creates an instance-unavailable error.
    pub fn instance_unavailable(type_name: impl Into<String>, policy: impl Into<String>) -> Self {
        Self::InstanceUnavailable {
            type_name: type_name.into(),
            policy: policy.into(),
        }
    }
}

/// Faults raised while running a unit installer.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The unit defined a type that is already registered.
    #[error("type '{type_name}' is already defined")]
    DuplicateType {
        /// Fully-qualified type name defined twice.
        type_name: String,
    },

    /// The installer reported a failure of its own.
    #[error("{message}")]
    Failed {
        /// Human-readable description of the fault.
        message: String,
    },
}

impl LoadError {
    /// Creates a duplicate type error.
    pub fn duplicate_type(type_name: impl Into<String>) -> Self {
        Self::DuplicateType {
            type_name: type_name.into(),
        }
    }

    /// Creates an installer failure with a custom message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Errors raised while populating a [`crate::HandlerRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A unit was already registered at this location.
    #[error("handler unit {location} is already registered")]
    DuplicateUnit {
        /// Location registered twice.
        location: Utf8PathBuf,
    },
}

#[cfg(test)]
mod tests;
