//! Handler types, their operation tables, and live instances.
//!
//! A [`HandlerType`] is the registry's stand-in for a dispatchable class: a
//! fully-qualified name, an optional constructor, any number of named shared
//! accessors, and a table of named operations. Types are built with
//! [`HandlerTypeBuilder`] from ordinary Rust structs and closures; the
//! builder erases the concrete struct so the registry can hold handlers of
//! different types side by side.
//!
//! Every operation receives the route's argument aggregate as one
//! [`serde_json::Value`] and returns a value the dispatcher passes back to its
//! caller unchanged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Error type returned by handler operations.
pub type OperationError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by handler operations.
pub type OperationResult = Result<Value, OperationError>;

type Constructor<T, C> = Arc<dyn Fn(Option<&C>) -> T + Send + Sync>;
type Accessor<T, C> = Arc<dyn Fn(Option<&C>) -> Arc<T> + Send + Sync>;
type Operation<T> = Arc<dyn Fn(&T, Value) -> OperationResult + Send + Sync>;
type OperationTable<T> = HashMap<String, Operation<T>>;

/// Type-erased view of a handler type.
trait ErasedHandler<C>: Send + Sync {
    fn has_operation(&self, operation: &str) -> bool;
    fn operation_names(&self) -> Vec<&str>;
    fn has_constructor(&self) -> bool;
    fn has_accessor(&self, accessor: &str) -> bool;
    fn construct(&self, context: Option<&C>) -> Option<Instance>;
    fn access(&self, accessor: &str, context: Option<&C>) -> Option<Instance>;
}

struct TypedHandler<T, C> {
    constructor: Option<Constructor<T, C>>,
    accessors: HashMap<String, Accessor<T, C>>,
    operations: Arc<OperationTable<T>>,
}

impl<T, C> TypedHandler<T, C>
where
    T: Send + Sync + 'static,
{
    fn bind(&self, instance: Arc<T>) -> Instance {
        Instance {
            inner: Box::new(BoundInstance {
                instance,
                operations: Arc::clone(&self.operations),
            }),
        }
    }
}

impl<T, C> ErasedHandler<C> for TypedHandler<T, C>
where
    T: Send + Sync + 'static,
{
    fn has_operation(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    fn operation_names(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    fn has_accessor(&self, accessor: &str) -> bool {
        self.accessors.contains_key(accessor)
    }

    fn construct(&self, context: Option<&C>) -> Option<Instance> {
        let constructor = self.constructor.as_ref()?;
        Some(self.bind(Arc::new(constructor(context))))
    }

    fn access(&self, accessor: &str, context: Option<&C>) -> Option<Instance> {
        let fetch = self.accessors.get(accessor)?;
        Some(self.bind(fetch(context)))
    }
}

trait InvokeOperation: Send + Sync {
    fn invoke(&self, operation: &str, arguments: Value) -> Option<OperationResult>;
}

struct BoundInstance<T> {
    instance: Arc<T>,
    operations: Arc<OperationTable<T>>,
}

impl<T> InvokeOperation for BoundInstance<T>
where
    T: Send + Sync,
{
    fn invoke(&self, operation: &str, arguments: Value) -> Option<OperationResult> {
        let call = self.operations.get(operation)?;
        Some(call(self.instance.as_ref(), arguments))
    }
}

/// A live handler instance, either freshly constructed or fetched from a
/// shared accessor.
pub struct Instance {
    inner: Box<dyn InvokeOperation>,
}

impl Instance {
    /// Invokes `operation` with the argument aggregate.
    ///
    /// Returns `None` when the instance's type has no such operation.
    #[must_use]
    pub fn invoke(&self, operation: &str, arguments: Value) -> Option<OperationResult> {
        self.inner.invoke(operation, arguments)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").finish_non_exhaustive()
    }
}

/// A dispatchable handler type.
///
/// `C` is the context type forwarded to constructors and accessors.
///
/// # Example
///
/// ```
/// use route_dispatch::HandlerType;
/// use serde_json::{Value, json};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let greeter: HandlerType<String> = HandlerType::builder("app::GreeterController")
///     .constructor(|context: Option<&String>| Greeter {
///         greeting: context.cloned().unwrap_or_else(|| "hello".to_owned()),
///     })
///     .operation("greet", |greeter: &Greeter, arguments: Value| {
///         Ok(json!(format!("{} {}", greeter.greeting, arguments)))
///     })
///     .build();
///
/// let instance = greeter.construct(None).expect("greeter has a constructor");
/// let result = instance.invoke("greet", json!("world")).expect("operation exists");
/// assert_eq!(result.expect("greet succeeds"), json!("hello \"world\""));
/// ```
pub struct HandlerType<C> {
    name: String,
    erased: Arc<dyn ErasedHandler<C>>,
}

impl<C> HandlerType<C> {
    /// Starts building a handler type for struct `T`.
    #[must_use]
    pub fn builder<T>(name: impl Into<String>) -> HandlerTypeBuilder<T, C> {
        HandlerTypeBuilder {
            name: name.into(),
            constructor: None,
            accessors: HashMap::new(),
            operations: HashMap::new(),
        }
    }

    /// Returns the fully-qualified type name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns `true` when the type defines `operation`.
    #[must_use]
    pub fn has_operation(&self, operation: &str) -> bool {
        self.erased.has_operation(operation)
    }

    /// Returns the defined operation names in no particular order.
    #[must_use]
    pub fn operation_names(&self) -> Vec<&str> {
        self.erased.operation_names()
    }

    /// Returns `true` when the type can be freshly constructed.
    #[must_use]
    pub fn has_constructor(&self) -> bool {
        self.erased.has_constructor()
    }

    /// Returns `true` when the type defines the named shared accessor.
    #[must_use]
    pub fn has_accessor(&self, accessor: &str) -> bool {
        self.erased.has_accessor(accessor)
    }

    /// Constructs a fresh instance, passing `context` to the constructor.
    ///
    /// Returns `None` when the type has no constructor.
    #[must_use]
    pub fn construct(&self, context: Option<&C>) -> Option<Instance> {
        self.erased.construct(context)
    }

    /// Fetches an instance through the named accessor, passing `context`.
    ///
    /// Returns `None` when the type has no such accessor.
    #[must_use]
    pub fn access(&self, accessor: &str, context: Option<&C>) -> Option<Instance> {
        self.erased.access(accessor, context)
    }
}

impl<C> Clone for HandlerType<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            erased: Arc::clone(&self.erased),
        }
    }
}

impl<C> fmt::Debug for HandlerType<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations = self.operation_names();
        operations.sort_unstable();
        f.debug_struct("HandlerType")
            .field("name", &self.name)
            .field("operations", &operations)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerType`].
pub struct HandlerTypeBuilder<T, C> {
    name: String,
    constructor: Option<Constructor<T, C>>,
    accessors: HashMap<String, Accessor<T, C>>,
    operations: OperationTable<T>,
}

impl<T, C> HandlerTypeBuilder<T, C>
where
    T: Send + Sync + 'static,
    C: 'static,
{
    /// Sets the constructor used for fresh instances.
    #[must_use]
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Option<&C>) -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Adds a named accessor returning a shared instance.
    ///
    /// Caching the instance, if wanted, is the accessor's job.
    #[must_use]
    pub fn accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(Option<&C>) -> Arc<T> + Send + Sync + 'static,
    {
        self.accessors.insert(name.into(), Arc::new(accessor));
        self
    }

    /// Adds a named operation. A later operation with the same name
    /// replaces the earlier one.
    #[must_use]
    pub fn operation<F>(mut self, name: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&T, Value) -> OperationResult + Send + Sync + 'static,
    {
        self.operations.insert(name.into(), Arc::new(operation));
        self
    }

    /// Finishes the type.
    #[must_use]
    pub fn build(self) -> HandlerType<C> {
        HandlerType {
            name: self.name,
            erased: Arc::new(TypedHandler {
                constructor: self.constructor,
                accessors: self.accessors,
                operations: Arc::new(self.operations),
            }),
        }
    }
}
