//! Registry of handler units and the types they define.
//!
//! Units are registered at startup under the location the dispatcher will
//! derive for them (`search_root + name + suffix`). Registering a unit does
//! not run it: each unit carries an installer that defines its
//! [`HandlerType`]s into a [`TypeCatalog`] the first time a dispatch needs it.
//! Types defined by a loaded unit stay registered for the lifetime of the
//! registry, which is the process-wide handler table shared by every
//! dispatcher built over it.
//!
//! Each unit has its own load guard, so concurrent first dispatches to the
//! same unit run its installer at most once. A failed load is remembered and
//! reported again on later dispatches rather than re-running the installer.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::error::{DispatchError, LoadError, RegistryError};
use crate::handler::HandlerType;

/// Tracing target for unit loading.
const LOAD_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

type UnitInstaller<C> = Arc<dyn Fn(&mut TypeCatalog<C>) -> Result<(), LoadError> + Send + Sync>;
type LoadState = Result<(), Arc<LoadError>>;

/// Collects the types a unit defines while it is being loaded.
pub struct TypeCatalog<C> {
    types: Vec<HandlerType<C>>,
}

impl<C> TypeCatalog<C> {
    const fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Defines a handler type.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateType`] if this unit already defined a
    /// type with the same name.
    pub fn define(&mut self, handler_type: HandlerType<C>) -> Result<(), LoadError> {
        if self.contains(handler_type.name()) {
            return Err(LoadError::duplicate_type(handler_type.name()));
        }
        self.types.push(handler_type);
        Ok(())
    }

    /// Returns `true` if a type with this name has been defined.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.iter().any(|defined| defined.name() == type_name)
    }
}

struct UnitEntry<C> {
    installer: UnitInstaller<C>,
    state: OnceCell<LoadState>,
}

/// Registry of handler units keyed by location.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use route_dispatch::{HandlerRegistry, HandlerType};
/// use serde_json::{Value, json};
///
/// struct Widget;
///
/// let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
/// registry
///     .register_unit("handlers/WidgetController.rs", |catalog| {
///         catalog.define(
///             HandlerType::builder("WidgetController")
///                 .constructor(|_context: Option<&()>| Widget)
///                 .operation("show", |_widget: &Widget, arguments: Value| Ok(arguments))
///                 .build(),
///         )
///     })
///     .expect("registration succeeds");
///
/// assert!(registry.contains_unit(Utf8Path::new("handlers/WidgetController.rs")));
/// assert!(!registry.is_loaded(Utf8Path::new("handlers/WidgetController.rs")));
/// ```
pub struct HandlerRegistry<C> {
    units: HashMap<Utf8PathBuf, UnitEntry<C>>,
    types: RwLock<HashMap<String, HandlerType<C>>>,
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self {
            units: HashMap::new(),
            types: RwLock::new(HashMap::new()),
        }
    }
}

impl<C> HandlerRegistry<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit at `location`.
    ///
    /// The installer runs at most once, on the first dispatch that resolves
    /// to this location. It must not dispatch back into the same unit.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateUnit`] if a unit is already
    /// registered at `location`.
    pub fn register_unit<F>(
        &mut self,
        location: impl Into<Utf8PathBuf>,
        installer: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut TypeCatalog<C>) -> Result<(), LoadError> + Send + Sync + 'static,
    {
        let unit_location = location.into();
        if self.units.contains_key(&unit_location) {
            return Err(RegistryError::DuplicateUnit {
                location: unit_location,
            });
        }
        self.units.insert(
            unit_location,
            UnitEntry {
                installer: Arc::new(installer),
                state: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Returns `true` if a unit is registered at `location`.
    #[must_use]
    pub fn contains_unit(&self, location: &Utf8Path) -> bool {
        self.units.contains_key(location)
    }

    /// Returns `true` if the unit at `location` has loaded successfully.
    #[must_use]
    pub fn is_loaded(&self, location: &Utf8Path) -> bool {
        self.units
            .get(location)
            .and_then(|entry| entry.state.get())
            .is_some_and(Result::is_ok)
    }

    /// Returns the number of registered units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Looks up a loaded type by its fully-qualified name.
    #[must_use]
    pub fn resolve_type(&self, type_name: &str) -> Option<HandlerType<C>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
    }

    /// Returns the names of all loaded types, sorted.
    #[must_use]
    pub fn loaded_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    /// Loads the unit at `location` unless it has already been loaded.
    ///
    /// `handler` is the sanitised handler name, used for error context.
    pub(crate) fn ensure_loaded(
        &self,
        handler: &str,
        location: &Utf8Path,
    ) -> Result<(), DispatchError> {
        let entry = self
            .units
            .get(location)
            .ok_or_else(|| DispatchError::unit_not_found(handler, location))?;

        match entry
            .state
            .get_or_init(|| self.install(location, &entry.installer))
        {
            Ok(()) => Ok(()),
            Err(source) => Err(DispatchError::UnitLoad {
                location: location.to_owned(),
                source: Arc::clone(source),
            }),
        }
    }

    fn install(&self, location: &Utf8Path, installer: &UnitInstaller<C>) -> LoadState {
        let mut catalog = TypeCatalog::new();
        if let Err(load_error) = installer(&mut catalog) {
            error!(target: LOAD_TARGET, %location, error = %load_error, "handler unit failed to load");
            return Err(Arc::new(load_error));
        }

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(duplicate) = catalog
            .types
            .iter()
            .find(|defined| types.contains_key(defined.name()))
        {
            let load_error = LoadError::duplicate_type(duplicate.name());
            error!(target: LOAD_TARGET, %location, error = %load_error, "handler unit failed to load");
            return Err(Arc::new(load_error));
        }

        let defined = catalog.types.len();
        for handler_type in catalog.types {
            types.insert(handler_type.name().to_owned(), handler_type);
        }
        info!(target: LOAD_TARGET, %location, defined, "handler unit loaded");
        Ok(())
    }
}

impl<C> fmt::Debug for HandlerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut units: Vec<&str> = self
            .units
            .keys()
            .map(Utf8PathBuf::as_path)
            .map(Utf8Path::as_str)
            .collect();
        units.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("units", &units)
            .field("loaded_types", &self.loaded_type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests;
