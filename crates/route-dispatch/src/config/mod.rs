//! Deployment configuration for the dispatcher.
//!
//! [`DispatcherConfig`] holds the naming rules that turn a sanitised handler
//! name into a unit location and a fully-qualified type name. Every setter
//! normalises its input, and deserialised configuration is routed through the
//! same setters, so a config file can never bypass normalisation.

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::invoker::InstancePolicy;

/// Extension carried by every handler unit location.
pub const UNIT_EXTENSION: &str = ".rs";

/// Separator joining the namespace prefix to the type name.
pub const QUALIFIER_SEPARATOR: &str = "::";

/// Naming and instantiation rules applied by the dispatcher.
///
/// # Example
///
/// ```
/// use route_dispatch::DispatcherConfig;
///
/// let config = DispatcherConfig::default()
///     .with_search_root("handlers//")
///     .with_suffix("Controller")
///     .with_namespace("app");
///
/// assert_eq!(config.search_root(), "handlers/");
/// assert_eq!(config.unit_location("Widget").as_str(), "handlers/WidgetController.rs");
/// assert_eq!(config.type_name("Widget"), "app::WidgetController");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct DispatcherConfig {
    search_root: String,
    suffix: String,
    namespace: Option<String>,
    normalize_case: bool,
    singleton_accessor: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            search_root: String::new(),
            suffix: UNIT_EXTENSION.to_owned(),
            namespace: None,
            normalize_case: false,
            singleton_accessor: None,
        }
    }
}

impl DispatcherConfig {
    /// Sets the directory holding handler units.
    ///
    /// Trailing separators collapse to exactly one, so `handlers`,
    /// `handlers/`, and `handlers//` all yield `handlers/`.
    #[must_use]
    pub fn with_search_root(mut self, root: impl AsRef<str>) -> Self {
        self.search_root = format!("{}/", root.as_ref().trim_end_matches('/'));
        self
    }

    /// Sets the suffix appended to handler names.
    ///
    /// The unit extension is appended automatically.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl AsRef<str>) -> Self {
        self.suffix = format!("{}{UNIT_EXTENSION}", suffix.as_ref());
        self
    }

    /// Sets the namespace prepended to type names. An empty value clears it.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = non_empty(namespace.into());
        self
    }

    /// Sets the accessor used to fetch shared instances. An empty value
    /// restores fresh construction.
    #[must_use]
    pub fn with_singleton_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.singleton_accessor = non_empty(accessor.into());
        self
    }

    /// Enables or disables upper-casing the first handler-name character.
    #[must_use]
    pub const fn with_case_normalization(mut self, enabled: bool) -> Self {
        self.normalize_case = enabled;
        self
    }

    /// Returns the normalised search root; empty when unset.
    #[must_use]
    pub const fn search_root(&self) -> &str {
        self.search_root.as_str()
    }

    /// Returns the full suffix, including the unit extension.
    #[must_use]
    pub const fn suffix(&self) -> &str {
        self.suffix.as_str()
    }

    /// Returns the suffix with every occurrence of the unit extension
    /// removed.
    #[must_use]
    pub fn suffix_stem(&self) -> String {
        self.suffix.replace(UNIT_EXTENSION, "")
    }

    /// Returns the namespace prefix, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns `true` when handler names are case-normalised.
    #[must_use]
    pub const fn normalize_case(&self) -> bool {
        self.normalize_case
    }

    /// Returns the singleton accessor name, if any.
    #[must_use]
    pub fn singleton_accessor(&self) -> Option<&str> {
        self.singleton_accessor.as_deref()
    }

    /// Returns the instance policy selected by the accessor setting.
    #[must_use]
    pub fn instance_policy(&self) -> InstancePolicy {
        self.singleton_accessor
            .as_ref()
            .map_or(InstancePolicy::FreshConstruct, |accessor| {
                InstancePolicy::SharedAccessor(accessor.clone())
            })
    }

    /// Derives the unit location for an already sanitised handler name.
    #[must_use]
    pub fn unit_location(&self, handler: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}{handler}{}", self.search_root, self.suffix))
    }

    /// Derives the fully-qualified type name for an already sanitised
    /// handler name.
    #[must_use]
    pub fn type_name(&self, handler: &str) -> String {
        let local = format!("{handler}{}", self.suffix_stem());
        match &self.namespace {
            Some(namespace) => format!("{namespace}{QUALIFIER_SEPARATOR}{local}"),
            None => local,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Serialised form of [`DispatcherConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    search_root: Option<Utf8PathBuf>,
    suffix: String,
    namespace: String,
    normalize_case: bool,
    singleton_accessor: String,
}

impl From<ConfigFile> for DispatcherConfig {
    fn from(file: ConfigFile) -> Self {
        let base = Self::default()
            .with_suffix(file.suffix)
            .with_namespace(file.namespace)
            .with_singleton_accessor(file.singleton_accessor)
            .with_case_normalization(file.normalize_case);
        match file.search_root {
            Some(root) => base.with_search_root(root),
            None => base,
        }
    }
}
