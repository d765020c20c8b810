//! # Configuration
//!
//! Load-time settings for the formatter table.
//!
//! A [`ViewConfig`] is built once, handed to
//! [`Registry::new`](crate::registry::Registry::new), and never changes
//! afterwards. Defaults match the `psi::vm` library; the environment can
//! override them for forks that live in another namespace.
//!
//! ## Environment Variables
//!
//! - `VMVIEW_NAMESPACE`: library namespace prefix (must end with `::`)
//! - `VMVIEW_CATEGORY`: formatter category name
//! - `VMVIEW_SEARCH_DEPTH`: maximum base sub-object depth searched for a field
//! - `VMVIEW_SCRIPT_MODULE`: script module name used in emitted host commands

use std::env;

use crate::error::{VmViewError, VmViewResult};

/// Default library namespace prefix
pub const DEFAULT_NAMESPACE: &str = "psi::vm::";
/// Default formatter category
pub const DEFAULT_CATEGORY: &str = "psi_vm";
/// Default script module name
pub const DEFAULT_SCRIPT_MODULE: &str = "psi_vm_lldb";
/// Default depth limit for base sub-object searches
pub const DEFAULT_SEARCH_DEPTH: usize = 8;

/// Formatter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig
{
    /// Namespace prefix shared by every supported type, e.g. `psi::vm::`
    pub namespace: String,
    /// Category that groups every binding so the host can toggle them together
    pub category: String,
    /// How many nested sub-objects the member locator descends into
    pub max_search_depth: usize,
    /// Name of the script module the host loads the formatters from
    pub script_module: String,
}

impl ViewConfig
{
    /// Read overrides from the environment on top of the defaults
    ///
    /// ## Errors
    ///
    /// Returns [`VmViewError::InvalidConfig`] if a variable is set to a value
    /// that fails validation.
    pub fn from_env() -> VmViewResult<Self>
    {
        let mut config = Self::default();
        if let Ok(namespace) = env::var("VMVIEW_NAMESPACE") {
            config = config.with_namespace(&namespace)?;
        }
        if let Ok(category) = env::var("VMVIEW_CATEGORY") {
            config = config.with_category(&category)?;
        }
        if let Ok(depth) = env::var("VMVIEW_SEARCH_DEPTH") {
            let parsed = depth.trim().parse::<usize>().map_err(|_| invalid("VMVIEW_SEARCH_DEPTH", &depth))?;
            config = config.with_search_depth(parsed)?;
        }
        if let Ok(module) = env::var("VMVIEW_SCRIPT_MODULE") {
            config = config.with_script_module(&module)?;
        }
        Ok(config)
    }

    /// Replace the namespace prefix
    ///
    /// ## Errors
    ///
    /// The prefix must be non-empty and end with `::`.
    pub fn with_namespace(mut self, namespace: &str) -> VmViewResult<Self>
    {
        let namespace = namespace.trim();
        if namespace.len() <= 2 || !namespace.ends_with("::") {
            return Err(invalid("VMVIEW_NAMESPACE", namespace));
        }
        self.namespace = namespace.to_string();
        Ok(self)
    }

    /// Replace the category name
    ///
    /// ## Errors
    ///
    /// The name must be non-empty and contain no whitespace.
    pub fn with_category(mut self, category: &str) -> VmViewResult<Self>
    {
        if category.is_empty() || category.chars().any(char::is_whitespace) {
            return Err(invalid("VMVIEW_CATEGORY", category));
        }
        self.category = category.to_string();
        Ok(self)
    }

    /// Replace the locator depth limit
    ///
    /// ## Errors
    ///
    /// A depth of 0 would disable base sub-object search entirely and is
    /// rejected.
    pub fn with_search_depth(mut self, depth: usize) -> VmViewResult<Self>
    {
        if depth == 0 {
            return Err(invalid("VMVIEW_SEARCH_DEPTH", "0"));
        }
        self.max_search_depth = depth;
        Ok(self)
    }

    /// Replace the script module name
    ///
    /// ## Errors
    ///
    /// The name must be a non-empty identifier (ASCII alphanumerics and `_`).
    pub fn with_script_module(mut self, module: &str) -> VmViewResult<Self>
    {
        if module.is_empty() || !module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("VMVIEW_SCRIPT_MODULE", module));
        }
        self.script_module = module.to_string();
        Ok(self)
    }
}

impl Default for ViewConfig
{
    fn default() -> Self
    {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            max_search_depth: DEFAULT_SEARCH_DEPTH,
            script_module: DEFAULT_SCRIPT_MODULE.to_string(),
        }
    }
}

fn invalid(key: &str, value: &str) -> VmViewError
{
    VmViewError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}
