//! # Registration Table
//!
//! Which family handles which type name.
//!
//! The table is built once from a [`ViewConfig`] and is read-only afterwards.
//! It is the outbound half of the host contract: a host walks
//! [`Registry::bindings`] to install its own summary and synthetic-children
//! hooks, or asks the registry directly through [`Registry::summarize`] and
//! [`Registry::provider`].
//!
//! ## Patterns
//!
//! Patterns are anchored at the start of the namespace-qualified type name:
//!
//! - [`TypePattern::Generic`]: `psi::vm::tr_vector` matches every
//!   `psi::vm::tr_vector<...>` instantiation.
//! - [`TypePattern::Exact`]: `psi::vm::bptree_base` matches only that name.
//!
//! Hosts that take regular expressions get the equivalent `^...<` / `^...$`
//! form from [`TypePattern::host_regex`].

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::error::VmViewError;
use crate::inspect::TargetValue;
use crate::locate::MemberLocator;
use crate::providers::{Family, SyntheticChildren};

/// Anchored type-name pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypePattern
{
    /// Qualified template name; matches `<name><...>`
    Generic(String),
    /// Qualified non-template name; matches exactly
    Exact(String),
}

impl TypePattern
{
    /// Whether `type_name` is covered by this pattern
    ///
    /// ```rust
    /// use vmview_core::registry::TypePattern;
    ///
    /// let pattern = TypePattern::Generic("psi::vm::flat_map".into());
    /// assert!(pattern.matches("psi::vm::flat_map<int, int>"));
    /// assert!(!pattern.matches("psi::vm::flat_map_impl<int, int>"));
    /// ```
    pub fn matches(&self, type_name: &str) -> bool
    {
        match self {
            TypePattern::Generic(name) => type_name
                .strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with('<')),
            TypePattern::Exact(name) => type_name == name,
        }
    }

    /// Qualified name the pattern is anchored on
    pub fn qualified_name(&self) -> &str
    {
        match self {
            TypePattern::Generic(name) | TypePattern::Exact(name) => name,
        }
    }

    /// The pattern as an anchored regular expression
    pub fn host_regex(&self) -> String
    {
        match self {
            TypePattern::Generic(name) => format!("^{name}<"),
            TypePattern::Exact(name) => format!("^{name}$"),
        }
    }
}

impl fmt::Display for TypePattern
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.host_regex())
    }
}

impl FromStr for TypePattern
{
    type Err = VmViewError;

    /// Parse the host regex form produced by [`TypePattern::host_regex`]
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let body = s
            .strip_prefix('^')
            .ok_or_else(|| VmViewError::InvalidPattern(s.to_string()))?;
        let (name, generic) = if let Some(name) = body.strip_suffix('<') {
            (name, true)
        } else if let Some(name) = body.strip_suffix('$') {
            (name, false)
        } else {
            return Err(VmViewError::InvalidPattern(s.to_string()));
        };
        let well_formed = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
        if !well_formed {
            return Err(VmViewError::InvalidPattern(s.to_string()));
        }
        Ok(if generic {
            TypePattern::Generic(name.to_string())
        } else {
            TypePattern::Exact(name.to_string())
        })
    }
}

/// One pattern → family binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding
{
    /// Type names this binding applies to
    pub pattern: TypePattern,
    /// Family that summarizes (and possibly expands) matching values
    pub family: Family,
}

impl Binding
{
    /// Whether the host should install a synthetic-children provider
    pub fn has_synthetic(&self) -> bool
    {
        self.family.has_children()
    }
}

/// Type names relative to the namespace, and the family bound to each
const TABLE: &[(&str, bool, Family)] = &[
    ("tr_vector", true, Family::TransactionalVector),
    ("fc_vector", true, Family::FixedCapacityVector),
    // flat_set and flat_multiset derive from flat_set_impl
    ("flat_set_impl", true, Family::FlatSet),
    ("flat_set", true, Family::FlatSet),
    ("flat_multiset", true, Family::FlatSet),
    ("detail::paired_storage", true, Family::PairedStorage),
    ("flat_map_impl", true, Family::FlatMap),
    ("flat_map", true, Family::FlatMap),
    ("flat_multimap", true, Family::FlatMap),
    ("bptree_base", false, Family::TreeIndex),
    ("bp_tree_impl", true, Family::TreeIndex),
    ("pass_in_reg", true, Family::RegisterWrapper),
    ("pass_rv_in_reg", true, Family::RegisterWrapper),
];

/// The immutable formatter table
#[derive(Debug, Clone)]
pub struct Registry
{
    config: ViewConfig,
    locator: MemberLocator,
    bindings: Vec<Binding>,
}

impl Registry
{
    /// Build the table for the namespace in `config`
    pub fn new(config: &ViewConfig) -> Self
    {
        let bindings: Vec<Binding> = TABLE
            .iter()
            .map(|&(name, generic, family)| {
                let qualified = format!("{}{name}", config.namespace);
                Binding {
                    pattern: if generic {
                        TypePattern::Generic(qualified)
                    } else {
                        TypePattern::Exact(qualified)
                    },
                    family,
                }
            })
            .collect();
        info!(
            category = %config.category,
            bindings = bindings.len(),
            "formatter table built"
        );
        Self {
            config: config.clone(),
            locator: MemberLocator::from_config(config),
            bindings,
        }
    }

    /// Category grouping every binding
    pub fn category(&self) -> &str
    {
        &self.config.category
    }

    /// Configuration the table was built from
    pub fn config(&self) -> &ViewConfig
    {
        &self.config
    }

    /// Locator shared by every adapter this registry creates
    pub fn locator(&self) -> &MemberLocator
    {
        &self.locator
    }

    /// All bindings in registration order
    pub fn bindings(&self) -> &[Binding]
    {
        &self.bindings
    }

    /// First binding whose pattern covers `type_name`
    pub fn find(&self, type_name: &str) -> Option<&Binding>
    {
        let binding = self.bindings.iter().find(|b| b.pattern.matches(type_name));
        debug!(type_name, family = ?binding.map(|b| b.family), "binding lookup");
        binding
    }

    /// Family bound to the value's type, if any
    pub fn family_of<V: TargetValue>(&self, value: &V) -> Option<Family>
    {
        let type_name = value.type_name()?;
        self.find(&type_name).map(|b| b.family)
    }

    /// Summary for `value`, or `None` when no binding covers its type
    pub fn summarize<V: TargetValue + 'static>(&self, value: &V) -> Option<String>
    {
        self.family_of(value)
            .map(|family| family.summarize(value, &self.locator))
    }

    /// Updated synthetic-children provider for `value`
    ///
    /// `None` when no binding covers the type or the family is summary-only.
    pub fn provider<V: TargetValue + 'static>(&self, value: &V) -> Option<Box<dyn SyntheticChildren<V>>>
    {
        let family = self.family_of(value)?;
        let mut provider = family.provider(value.clone(), &self.locator)?;
        provider.update();
        Some(provider)
    }

    /// LLDB commands that install the table from the script module
    ///
    /// One summary line per binding, one synthetic line per binding with
    /// children, and a final line enabling the category.
    pub fn lldb_commands(&self) -> Vec<String>
    {
        let module = &self.config.script_module;
        let category = &self.config.category;
        let mut commands = Vec::new();
        for binding in &self.bindings {
            let regex = binding.pattern.host_regex();
            let family = binding.family.name();
            commands.push(format!(
                "type summary add -F {module}.{family}_summary -x \"{regex}\" -w {category}"
            ));
            if binding.has_synthetic() {
                commands.push(format!(
                    "type synthetic add -l {module}.{} -x \"{regex}\" -w {category}",
                    provider_class(binding.family)
                ));
            }
        }
        commands.push(format!("type category enable {category}"));
        commands
    }
}

impl Default for Registry
{
    fn default() -> Self
    {
        Self::new(&ViewConfig::default())
    }
}

/// Script-side provider class name for a family
fn provider_class(family: Family) -> String
{
    let camel: String = family
        .name()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect();
    format!("{camel}SynthProvider")
}
