//! # Base-Member Locator
//!
//! Finds a logical field wherever it physically lives.
//!
//! The public container types of the library are thin shells: `flat_map`
//! derives from `flat_map_impl`, which derives from `flat_impl`, which owns
//! `storage_`. A debugger shows that as a tree of base sub-objects, and a
//! plain member lookup on the outer value misses the field. The locator walks
//! that tree so that family adapters can ask for `storage_` without knowing
//! how deep it sits.
//!
//! ## Search order
//!
//! 1. Direct member lookup on the value.
//! 2. Scan immediate children in order:
//!    - a child named exactly like the field is returned;
//!    - a child that is unnamed, or whose name or type name starts with the
//!      library namespace, is searched recursively.
//! 3. Nothing found: `None`.
//!
//! The descent is bounded by [`ViewConfig::max_search_depth`], so a malformed
//! or cyclic type graph costs at most that many levels.

use tracing::trace;

use crate::config::ViewConfig;
use crate::inspect::TargetValue;

/// Resolves named fields through unnamed and library-internal sub-objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLocator
{
    namespace: String,
    max_depth: usize,
}

impl MemberLocator
{
    /// Create a locator for types in `namespace` (e.g. `psi::vm::`)
    pub fn new(namespace: impl Into<String>, max_depth: usize) -> Self
    {
        Self {
            namespace: namespace.into(),
            max_depth,
        }
    }

    /// Build a locator from the load-time configuration
    pub fn from_config(config: &ViewConfig) -> Self
    {
        Self::new(config.namespace.clone(), config.max_search_depth)
    }

    /// Namespace prefix this locator descends into
    pub fn namespace(&self) -> &str
    {
        &self.namespace
    }

    /// Find `field` on `value` or on any of its library-internal sub-objects
    ///
    /// Returns `None` when the field does not exist at any searched depth or
    /// when the match is not readable.
    pub fn locate<V: TargetValue>(&self, value: &V, field: &str) -> Option<V>
    {
        let found = self.search(value, field, 0);
        if found.is_none() {
            trace!(field, type_name = ?value.type_name(), "member not found");
        }
        found
    }

    fn search<V: TargetValue>(&self, value: &V, field: &str, depth: usize) -> Option<V>
    {
        if let Some(direct) = value.member(field).and_then(TargetValue::into_valid) {
            return Some(direct);
        }
        if depth >= self.max_depth {
            return None;
        }

        for index in 0..value.child_count() {
            let Some(child) = value.child_at(index) else {
                continue;
            };
            let name = child.name();
            if name.as_deref() == Some(field) {
                if let Some(found) = child.into_valid() {
                    return Some(found);
                }
                continue;
            }
            if self.is_transparent(&child, name.as_deref()) {
                trace!(field, depth, sub_object = ?name, "descending into sub-object");
                if let Some(found) = self.search(&child, field, depth + 1) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Unnamed children and library-internal sub-objects are searched through
    fn is_transparent<V: TargetValue>(&self, child: &V, name: Option<&str>) -> bool
    {
        match name {
            None => true,
            Some(name) if name.starts_with(&self.namespace) => true,
            Some(_) => child
                .type_name()
                .is_some_and(|type_name| type_name.starts_with(&self.namespace)),
        }
    }
}

impl Default for MemberLocator
{
    fn default() -> Self
    {
        Self::from_config(&ViewConfig::default())
    }
}
