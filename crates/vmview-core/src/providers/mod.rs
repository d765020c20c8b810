//! # Family Adapters
//!
//! One adapter per container family, each composing the
//! [locator](crate::locate) and the [resolver](crate::layout) into that
//! family's child-exposure and summary rules.
//!
//! | Family | Adapter | Children |
//! |--------|---------|----------|
//! | `tr_vector`, `fc_vector` | [`VectorProvider`] | `[i]` elements |
//! | `flat_set_impl`, `flat_set`, `flat_multiset` | [`FlatSetProvider`] | `[i]` elements of `storage_` |
//! | `detail::paired_storage` | [`PairedProvider`] | values labelled by key |
//! | `flat_map_impl`, `flat_map`, `flat_multimap` | [`PairedProvider`] | values labelled by key |
//! | `bptree_base`, `bp_tree_impl` | [`TreeIndexSummary`] | none (summary only) |
//! | `pass_in_reg`, `pass_rv_in_reg` | [`RegisterWrapperProvider`] | forwarded |
//!
//! ## Lifecycle
//!
//! The host creates an adapter for a value, calls
//! [`SyntheticChildren::update`], then queries it. All derived state is
//! recomputed from scratch on every `update`; nothing survives a process
//! state change.

mod flat_set;
mod paired;
mod tree;
mod vector;
mod wrapper;

use std::fmt;
use std::str::FromStr;

pub use flat_set::FlatSetProvider;
pub use paired::{PairSource, PairedProvider};
pub use tree::{TreeHeader, TreeIndexSummary, EMPTY_TREE_SUMMARY};
pub use vector::VectorProvider;
pub use wrapper::RegisterWrapperProvider;

use crate::error::VmViewError;
use crate::inspect::TargetValue;
use crate::label::parse_child_index;
use crate::locate::MemberLocator;

/// Synthetic child provider for one container value
pub trait SyntheticChildren<V: TargetValue>
{
    /// Re-derive all cached state from the wrapped value
    fn update(&mut self);

    /// Number of children as of the last `update`
    fn child_count(&self) -> usize;

    /// Child at `index`; `None` outside `0..child_count()`
    fn child_at(&self, index: usize) -> Option<V>;

    /// Index of the child displayed as `name`
    ///
    /// The default parses a bracketed index such as `[3]`.
    fn child_index(&self, name: &str) -> Option<usize>
    {
        parse_child_index(name)
    }

    /// One-line summary as of the last `update`
    fn summary(&self) -> String;
}

/// `size=<count>`, the summary shared by every sized family
pub(crate) fn size_summary(count: u64) -> String
{
    format!("size={count}")
}

/// Supported container families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family
{
    /// `tr_vector<T>`: transactional growable vector
    TransactionalVector,
    /// `fc_vector<T, N>`: fixed-capacity vector
    FixedCapacityVector,
    /// `flat_set_impl`, `flat_set`, `flat_multiset`
    FlatSet,
    /// `detail::paired_storage<K, V>`
    PairedStorage,
    /// `flat_map_impl`, `flat_map`, `flat_multimap`
    FlatMap,
    /// `bptree_base`, `bp_tree_impl<...>`
    TreeIndex,
    /// `pass_in_reg<T>`, `pass_rv_in_reg<T>`
    RegisterWrapper,
}

impl Family
{
    /// Every family, in registration order
    pub const ALL: [Family; 7] = [
        Family::TransactionalVector,
        Family::FixedCapacityVector,
        Family::FlatSet,
        Family::PairedStorage,
        Family::FlatMap,
        Family::TreeIndex,
        Family::RegisterWrapper,
    ];

    /// Stable identifier used in host commands and CLI output
    pub const fn name(self) -> &'static str
    {
        match self {
            Family::TransactionalVector => "tr_vector",
            Family::FixedCapacityVector => "fc_vector",
            Family::FlatSet => "flat_set",
            Family::PairedStorage => "paired_storage",
            Family::FlatMap => "flat_map",
            Family::TreeIndex => "bptree",
            Family::RegisterWrapper => "pass_in_reg",
        }
    }

    /// Whether the family exposes synthetic children
    pub const fn has_children(self) -> bool
    {
        !matches!(self, Family::TreeIndex)
    }

    /// Create an adapter for `value`, or `None` for summary-only families
    ///
    /// The adapter is returned un-updated; call
    /// [`SyntheticChildren::update`] before querying it.
    pub fn provider<V: TargetValue + 'static>(
        self,
        value: V,
        locator: &MemberLocator,
    ) -> Option<Box<dyn SyntheticChildren<V>>>
    {
        let provider: Box<dyn SyntheticChildren<V>> = match self {
            Family::TransactionalVector | Family::FixedCapacityVector => Box::new(VectorProvider::new(value)),
            Family::FlatSet => Box::new(FlatSetProvider::new(value, locator.clone())),
            Family::PairedStorage => Box::new(PairedProvider::new(value, PairSource::Direct, locator.clone())),
            Family::FlatMap => Box::new(PairedProvider::new(value, PairSource::MapStorage, locator.clone())),
            Family::RegisterWrapper => Box::new(RegisterWrapperProvider::new(value)),
            Family::TreeIndex => return None,
        };
        Some(provider)
    }

    /// One-line summary of `value`, computed from a fresh view
    pub fn summarize<V: TargetValue + 'static>(self, value: &V, locator: &MemberLocator) -> String
    {
        if self == Family::TreeIndex {
            let mut summary = TreeIndexSummary::new(value.clone(), locator.clone());
            summary.update();
            return summary.summary();
        }
        match self.provider(value.clone(), locator) {
            Some(mut provider) => {
                provider.update();
                provider.summary()
            }
            None => String::new(),
        }
    }
}

impl fmt::Display for Family
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Family
{
    type Err = VmViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Family::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VmViewError::UnknownFamily(s.to_string()))
    }
}
