//! Sorted sets (`flat_set_impl`, `flat_set`, `flat_multiset`).

use tracing::debug;

use super::{size_summary, SyntheticChildren};
use crate::inspect::TargetValue;
use crate::layout::{self, ContiguousRun};
use crate::locate::MemberLocator;

/// Children of a flat set: the elements of its `storage_` run
///
/// `storage_` is declared on an implementation base, so it is found through
/// the locator rather than a direct member lookup.
#[derive(Debug, Clone)]
pub struct FlatSetProvider<V: TargetValue>
{
    value: V,
    locator: MemberLocator,
    run: ContiguousRun<V>,
}

impl<V: TargetValue> FlatSetProvider<V>
{
    pub fn new(value: V, locator: MemberLocator) -> Self
    {
        Self {
            value,
            locator,
            run: ContiguousRun::empty(),
        }
    }
}

impl<V: TargetValue> SyntheticChildren<V> for FlatSetProvider<V>
{
    fn update(&mut self)
    {
        let storage = self.locator.locate(&self.value, "storage_");
        self.run = layout::resolve_opt(storage.as_ref());
        debug!(found_storage = storage.is_some(), count = self.run.count(), "flat set updated");
    }

    fn child_count(&self) -> usize
    {
        self.run.len()
    }

    fn child_at(&self, index: usize) -> Option<V>
    {
        self.run.element(index as u64)
    }

    fn summary(&self) -> String
    {
        size_summary(self.run.count())
    }
}
