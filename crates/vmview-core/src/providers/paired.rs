//! Key/value families: `detail::paired_storage` and the flat maps.
//!
//! Both keep keys and values in two separate runs matched index for index.
//! Child `i` is the value at `values[i]`, renamed with a label built from
//! `keys[i]` so the host renders `[key] = value`.

use tracing::{debug, warn};

use super::{size_summary, SyntheticChildren};
use crate::inspect::TargetValue;
use crate::label::display_label;
use crate::layout::{self, ContiguousRun};
use crate::locate::MemberLocator;

/// Where the `keys` and `values` runs are found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSource
{
    /// `keys` / `values` are direct members (`detail::paired_storage`)
    Direct,
    /// `storage_.keys` / `storage_.values`, located through base
    /// sub-objects; bare `keys` / `values` when there is no `storage_`
    MapStorage,
}

/// Children of a paired key/value container
#[derive(Debug, Clone)]
pub struct PairedProvider<V: TargetValue>
{
    value: V,
    source: PairSource,
    locator: MemberLocator,
    keys: ContiguousRun<V>,
    values: ContiguousRun<V>,
}

impl<V: TargetValue> PairedProvider<V>
{
    pub fn new(value: V, source: PairSource, locator: MemberLocator) -> Self
    {
        Self {
            value,
            source,
            locator,
            keys: ContiguousRun::empty(),
            values: ContiguousRun::empty(),
        }
    }

    /// Key run resolved by the last `update`
    pub fn keys(&self) -> &ContiguousRun<V>
    {
        &self.keys
    }

    /// Value run resolved by the last `update`
    pub fn values(&self) -> &ContiguousRun<V>
    {
        &self.values
    }

    fn containers(&self) -> (Option<V>, Option<V>)
    {
        match self.source {
            PairSource::Direct => (member(&self.value, "keys"), member(&self.value, "values")),
            PairSource::MapStorage => match self.locator.locate(&self.value, "storage_") {
                Some(storage) => (member(&storage, "keys"), member(&storage, "values")),
                None => (
                    self.locator.locate(&self.value, "keys"),
                    self.locator.locate(&self.value, "values"),
                ),
            },
        }
    }
}

fn member<V: TargetValue>(value: &V, name: &str) -> Option<V>
{
    value.member(name).and_then(TargetValue::into_valid)
}

impl<V: TargetValue> SyntheticChildren<V> for PairedProvider<V>
{
    fn update(&mut self)
    {
        let (keys, values) = self.containers();
        self.keys = layout::resolve_opt(keys.as_ref());
        self.values = layout::resolve_opt(values.as_ref());
        if self.keys.count() != self.values.count() {
            warn!(
                keys = self.keys.count(),
                values = self.values.count(),
                "key and value runs differ in length"
            );
        }
        debug!(source = ?self.source, count = self.keys.count(), "paired container updated");
    }

    /// The key run's count
    ///
    /// Entries past the end of a shorter value run are reported here but
    /// never materialized by [`child_at`](Self::child_at).
    fn child_count(&self) -> usize
    {
        self.keys.len()
    }

    fn child_at(&self, index: usize) -> Option<V>
    {
        let index = index as u64;
        if index >= self.keys.count() {
            return None;
        }
        let value = self.values.element_named(index, "value")?;
        let key = self.keys.element_named(index, "key");
        Some(value.with_name(&display_label(key.as_ref(), index)))
    }

    fn summary(&self) -> String
    {
        size_summary(self.keys.count())
    }
}
