//! Growable and fixed-capacity vectors.

use tracing::debug;

use super::{size_summary, SyntheticChildren};
use crate::inspect::TargetValue;
use crate::layout::{self, ContiguousRun};

/// Children of `tr_vector` and `fc_vector`
///
/// Both keep their count in `size_`; the resolver tells the pointer-backed
/// and the inline-storage encodings apart by type name, so one adapter serves
/// both families.
#[derive(Debug, Clone)]
pub struct VectorProvider<V: TargetValue>
{
    value: V,
    run: ContiguousRun<V>,
}

impl<V: TargetValue> VectorProvider<V>
{
    pub fn new(value: V) -> Self
    {
        Self {
            value,
            run: ContiguousRun::empty(),
        }
    }

    /// Run resolved by the last `update`
    pub fn run(&self) -> &ContiguousRun<V>
    {
        &self.run
    }
}

impl<V: TargetValue> SyntheticChildren<V> for VectorProvider<V>
{
    fn update(&mut self)
    {
        self.run = layout::resolve(&self.value);
        debug!(
            type_name = ?self.value.type_name(),
            encoding = ?self.run.encoding(),
            count = self.run.count(),
            "vector updated"
        );
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
