//! Register-passing wrappers (`pass_in_reg`, `pass_rv_in_reg`).

use super::SyntheticChildren;
use crate::inspect::TargetValue;

/// Transparent view of the wrapped `value` member
///
/// Child count, child access and index lookup all go straight to the inner
/// value, so the wrapper is invisible in the tree.
#[derive(Debug, Clone)]
pub struct RegisterWrapperProvider<V: TargetValue>
{
    value: V,
    inner: Option<V>,
}

impl<V: TargetValue> RegisterWrapperProvider<V>
{
    pub fn new(value: V) -> Self
    {
        Self { value, inner: None }
    }

    /// The wrapped value found by the last `update`
    pub fn inner(&self) -> Option<&V>
    {
        self.inner.as_ref()
    }
}

impl<V: TargetValue> SyntheticChildren<V> for RegisterWrapperProvider<V>
{
    fn update(&mut self)
    {
        self.inner = self.value.member("value").and_then(TargetValue::into_valid);
    }

    fn child_count(&self) -> usize
    {
        self.inner.as_ref().map_or(0, TargetValue::child_count)
    }

    fn child_at(&self, index: usize) -> Option<V>
    {
        self.inner.as_ref()?.child_at(index)
    }

    fn child_index(&self, name: &str) -> Option<usize>
    {
        self.inner.as_ref()?.child_index(name)
    }

    /// The inner summary, else its textual value, else empty
    fn summary(&self) -> String
    {
        self.inner
            .as_ref()
            .and_then(|inner| {
                inner
                    .summary()
                    .filter(|s| !s.is_empty())
                    .or_else(|| inner.value_text())
            })
            .unwrap_or_default()
    }
}
