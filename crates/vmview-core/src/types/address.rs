//! Target memory address type.

use std::fmt;

/// Strongly typed address in the inspected process
///
/// Used wherever the engine reports where something lives in target memory
/// (run base addresses, array elements in a snapshot). Keeping it apart from plain `u64`
/// stops element counts and byte sizes from being mixed up with addresses.
///
/// ## Example
///
/// ```rust
/// use vmview_core::types::Address;
///
/// let base = Address::from(0x1000);
/// assert_eq!(base.element(2, 8), Some(Address::from(0x1010)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Address of element `index` in a run of `element_size`-byte elements
    /// starting here.
    ///
    /// Returns `None` if the offset computation overflows.
    pub fn element(self, index: u64, element_size: u64) -> Option<Self>
    {
        index.checked_mul(element_size).and_then(|offset| self.checked_add(offset))
    }

    /// Number of whole `element_size`-byte elements between `self` and `end`
    ///
    /// A reversed range counts as empty and a zero element size yields zero,
    /// so the result is always a usable element count.
    pub fn elements_until(self, end: Address, element_size: u64) -> u64
    {
        if element_size == 0 {
            return 0;
        }
        end.0.saturating_sub(self.0) / element_size
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}
