//! # Layout Resolver
//!
//! Turns a "contiguous run" value of unknown provenance into a uniform
//! `(base, element type, count)` descriptor.
//!
//! The same idea, a block of elements behind a count, shows up with several
//! physical encodings. The library's own vectors store a pointer and a size;
//! the fixed-capacity vector keeps its elements inline; standard vectors are
//! pointer pairs whose member names depend on the standard library in use.
//! The resolver picks the encoding from the type name and member shape alone.
//!
//! ## Strategy order
//!
//! | # | Encoding | Recognised by | Count |
//! |---|----------|---------------|-------|
//! | 1 | [`Encoding::Transactional`] | outer template name contains `tr_vector` | `size_` |
//! | 2 | [`Encoding::FixedCapacity`] | outer template name contains `fc_vector` | `size_` |
//! | 3 | [`Encoding::BeginEnd`] | `__begin_` / `__end_` | `(end - begin) / size_of(T)` |
//! | 4 | [`Encoding::CompressedPair`] | `_Mypair._Myval2._Myfirst` / `_Mylast` | same |
//! | 5 | [`Encoding::ImplStartFinish`] | `_M_impl._M_start` / `_M_finish` | same |
//!
//! The first strategy that recognises the value wins. The two library
//! encodings are gated on the type name and always answer once the tag
//! matches; the standard-library encodings answer only when every field they
//! need is present. New encodings are added by appending to [`strategies`].
//!
//! ## Degradation
//!
//! When nothing matches, [`resolve`] returns [`ContiguousRun::empty`]: no
//! base, count 0. Resolution never panics and never fails loudly.
//!
//! ## Example
//!
//! ```rust
//! use vmview_core::layout;
//! use vmview_core::snapshot::{Field, SnapshotBuilder};
//!
//! let mut builder = SnapshotBuilder::new();
//! let int = builder.signed("int", 4);
//! let int_ptr = builder.pointer(int);
//! let vector = builder.record(
//!     "std::__1::vector<int>",
//!     vec![Field::named("__begin_", int_ptr, 0), Field::named("__end_", int_ptr, 8)],
//! );
//! builder.write_u64(0x1000, 0x2000).write_u64(0x1008, 0x200c);
//! builder.write(0x2000, &[0; 12]);
//! let snapshot = builder.build();
//!
//! let run = layout::resolve(&snapshot.value("v", 0x1000, vector));
//! assert_eq!(run.count(), 3);
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::inspect::{TargetType, TargetValue};
use crate::types::Address;

/// Type-name tag of the transactional vector
pub const TRANSACTIONAL_TAG: &str = "tr_vector";
/// Type-name tag of the fixed-capacity vector
pub const FIXED_CAPACITY_TAG: &str = "fc_vector";

/// Physical encoding a run was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding
{
    /// `p_array_` data pointer plus `size_`
    Transactional,
    /// Inline `array_` storage plus `size_`
    FixedCapacity,
    /// libc++ `__begin_` / `__end_`
    BeginEnd,
    /// MSVC `_Mypair._Myval2._Myfirst` / `_Mylast`
    CompressedPair,
    /// libstdc++ `_M_impl._M_start` / `_M_finish`
    ImplStartFinish,
}

impl fmt::Display for Encoding
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Encoding::Transactional => "transactional",
            Encoding::FixedCapacity => "fixed-capacity",
            Encoding::BeginEnd => "begin/end",
            Encoding::CompressedPair => "compressed-pair",
            Encoding::ImplStartFinish => "impl-start/finish",
        };
        write!(f, "{label}")
    }
}

/// A resolved block of same-typed elements
///
/// `base` is a pointer-valued handle to element 0. A run without a base or
/// without an element type always has count 0, so [`ContiguousRun::element`]
/// never has to guess.
#[derive(Debug, Clone)]
pub struct ContiguousRun<V: TargetValue>
{
    base: Option<V>,
    element_type: Option<V::Type>,
    count: u64,
    encoding: Option<Encoding>,
}

impl<V: TargetValue> ContiguousRun<V>
{
    /// The unresolved run: no base, no element type, count 0
    pub fn empty() -> Self
    {
        Self {
            base: None,
            element_type: None,
            count: 0,
            encoding: None,
        }
    }

    /// Build a run, forcing the count to 0 when base or element type is missing
    pub fn new(base: Option<V>, element_type: Option<V::Type>, count: u64, encoding: Encoding) -> Self
    {
        let count = if base.is_some() && element_type.is_some() { count } else { 0 };
        Self {
            base,
            element_type,
            count,
            encoding: Some(encoding),
        }
    }

    /// Number of elements in the run
    pub fn count(&self) -> u64
    {
        self.count
    }

    /// Number of elements as a `usize`, saturating on 32-bit hosts
    pub fn len(&self) -> usize
    {
        usize::try_from(self.count).unwrap_or(usize::MAX)
    }

    /// Whether the run has no elements
    pub fn is_empty(&self) -> bool
    {
        self.count == 0
    }

    /// Whether any strategy recognised the value
    pub fn is_resolved(&self) -> bool
    {
        self.encoding.is_some()
    }

    /// Encoding the run was resolved from
    pub fn encoding(&self) -> Option<Encoding>
    {
        self.encoding
    }

    /// Pointer-valued handle to element 0
    pub fn base(&self) -> Option<&V>
    {
        self.base.as_ref()
    }

    /// Address of element 0 as stored in the base pointer
    pub fn base_address(&self) -> Option<Address>
    {
        self.base.as_ref().map(|base| Address::from(base.unsigned_or(0)))
    }

    /// Type of every element
    pub fn element_type(&self) -> Option<&V::Type>
    {
        self.element_type.as_ref()
    }

    /// Element `index` named `[index]`
    pub fn element(&self, index: u64) -> Option<V>
    {
        self.element_named(index, &format!("[{index}]"))
    }

    /// Element `index` under an explicit name
    ///
    /// Computed as `base + index * size_of(T)` on every call; `None` outside
    /// `0..count` or when the offset overflows.
    pub fn element_named(&self, index: u64, name: &str) -> Option<V>
    {
        if index >= self.count {
            return None;
        }
        let base = self.base.as_ref()?;
        let element_type = self.element_type.as_ref()?;
        let offset = index.checked_mul(element_type.byte_size())?;
        base.element_at_offset(name, offset, element_type)
    }
}

impl<V: TargetValue> Default for ContiguousRun<V>
{
    fn default() -> Self
    {
        Self::empty()
    }
}

/// One entry of the strategy table
pub struct Strategy<V: TargetValue>
{
    /// Encoding this strategy recognises
    pub encoding: Encoding,
    /// Returns `Some` when the value uses this encoding
    pub probe: fn(&V) -> Option<ContiguousRun<V>>,
}

/// The ordered strategy table
pub fn strategies<V: TargetValue>() -> [Strategy<V>; 5]
{
    [
        Strategy {
            encoding: Encoding::Transactional,
            probe: probe_transactional,
        },
        Strategy {
            encoding: Encoding::FixedCapacity,
            probe: probe_fixed_capacity,
        },
        Strategy {
            encoding: Encoding::BeginEnd,
            probe: probe_begin_end,
        },
        Strategy {
            encoding: Encoding::CompressedPair,
            probe: probe_compressed_pair,
        },
        Strategy {
            encoding: Encoding::ImplStartFinish,
            probe: probe_impl_start_finish,
        },
    ]
}

/// Resolve the layout of a contiguous-run value
///
/// Read-only and idempotent: with unchanged target memory, two calls yield
/// the same base address, element type and count.
pub fn resolve<V: TargetValue>(run: &V) -> ContiguousRun<V>
{
    for strategy in strategies::<V>() {
        if let Some(resolved) = (strategy.probe)(run) {
            trace!(
                encoding = %strategy.encoding,
                count = resolved.count(),
                "resolved contiguous run"
            );
            return resolved;
        }
    }
    debug!(type_name = ?run.type_name(), "no known layout matched");
    ContiguousRun::empty()
}

/// Resolve an optional run; absent storage resolves to the empty run
pub fn resolve_opt<V: TargetValue>(run: Option<&V>) -> ContiguousRun<V>
{
    run.map_or_else(ContiguousRun::empty, resolve)
}

/// Whether the outermost template name carries `tag`
///
/// Template arguments are ignored, so a standard vector of library vectors is
/// still left to the pointer-pair strategies.
fn outer_name_contains<V: TargetValue>(value: &V, tag: &str) -> bool
{
    value.type_name().is_some_and(|name| {
        let outer = name.split_once('<').map_or(name.as_str(), |(outer, _)| outer);
        outer.contains(tag)
    })
}

fn valid_member<V: TargetValue>(value: &V, name: &str) -> Option<V>
{
    value.member(name).and_then(TargetValue::into_valid)
}

fn size_field<V: TargetValue>(value: &V) -> u64
{
    valid_member(value, "size_").map_or(0, |size| size.unsigned_or(0))
}

fn probe_transactional<V: TargetValue>(value: &V) -> Option<ContiguousRun<V>>
{
    if !outer_name_contains(value, TRANSACTIONAL_TAG) {
        return None;
    }
    let data = valid_member(value, "p_array_");
    let element_type = data.as_ref().and_then(|p| p.value_type()).and_then(|ty| ty.pointee());
    Some(ContiguousRun::new(data, element_type, size_field(value), Encoding::Transactional))
}

fn probe_fixed_capacity<V: TargetValue>(value: &V) -> Option<ContiguousRun<V>>
{
    if !outer_name_contains(value, FIXED_CAPACITY_TAG) {
        return None;
    }
    let storage = valid_member(value, "array_").map(|array| valid_member(&array, "data").unwrap_or(array));
    let element_type = storage
        .as_ref()
        .and_then(|s| s.value_type())
        .and_then(|ty| ty.array_element());
    let base = storage.and_then(|s| s.address_of());
    Some(ContiguousRun::new(base, element_type, size_field(value), Encoding::FixedCapacity))
}

/// Count the elements between two pointer members
fn pointer_pair<V: TargetValue>(begin: V, end: &V, encoding: Encoding) -> ContiguousRun<V>
{
    let element_type = begin.value_type().and_then(|ty| ty.pointee());
    let element_size = element_type.as_ref().map_or(0, TargetType::byte_size);
    let count = Address::from(begin.unsigned_or(0)).elements_until(Address::from(end.unsigned_or(0)), element_size);
    ContiguousRun::new(Some(begin), element_type, count, encoding)
}

fn probe_begin_end<V: TargetValue>(value: &V) -> Option<ContiguousRun<V>>
{
    let begin = valid_member(value, "__begin_")?;
    let end = valid_member(value, "__end_")?;
    Some(pointer_pair(begin, &end, Encoding::BeginEnd))
}

fn probe_compressed_pair<V: TargetValue>(value: &V) -> Option<ContiguousRun<V>>
{
    let pair = valid_member(value, "_Mypair")?;
    let inner = valid_member(&pair, "_Myval2")?;
    let first = valid_member(&inner, "_Myfirst")?;
    let last = valid_member(&inner, "_Mylast")?;
    Some(pointer_pair(first, &last, Encoding::CompressedPair))
}

fn probe_impl_start_finish<V: TargetValue>(value: &V) -> Option<ContiguousRun<V>>
{
    let implementation = valid_member(value, "_M_impl")?;
    let start = valid_member(&implementation, "_M_start")?;
    let finish = valid_member(&implementation, "_M_finish")?;
    Some(pointer_pair(start, &finish, Encoding::ImplStartFinish))
}
