//! # Inspection Capabilities
//!
//! The contract the engine needs from a debugger host.
//!
//! The engine never talks to a process directly. Everything it knows about a
//! container comes through these two traits, which mirror the small subset of
//! a debugger's value API that a passive formatter can use:
//!
//! - **Field lookup** by name and by position
//! - **Raw unsigned extraction** with a default for unreadable values
//! - **Type queries**: pointee type, array element type, byte size
//! - **Offset materialization**: reinterpret `*pointer + offset` as a type
//! - **Best-effort formatting**: a summary string or a plain textual value
//!
//! ## Read-only by construction
//!
//! None of these methods writes target memory, calls functions in the target
//! or resumes it. A host implementation backed by a live debugger, a core file
//! or an in-memory [`Snapshot`](crate::snapshot::Snapshot) all look the same
//! to the engine.
//!
//! ## Validity
//!
//! Lookups that can miss return `Option`. A host may still hand back a handle
//! whose memory cannot be read; [`TargetValue::is_valid`] reports that, and
//! [`TargetValue::into_valid`] folds it into the `Option`.

use std::fmt;

/// Static type information for a value in the target
pub trait TargetType: Clone + fmt::Debug
{
    /// Fully qualified type name, e.g. `psi::vm::tr_vector<int, unsigned int>`
    fn name(&self) -> String;

    /// Size of one value of this type in bytes
    ///
    /// May be 0 for incomplete or empty types. Callers dividing by this value
    /// must handle that case.
    fn byte_size(&self) -> u64;

    /// The type this pointer type points to, or `None` if it is not a pointer
    fn pointee(&self) -> Option<Self>;

    /// The element type of a fixed-size array type, or `None` otherwise
    fn array_element(&self) -> Option<Self>;
}

/// An opaque handle to a value in the inspected process
///
/// Handles are cheap to clone and are only expected to stay meaningful for
/// one refresh cycle: a handle obtained from a parent is valid only as long as
/// the parent is.
pub trait TargetValue: Clone + fmt::Debug + Sized
{
    /// Type descriptor produced by this host
    type Type: TargetType;

    /// Whether the handle refers to readable memory of a known type
    fn is_valid(&self) -> bool;

    /// Name of this value as shown to the user (member name, `[3]`, ...)
    ///
    /// Unnamed sub-objects (anonymous unions, unnamed bases) return `None`.
    fn name(&self) -> Option<String>;

    /// Static type of the value, if known
    fn value_type(&self) -> Option<Self::Type>;

    /// Direct member lookup by name
    ///
    /// Only the value's own members are searched. Members inherited through
    /// base sub-objects are found with
    /// [`MemberLocator`](crate::locate::MemberLocator).
    fn member(&self, name: &str) -> Option<Self>;

    /// Number of immediate children (members, bases or array elements)
    fn child_count(&self) -> usize;

    /// Immediate child by position
    fn child_at(&self, index: usize) -> Option<Self>;

    /// Position of the immediate child called `name`
    fn child_index(&self, name: &str) -> Option<usize>;

    /// The value's bits read as an unsigned integer, or `default` when the
    /// value is not scalar or cannot be read
    fn unsigned_or(&self, default: u64) -> u64;

    /// A pointer value holding this value's address
    fn address_of(&self) -> Option<Self>;

    /// The value this pointer points to; `None` for null or non-pointers
    fn dereference(&self) -> Option<Self>;

    /// Reinterpret the memory at `*self + offset` as `ty` and name it `name`
    ///
    /// `self` must be pointer-valued. This is the primitive behind every
    /// synthesized child: element `i` of a run is
    /// `base.element_at_offset("[i]", i * size_of(T), T)`.
    fn element_at_offset(&self, name: &str, offset: u64, ty: &Self::Type) -> Option<Self>;

    /// Host-provided one-line summary, if the host has one for this type
    fn summary(&self) -> Option<String>;

    /// Plain textual value for scalars and pointers
    fn value_text(&self) -> Option<String>;

    /// The same value presented under a different display name
    fn with_name(&self, name: &str) -> Self;

    /// Qualified name of the value's static type
    fn type_name(&self) -> Option<String>
    {
        self.value_type().map(|ty| ty.name())
    }

    /// `Some(self)` if the handle is readable
    fn into_valid(self) -> Option<Self>
    {
        self.is_valid().then_some(self)
    }
}
