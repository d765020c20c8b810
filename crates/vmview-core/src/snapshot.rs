//! # Snapshot Host
//!
//! An in-memory implementation of the inspection capabilities.
//!
//! A [`Snapshot`] is a frozen image of target memory plus a small type table.
//! It answers every [`TargetValue`] query from that image, which makes it a
//! host for offline rendering (the `vmview demo` command) and for exercising
//! the engine against exact byte layouts in tests.
//!
//! ## Building a snapshot
//!
//! ```rust
//! use vmview_core::inspect::TargetValue;
//! use vmview_core::snapshot::{Field, SnapshotBuilder};
//!
//! let mut builder = SnapshotBuilder::new();
//! let u32_ty = builder.unsigned("unsigned int", 4);
//! let point = builder.record("point", vec![Field::named("x", u32_ty, 0), Field::named("y", u32_ty, 4)]);
//! builder.write_u32(0x1000, 3).write_u32(0x1004, 4);
//! let snapshot = builder.build();
//!
//! let value = snapshot.value("p", 0x1000, point);
//! assert_eq!(value.member("y").unwrap().unsigned_or(0), 4);
//! ```
//!
//! ## Fidelity
//!
//! - Reads are little-endian and fail outside mapped segments.
//! - Member lookup is direct: members of base sub-objects are reached through
//!   the base child, the way a debugger presents inheritance.
//! - Base sub-objects are named after their type; unnamed sub-objects have
//!   no name at all.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{VmViewError, VmViewResult};
use crate::inspect::{TargetType, TargetValue};
use crate::label::parse_child_index;
use crate::types::Address;

/// Size of a pointer in the snapshot's target
pub const POINTER_SIZE: u64 = 8;

/// Index of a type in the snapshot's type table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// Shape of a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape
{
    /// Unsigned integer
    Unsigned,
    /// Two's complement integer
    Signed,
    /// Single byte character
    Character,
    /// Inline NUL-terminated text buffer; summarizes to its contents
    Text,
    /// Pointer to another type
    Pointer(TypeId),
    /// Fixed-size array
    Array
    {
        /// Element type
        element: TypeId,
        /// Number of elements
        len: u64,
    },
    /// Struct or class
    Record(Vec<Field>),
}

/// A member of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field
{
    /// Member name; `None` for unnamed sub-objects
    pub name: Option<String>,
    /// Member type
    pub ty: TypeId,
    /// Byte offset inside the record
    pub offset: u64,
    /// Whether the member is a base sub-object (named after its type)
    pub is_base: bool,
}

impl Field
{
    /// Ordinary named member
    pub fn named(name: &str, ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: Some(name.to_string()),
            ty,
            offset,
            is_base: false,
        }
    }

    /// Base sub-object; takes its name from the base type
    pub fn base(ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: None,
            ty,
            offset,
            is_base: true,
        }
    }

    /// Unnamed sub-object (anonymous struct or union)
    pub fn unnamed(ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: None,
            ty,
            offset,
            is_base: false,
        }
    }
}

#[derive(Debug, Clone)]
struct TypeDef
{
    name: String,
    size: u64,
    shape: TypeShape,
}

/// Incrementally declares types and fills memory
#[derive(Debug, Default)]
pub struct SnapshotBuilder
{
    types: Vec<TypeDef>,
    segments: BTreeMap<u64, Vec<u8>>,
}

impl SnapshotBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    fn declare(&mut self, name: String, size: u64, shape: TypeShape) -> TypeId
    {
        self.types.push(TypeDef { name, size, shape });
        TypeId(self.types.len() - 1)
    }

    fn size_of(&self, ty: TypeId) -> u64
    {
        self.types[ty.0].size
    }

    /// Unsigned integer of `size` bytes (1 to 8)
    pub fn unsigned(&mut self, name: &str, size: u64) -> TypeId
    {
        self.declare(name.to_string(), size, TypeShape::Unsigned)
    }

    /// Signed integer of `size` bytes (1 to 8)
    pub fn signed(&mut self, name: &str, size: u64) -> TypeId
    {
        self.declare(name.to_string(), size, TypeShape::Signed)
    }

    /// One-byte character
    pub fn character(&mut self, name: &str) -> TypeId
    {
        self.declare(name.to_string(), 1, TypeShape::Character)
    }

    /// Inline text buffer of `capacity` bytes
    pub fn text(&mut self, name: &str, capacity: u64) -> TypeId
    {
        self.declare(name.to_string(), capacity, TypeShape::Text)
    }

    /// Pointer to `pointee`, named `<pointee> *`
    pub fn pointer(&mut self, pointee: TypeId) -> TypeId
    {
        let name = format!("{} *", self.types[pointee.0].name);
        self.declare(name, POINTER_SIZE, TypeShape::Pointer(pointee))
    }

    /// Array of `len` elements, named `<element>[len]`
    pub fn array(&mut self, element: TypeId, len: u64) -> TypeId
    {
        let name = format!("{}[{len}]", self.types[element.0].name);
        let size = self.size_of(element).saturating_mul(len);
        self.declare(name, size, TypeShape::Array { element, len })
    }

    /// Record whose size is the end of its furthest member
    pub fn record(&mut self, name: &str, fields: Vec<Field>) -> TypeId
    {
        let size = fields
            .iter()
            .map(|f| f.offset + self.size_of(f.ty))
            .max()
            .unwrap_or(0);
        self.record_sized(name, size, fields)
    }

    /// Record with an explicit size (trailing padding, empty types)
    pub fn record_sized(&mut self, name: &str, size: u64, fields: Vec<Field>) -> TypeId
    {
        self.declare(name.to_string(), size, TypeShape::Record(fields))
    }

    /// Copy `bytes` into memory at `address`
    ///
    /// Overlapping or adjacent segments are merged, later writes win.
    pub fn write(&mut self, address: u64, bytes: &[u8]) -> &mut Self
    {
        let end = address.saturating_add(bytes.len() as u64);
        let touching: Vec<u64> = self
            .segments
            .range(..=end)
            .filter(|(base, data)| **base + data.len() as u64 >= address)
            .map(|(base, _)| *base)
            .collect();

        let mut start = address;
        let mut merged_end = end;
        for base in &touching {
            let len = self.segments[base].len() as u64;
            start = start.min(*base);
            merged_end = merged_end.max(base + len);
        }

        let mut merged = vec![0u8; usize::try_from(merged_end - start).unwrap_or(0)];
        for base in touching {
            if let Some(data) = self.segments.remove(&base) {
                let at = usize::try_from(base - start).unwrap_or(0);
                merged[at..at + data.len()].copy_from_slice(&data);
            }
        }
        let at = usize::try_from(address - start).unwrap_or(0);
        merged[at..at + bytes.len()].copy_from_slice(bytes);
        self.segments.insert(start, merged);
        self
    }

    /// Write a little-endian `u64`
    pub fn write_u64(&mut self, address: u64, value: u64) -> &mut Self
    {
        self.write(address, &value.to_le_bytes())
    }

    /// Write a little-endian `u32`
    pub fn write_u32(&mut self, address: u64, value: u32) -> &mut Self
    {
        self.write(address, &value.to_le_bytes())
    }

    /// Write a little-endian `i32`
    pub fn write_i32(&mut self, address: u64, value: i32) -> &mut Self
    {
        self.write(address, &value.to_le_bytes())
    }

    /// Write `text` followed by a NUL byte
    pub fn write_str(&mut self, address: u64, text: &str) -> &mut Self
    {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.write(address, &bytes)
    }

    /// Map `len` zeroed bytes at `address`
    pub fn reserve(&mut self, address: u64, len: u64) -> &mut Self
    {
        self.write(address, &vec![0u8; usize::try_from(len).unwrap_or(0)])
    }

    /// Freeze the image
    pub fn build(self) -> Snapshot
    {
        Snapshot {
            image: Rc::new(Image {
                types: self.types,
                segments: self.segments,
            }),
        }
    }
}

struct Image
{
    types: Vec<TypeDef>,
    segments: BTreeMap<u64, Vec<u8>>,
}

impl Image
{
    fn read(&self, address: u64, size: u64) -> VmViewResult<&[u8]>
    {
        let failed = || VmViewError::MemoryRead { address, size };
        if address == 0 {
            return Err(failed());
        }
        let (base, data) = self.segments.range(..=address).next_back().ok_or_else(failed)?;
        let start = usize::try_from(address - base).map_err(|_| failed())?;
        let len = usize::try_from(size).map_err(|_| failed())?;
        let end = start.checked_add(len).ok_or_else(failed)?;
        data.get(start..end).ok_or_else(failed)
    }

    fn read_unsigned(&self, address: u64, size: u64) -> VmViewResult<u64>
    {
        if size > 8 {
            return Err(VmViewError::MemoryRead { address, size });
        }
        let bytes = self.read(address, size)?;
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn def(&self, ty: TypeId) -> &TypeDef
    {
        &self.types[ty.0]
    }
}

/// Frozen memory image and type table
///
/// Cheap to clone; clones and every value handed out share one image.
#[derive(Clone)]
pub struct Snapshot
{
    image: Rc<Image>,
}

impl Snapshot
{
    /// Copy `size` bytes starting at `address`
    ///
    /// ## Errors
    ///
    /// [`VmViewError::MemoryRead`] if the range is not inside one mapped
    /// segment, or if `address` is null.
    pub fn read(&self, address: u64, size: u64) -> VmViewResult<&[u8]>
    {
        self.image.read(address, size)
    }

    /// Read a little-endian unsigned integer of `size` bytes (at most 8)
    ///
    /// ## Errors
    ///
    /// [`VmViewError::MemoryRead`] if the bytes are unmapped or `size` is
    /// wider than 8.
    pub fn read_unsigned(&self, address: u64, size: u64) -> VmViewResult<u64>
    {
        self.image.read_unsigned(address, size)
    }

    /// Look a declared type up by name
    ///
    /// ## Errors
    ///
    /// [`VmViewError::UnknownType`] if no type has that name.
    pub fn type_named(&self, name: &str) -> VmViewResult<TypeId>
    {
        self.image
            .types
            .iter()
            .position(|def| def.name == name)
            .map(TypeId)
            .ok_or_else(|| VmViewError::UnknownType(name.to_string()))
    }

    /// A named value of type `ty` living at `address`
    pub fn value(&self, name: &str, address: u64, ty: TypeId) -> SnapshotValue
    {
        SnapshotValue {
            image: Rc::clone(&self.image),
            name: Some(name.to_string()),
            location: Location::Memory(address),
            ty: SnapshotType::new(Rc::clone(&self.image), ty),
        }
    }
}

impl fmt::Debug for Snapshot
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Snapshot")
            .field("types", &self.image.types.len())
            .field("segments", &self.image.segments.len())
            .finish()
    }
}

/// Type handle: a declared type under zero or more synthetic pointer levels
///
/// The extra levels come from [`TargetValue::address_of`], which needs a
/// pointer type for any declared type without growing the table.
#[derive(Clone)]
pub struct SnapshotType
{
    image: Rc<Image>,
    id: TypeId,
    indirection: u32,
}

impl SnapshotType
{
    fn new(image: Rc<Image>, id: TypeId) -> Self
    {
        Self {
            image,
            id,
            indirection: 0,
        }
    }

    fn pointer_to(&self) -> Self
    {
        Self {
            image: Rc::clone(&self.image),
            id: self.id,
            indirection: self.indirection + 1,
        }
    }

    /// Shape of the declared type, or `None` for synthetic pointer levels
    fn shape(&self) -> Option<&TypeShape>
    {
        (self.indirection == 0).then(|| &self.image.def(self.id).shape)
    }

    fn is_pointer(&self) -> bool
    {
        self.indirection > 0 || matches!(self.shape(), Some(TypeShape::Pointer(_)))
    }
}

impl TargetType for SnapshotType
{
    fn name(&self) -> String
    {
        let mut name = self.image.def(self.id).name.clone();
        for _ in 0..self.indirection {
            name.push_str(" *");
        }
        name
    }

    fn byte_size(&self) -> u64
    {
        if self.indirection > 0 {
            POINTER_SIZE
        } else {
            self.image.def(self.id).size
        }
    }

    fn pointee(&self) -> Option<Self>
    {
        if self.indirection > 0 {
            return Some(Self {
                image: Rc::clone(&self.image),
                id: self.id,
                indirection: self.indirection - 1,
            });
        }
        match self.shape()? {
            TypeShape::Pointer(target) => Some(Self::new(Rc::clone(&self.image), *target)),
            _ => None,
        }
    }

    fn array_element(&self) -> Option<Self>
    {
        match self.shape()? {
            TypeShape::Array { element, .. } => Some(Self::new(Rc::clone(&self.image), *element)),
            _ => None,
        }
    }
}

impl PartialEq for SnapshotType
{
    fn eq(&self, other: &Self) -> bool
    {
        Rc::ptr_eq(&self.image, &other.image) && self.id == other.id && self.indirection == other.indirection
    }
}

impl fmt::Debug for SnapshotType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "SnapshotType({})", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location
{
    /// Lives in target memory
    Memory(u64),
    /// Computed scalar with no backing memory (results of `address_of`)
    Immediate(u64),
}

/// Value handle into a [`Snapshot`]
#[derive(Clone)]
pub struct SnapshotValue
{
    image: Rc<Image>,
    name: Option<String>,
    location: Location,
    ty: SnapshotType,
}

impl SnapshotValue
{
    /// Address of the value, if it lives in memory
    pub fn address(&self) -> Option<u64>
    {
        match self.location {
            Location::Memory(address) => Some(address),
            Location::Immediate(_) => None,
        }
    }

    fn at(&self, name: Option<String>, address: u64, ty: SnapshotType) -> Self
    {
        Self {
            image: Rc::clone(&self.image),
            name,
            location: Location::Memory(address),
            ty,
        }
    }

    fn typed(&self, id: TypeId) -> SnapshotType
    {
        SnapshotType::new(Rc::clone(&self.image), id)
    }

    fn field_value(&self, field: &Field) -> Option<Self>
    {
        let address = self.address()?.checked_add(field.offset)?;
        let name = if field.is_base {
            Some(self.image.def(field.ty).name.clone())
        } else {
            field.name.clone()
        };
        Some(self.at(name, address, self.typed(field.ty)))
    }

    fn fields(&self) -> &[Field]
    {
        match self.ty.shape() {
            Some(TypeShape::Record(fields)) => fields,
            _ => &[],
        }
    }

    fn raw_scalar(&self) -> Option<u64>
    {
        match self.location {
            Location::Immediate(value) => Some(value),
            Location::Memory(address) => {
                let scalar = self.ty.is_pointer()
                    || matches!(
                        self.ty.shape(),
                        Some(TypeShape::Unsigned | TypeShape::Signed | TypeShape::Character)
                    );
                if !scalar {
                    return None;
                }
                self.image.read_unsigned(address, self.ty.byte_size()).ok()
            }
        }
    }
}

impl TargetValue for SnapshotValue
{
    type Type = SnapshotType;

    fn is_valid(&self) -> bool
    {
        match self.location {
            Location::Immediate(_) => true,
            Location::Memory(0) => false,
            Location::Memory(address) => {
                let size = self.ty.byte_size();
                size == 0 || self.image.read(address, size).is_ok()
            }
        }
    }

    fn name(&self) -> Option<String>
    {
        self.name.clone()
    }

    fn value_type(&self) -> Option<Self::Type>
    {
        Some(self.ty.clone())
    }

    fn member(&self, name: &str) -> Option<Self>
    {
        self.fields()
            .iter()
            .find(|field| !field.is_base && field.name.as_deref() == Some(name))
            .and_then(|field| self.field_value(field))
    }

    fn child_count(&self) -> usize
    {
        match self.ty.shape() {
            Some(TypeShape::Record(fields)) => fields.len(),
            Some(TypeShape::Array { len, .. }) => usize::try_from(*len).unwrap_or(usize::MAX),
            _ => 0,
        }
    }

    fn child_at(&self, index: usize) -> Option<Self>
    {
        match self.ty.shape()? {
            TypeShape::Record(fields) => self.field_value(fields.get(index)?),
            TypeShape::Array { element, len } => {
                let index = index as u64;
                if index >= *len {
                    return None;
                }
                let size = self.image.def(*element).size;
                let address = Address::from(self.address()?).element(index, size)?;
                Some(self.at(Some(format!("[{index}]")), address.value(), self.typed(*element)))
            }
            _ => None,
        }
    }

    fn child_index(&self, name: &str) -> Option<usize>
    {
        match self.ty.shape()? {
            TypeShape::Record(_) => (0..self.child_count()).find(|&i| {
                self.child_at(i)
                    .and_then(|child| child.name)
                    .is_some_and(|child_name| child_name == name)
            }),
            TypeShape::Array { len, .. } => parse_child_index(name).filter(|&i| (i as u64) < *len),
            _ => None,
        }
    }

    fn unsigned_or(&self, default: u64) -> u64
    {
        self.raw_scalar().unwrap_or(default)
    }

    fn address_of(&self) -> Option<Self>
    {
        let address = self.address()?;
        Some(Self {
            image: Rc::clone(&self.image),
            name: self.name.as_ref().map(|name| format!("&{name}")),
            location: Location::Immediate(address),
            ty: self.ty.pointer_to(),
        })
    }

    fn dereference(&self) -> Option<Self>
    {
        let pointee = self.ty.pointee()?;
        let target = self.raw_scalar().filter(|&address| address != 0)?;
        let name = self.name.as_ref().map(|name| format!("*{name}"));
        Some(self.at(name, target, pointee))
    }

    fn element_at_offset(&self, name: &str, offset: u64, ty: &Self::Type) -> Option<Self>
    {
        if !self.ty.is_pointer() {
            return None;
        }
        let base = self.raw_scalar().filter(|&address| address != 0)?;
        Some(self.at(Some(name.to_string()), base.checked_add(offset)?, ty.clone()))
    }

    fn summary(&self) -> Option<String>
    {
        match (self.ty.shape()?, self.location) {
            (TypeShape::Text, Location::Memory(address)) => {
                let bytes = self.image.read(address, self.ty.byte_size()).ok()?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            _ => None,
        }
    }

    fn value_text(&self) -> Option<String>
    {
        let raw = self.raw_scalar()?;
        if self.ty.is_pointer() {
            return Some(format!("0x{raw:016x}"));
        }
        match self.ty.shape()? {
            TypeShape::Unsigned => Some(raw.to_string()),
            TypeShape::Signed => {
                let shift = 64 - 8 * self.ty.byte_size().clamp(1, 8);
                #[allow(clippy::cast_possible_wrap)]
                let signed = ((raw << shift) as i64) >> shift;
                Some(signed.to_string())
            }
            TypeShape::Character => {
                #[allow(clippy::cast_possible_truncation)]
                let byte = raw as u8;
                Some(format!("'{}'", char::from(byte).escape_default()))
            }
            _ => None,
        }
    }

    fn with_name(&self, name: &str) -> Self
    {
        Self {
            name: Some(name.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Debug for SnapshotValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SnapshotValue")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("type", &self.ty.name())
            .finish()
    }
}
