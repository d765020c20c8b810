//! Shared snapshot fixtures for integration tests

#![allow(dead_code)]

use vmview_core::snapshot::{Field, SnapshotBuilder, TypeId};

/// Scalar types every fixture starts from
pub struct Scalars
{
    pub int: TypeId,
    pub size_t: TypeId,
    pub int_ptr: TypeId,
}

pub fn scalars(b: &mut SnapshotBuilder) -> Scalars
{
    let int = b.signed("int", 4);
    let size_t = b.unsigned("unsigned long", 8);
    let int_ptr = b.pointer(int);
    Scalars { int, size_t, int_ptr }
}

/// `psi::vm::tr_vector<int, unsigned long>`: `p_array_` @0, `size_` @8
pub fn tr_vector(b: &mut SnapshotBuilder, s: &Scalars) -> TypeId
{
    b.record(
        "psi::vm::tr_vector<int, unsigned long>",
        vec![Field::named("p_array_", s.int_ptr, 0), Field::named("size_", s.size_t, 8)],
    )
}

/// `psi::vm::fc_vector<int, N>`: inline `array_` @0, `size_` after it
pub fn fc_vector(b: &mut SnapshotBuilder, s: &Scalars, capacity: u64) -> TypeId
{
    let storage = b.array(s.int, capacity);
    b.record(
        &format!("psi::vm::fc_vector<int, {capacity}>"),
        vec![Field::named("array_", storage, 0), Field::named("size_", s.size_t, 4 * capacity)],
    )
}

/// libc++ `std::vector<int>`: `__begin_` @0, `__end_` @8, `__end_cap_` @16
pub fn libcxx_vector(b: &mut SnapshotBuilder, s: &Scalars) -> TypeId
{
    b.record(
        "std::__1::vector<int, std::__1::allocator<int> >",
        vec![
            Field::named("__begin_", s.int_ptr, 0),
            Field::named("__end_", s.int_ptr, 8),
            Field::named("__end_cap_", s.int_ptr, 16),
        ],
    )
}

/// MSVC `std::vector<int>`: `_Mypair._Myval2._Myfirst` / `_Mylast`
pub fn msvc_vector(b: &mut SnapshotBuilder, s: &Scalars) -> TypeId
{
    let val = b.record(
        "std::_Vector_val<std::_Simple_types<int> >",
        vec![
            Field::named("_Myfirst", s.int_ptr, 0),
            Field::named("_Mylast", s.int_ptr, 8),
            Field::named("_Myend", s.int_ptr, 16),
        ],
    );
    let pair = b.record(
        "std::_Compressed_pair<std::allocator<int>,std::_Vector_val<std::_Simple_types<int> >,1>",
        vec![Field::named("_Myval2", val, 0)],
    );
    b.record("std::vector<int,std::allocator<int> >", vec![Field::named("_Mypair", pair, 0)])
}

/// libstdc++ `std::vector<int>`: `_M_impl._M_start` / `_M_finish`
pub fn libstdcxx_vector(b: &mut SnapshotBuilder, s: &Scalars) -> TypeId
{
    let implementation = b.record(
        "std::_Vector_base<int, std::allocator<int> >::_Vector_impl",
        vec![
            Field::named("_M_start", s.int_ptr, 0),
            Field::named("_M_finish", s.int_ptr, 8),
            Field::named("_M_end_of_storage", s.int_ptr, 16),
        ],
    );
    b.record(
        "std::vector<int, std::allocator<int> >",
        vec![Field::named("_M_impl", implementation, 0)],
    )
}

/// Write consecutive 32-bit integers starting at `address`
pub fn write_ints(b: &mut SnapshotBuilder, address: u64, values: &[i32])
{
    for (offset, value) in (0u64..).step_by(4).zip(values) {
        b.write_i32(address + offset, *value);
    }
}

/// A `tr_vector<int>` at `address` whose data lives at `data`
pub fn place_tr_vector(b: &mut SnapshotBuilder, address: u64, data: u64, values: &[i32])
{
    b.write_u64(address, data).write_u64(address + 8, values.len() as u64);
    write_ints(b, data, values);
}
