//! Sample snapshot rendered by `vmview demo`.
//!
//! One value per family, laid out the way the library lays them out, plus an
//! uninitialized tree to show the degraded summary.

use std::fmt::Write as _;

use vmview_core::inspect::TargetValue;
use vmview_core::snapshot::{Field, Snapshot, SnapshotBuilder};
use vmview_core::{Registry, VmViewResult};

/// Levels of children printed below each root
const MAX_DEPTH: usize = 3;

/// Root variables: name, type name, address
const ROOTS: &[(&str, &str, u64)] = &[
    ("numbers", "psi::vm::tr_vector<int, unsigned long>", 0x1000),
    ("inline_numbers", "psi::vm::fc_vector<int, 4>", 0x1100),
    ("primes", "psi::vm::flat_set<int>", 0x1200),
    ("ids", "psi::vm::flat_map<psi::vm::small_string, int>", 0x1300),
    ("index", "psi::vm::bp_tree_impl<int>", 0x1400),
    ("unopened_index", "psi::vm::bp_tree_impl<int>", 0x1500),
    ("argument", "psi::vm::pass_in_reg<int>", 0x1600),
];

/// Declare the sample types and fill memory
#[allow(clippy::too_many_lines)]
fn sample_snapshot() -> Snapshot
{
    let mut b = SnapshotBuilder::new();
    let int = b.signed("int", 4);
    let size_t = b.unsigned("unsigned long", 8);
    let int_ptr = b.pointer(int);

    let tr_vector = b.record(
        "psi::vm::tr_vector<int, unsigned long>",
        vec![Field::named("p_array_", int_ptr, 0), Field::named("size_", size_t, 8)],
    );

    let int4 = b.array(int, 4);
    b.record(
        "psi::vm::fc_vector<int, 4>",
        vec![Field::named("array_", int4, 0), Field::named("size_", size_t, 16)],
    );

    let std_vector = b.record(
        "std::__1::vector<int, std::__1::allocator<int> >",
        vec![
            Field::named("__begin_", int_ptr, 0),
            Field::named("__end_", int_ptr, 8),
            Field::named("__end_cap_", int_ptr, 16),
        ],
    );
    let set_impl = b.record("psi::vm::flat_set_impl<int>", vec![Field::named("storage_", std_vector, 0)]);
    b.record("psi::vm::flat_set<int>", vec![Field::base(set_impl, 0)]);

    let small_string = b.text("psi::vm::small_string", 8);
    let string_ptr = b.pointer(small_string);
    let key_vector = b.record(
        "psi::vm::tr_vector<psi::vm::small_string, unsigned long>",
        vec![Field::named("p_array_", string_ptr, 0), Field::named("size_", size_t, 8)],
    );
    let paired = b.record(
        "psi::vm::detail::paired_storage<psi::vm::small_string, int>",
        vec![Field::named("keys", key_vector, 0), Field::named("values", tr_vector, 16)],
    );
    let map_impl = b.record(
        "psi::vm::flat_map_impl<psi::vm::small_string, int>",
        vec![Field::named("storage_", paired, 0)],
    );
    b.record("psi::vm::flat_map<psi::vm::small_string, int>", vec![Field::base(map_impl, 0)]);

    let header = b.record(
        "psi::vm::bptree_base::header",
        vec![Field::named("size_", size_t, 0), Field::named("depth_", size_t, 8)],
    );
    let header_ptr = b.pointer(header);
    let handle = b.record("psi::vm::header_ptr", vec![Field::named("ptr", header_ptr, 0)]);
    let tree_base = b.record("psi::vm::bptree_base", vec![Field::named("p_hdr_", handle, 0)]);
    b.record("psi::vm::bp_tree_impl<int>", vec![Field::base(tree_base, 0)]);

    b.record("psi::vm::pass_in_reg<int>", vec![Field::named("value", int, 0)]);

    // numbers: three elements behind p_array_
    b.write_u64(0x1000, 0x8000).write_u64(0x1008, 3);
    b.write_i32(0x8000, 10).write_i32(0x8004, 20).write_i32(0x8008, 30);

    // inline_numbers: two of four slots in use
    b.write_i32(0x1100, 1).write_i32(0x1104, 2).reserve(0x1108, 8).write_u64(0x1110, 2);

    // primes: libc++ vector storage in the flat_set_impl base
    b.write_u64(0x1200, 0x8100).write_u64(0x1208, 0x810c).write_u64(0x1210, 0x8110);
    b.write_i32(0x8100, 3).write_i32(0x8104, 5).write_i32(0x8108, 7);

    // ids: keys and values in parallel runs
    b.write_u64(0x1300, 0x8200).write_u64(0x1308, 2);
    b.write_u64(0x1310, 0x8300).write_u64(0x1318, 2);
    b.reserve(0x8200, 16).write_str(0x8200, "alpha").write_str(0x8208, "beta");
    b.write_i32(0x8300, 100).write_i32(0x8304, 200);

    // index: header behind p_hdr_.ptr
    b.write_u64(0x1400, 0x8400);
    b.write_u64(0x8400, 42).write_u64(0x8408, 3);

    // unopened_index: null header pointer
    b.write_u64(0x1500, 0);

    // argument
    b.write_i32(0x1600, 7);

    b.build()
}

/// Build the sample snapshot and render every root
///
/// ## Errors
///
/// Returns an error if a root names an undeclared type.
pub fn render_sample(registry: &Registry) -> VmViewResult<String>
{
    let snapshot = sample_snapshot();
    let mut out = String::new();
    for &(name, type_name, address) in ROOTS {
        let ty = snapshot.type_named(type_name)?;
        render(registry, &snapshot.value(name, address, ty), 0, &mut out);
    }
    Ok(out)
}

/// Append `name = summary` for `value` and recurse into its children
fn render<V: TargetValue + 'static>(registry: &Registry, value: &V, depth: usize, out: &mut String)
{
    let name = value.name().unwrap_or_default();
    let summary = registry
        .summarize(value)
        .or_else(|| value.summary())
        .or_else(|| value.value_text())
        .unwrap_or_default();
    let _ = writeln!(out, "{:indent$}{name} = {summary}", "", indent = depth * 2);

    if depth >= MAX_DEPTH {
        return;
    }
    if let Some(provider) = registry.provider(value) {
        for index in 0..provider.child_count() {
            if let Some(child) = provider.child_at(index) {
                render(registry, &child, depth + 1, out);
            }
        }
    } else if registry.family_of(value).is_none() {
        for index in 0..value.child_count() {
            if let Some(child) = value.child_at(index) {
                render(registry, &child, depth + 1, out);
            }
        }
    }
}
