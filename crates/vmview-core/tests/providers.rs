//! Tests for the family adapters and the member locator

mod common;

use common::{fc_vector, libcxx_vector, place_tr_vector, scalars, tr_vector, write_ints, Scalars};
use vmview_core::inspect::TargetValue;
use vmview_core::locate::MemberLocator;
use vmview_core::providers::{
    Family, PairSource, PairedProvider, RegisterWrapperProvider, SyntheticChildren, TreeHeader, TreeIndexSummary,
    VectorProvider, EMPTY_TREE_SUMMARY,
};
use vmview_core::snapshot::{Field, Snapshot, SnapshotBuilder, SnapshotValue, TypeId};

fn updated(family: Family, value: SnapshotValue) -> Box<dyn SyntheticChildren<SnapshotValue>>
{
    let mut provider = family.provider(value, &MemberLocator::default()).unwrap();
    provider.update();
    provider
}

/// `psi::vm::small_string`, an inline text key, and a `tr_vector` of them
fn key_vector(b: &mut SnapshotBuilder, s: &Scalars) -> TypeId
{
    let key = b.text("psi::vm::small_string", 8);
    let key_ptr = b.pointer(key);
    b.record(
        "psi::vm::tr_vector<psi::vm::small_string, unsigned long>",
        vec![Field::named("p_array_", key_ptr, 0), Field::named("size_", s.size_t, 8)],
    )
}

/// `flat_map<small_string, int>` deriving from `flat_map_impl`, with
/// `storage_` holding a `paired_storage`
fn flat_map(b: &mut SnapshotBuilder, s: &Scalars) -> (TypeId, TypeId)
{
    let keys = key_vector(b, s);
    let values = tr_vector(b, s);
    let paired = b.record(
        "psi::vm::detail::paired_storage<psi::vm::small_string, int>",
        vec![Field::named("keys", keys, 0), Field::named("values", values, 16)],
    );
    let map_impl = b.record(
        "psi::vm::flat_map_impl<psi::vm::small_string, int>",
        vec![Field::named("storage_", paired, 0)],
    );
    let map = b.record("psi::vm::flat_map<psi::vm::small_string, int>", vec![Field::base(map_impl, 0)]);
    (map, paired)
}

fn place_keys(b: &mut SnapshotBuilder, address: u64, data: u64, keys: &[&str])
{
    b.write_u64(address, data).write_u64(address + 8, keys.len() as u64);
    for (slot, key) in (0u64..).zip(keys) {
        b.reserve(data + slot * 8, 8).write_str(data + slot * 8, key);
    }
}

#[test]
fn test_growable_vector_children_and_summary()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ty = tr_vector(&mut b, &s);
    place_tr_vector(&mut b, 0x1000, 0x8000, &[10, 20, 30]);
    let snapshot = b.build();

    let provider = updated(Family::TransactionalVector, snapshot.value("v", 0x1000, ty));
    assert_eq!(provider.child_count(), 3);
    assert_eq!(provider.summary(), "size=3");

    let last = provider.child_at(2).unwrap();
    assert_eq!(last.name().as_deref(), Some("[2]"));
    assert_eq!(last.value_text().as_deref(), Some("30"));
    assert!(provider.child_at(3).is_none());
    assert_eq!(provider.child_index("[1]"), Some(1));
    assert_eq!(provider.child_index("size_"), None);
}

#[test]
fn test_sorted_map_children_labelled_by_key()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let (map, _) = flat_map(&mut b, &s);
    place_keys(&mut b, 0x1000, 0x8000, &["a", "b"]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[100, 200]);
    let snapshot = b.build();

    let provider = updated(Family::FlatMap, snapshot.value("m", 0x1000, map));
    assert_eq!(provider.child_count(), 2);
    assert_eq!(provider.summary(), "size=2");

    let rendered: Vec<(Option<String>, Option<String>)> = (0..provider.child_count())
        .filter_map(|i| provider.child_at(i))
        .map(|child| (child.name(), child.value_text()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (Some("[a]".to_string()), Some("100".to_string())),
            (Some("[b]".to_string()), Some("200".to_string())),
        ]
    );
}

#[test]
fn test_paired_storage_direct_members()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let (_, paired) = flat_map(&mut b, &s);
    place_keys(&mut b, 0x1000, 0x8000, &["k"]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[-4]);
    let snapshot = b.build();

    let provider = updated(Family::PairedStorage, snapshot.value("p", 0x1000, paired));
    assert_eq!(provider.summary(), "size=1");
    let child = provider.child_at(0).unwrap();
    assert_eq!(child.name().as_deref(), Some("[k]"));
    assert_eq!(child.value_text().as_deref(), Some("-4"));
}

#[test]
fn test_label_falls_back_to_value_then_index()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ints = tr_vector(&mut b, &s);
    let paired = b.record(
        "psi::vm::detail::paired_storage<int, int>",
        vec![Field::named("keys", ints, 0), Field::named("values", ints, 16)],
    );
    place_tr_vector(&mut b, 0x1000, 0x8000, &[7]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[70]);
    let snapshot = b.build();

    let provider = updated(Family::PairedStorage, snapshot.value("p", 0x1000, paired));
    assert_eq!(provider.child_at(0).unwrap().name().as_deref(), Some("[7]"));
}

#[test]
fn test_label_falls_back_to_index_for_composite_keys()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let pair = b.record(
        "std::pair<int, int>",
        vec![Field::named("first", s.int, 0), Field::named("second", s.int, 4)],
    );
    let pair_ptr = b.pointer(pair);
    let keys = b.record(
        "psi::vm::tr_vector<std::pair<int, int>, unsigned long>",
        vec![Field::named("p_array_", pair_ptr, 0), Field::named("size_", s.size_t, 8)],
    );
    let values = tr_vector(&mut b, &s);
    let paired = b.record(
        "psi::vm::detail::paired_storage<std::pair<int, int>, int>",
        vec![Field::named("keys", keys, 0), Field::named("values", values, 16)],
    );
    b.write_u64(0x1000, 0x8000).write_u64(0x1008, 2);
    write_ints(&mut b, 0x8000, &[1, 2, 3, 4]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[10, 20]);
    let snapshot = b.build();

    let provider = updated(Family::PairedStorage, snapshot.value("p", 0x1000, paired));
    let labels: Vec<Option<String>> = (0..provider.child_count())
        .map(|i| provider.child_at(i).and_then(|child| child.name()))
        .collect();
    assert_eq!(labels, vec![Some("[0]".to_string()), Some("[1]".to_string())]);
    assert_eq!(provider.child_at(1).unwrap().value_text().as_deref(), Some("20"));
}

#[test]
fn test_flat_map_without_storage_member_uses_bare_runs()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ints = tr_vector(&mut b, &s);
    let map = b.record(
        "psi::vm::flat_multimap<int, int>",
        vec![Field::named("keys", ints, 0), Field::named("values", ints, 16)],
    );
    place_tr_vector(&mut b, 0x1000, 0x8000, &[1, 1]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[5, 6]);
    let snapshot = b.build();

    let provider = updated(Family::FlatMap, snapshot.value("m", 0x1000, map));
    assert_eq!(provider.child_count(), 2);
    assert_eq!(provider.child_at(1).unwrap().value_text().as_deref(), Some("6"));
}

#[test]
fn test_tree_index_with_null_header()
{
    let (snapshot, tree) = tree_fixture(0);
    let mut summary = TreeIndexSummary::new(snapshot.value("t", 0x1000, tree), MemberLocator::default());
    summary.update();

    assert_eq!(summary.header(), None);
    assert_eq!(summary.summary(), EMPTY_TREE_SUMMARY);
    assert_eq!(summary.summary(), "empty / uninitialized");
    assert!(Family::TreeIndex.provider(snapshot.value("t", 0x1000, tree), &MemberLocator::default()).is_none());
}

#[test]
fn test_tree_index_reads_header_through_base()
{
    let (snapshot, tree) = tree_fixture(0x8000);
    let value = snapshot.value("t", 0x1000, tree);

    assert_eq!(
        TreeHeader::read(&value, &MemberLocator::default()),
        Some(TreeHeader { size: 1234, depth: 4 })
    );
    assert_eq!(
        Family::TreeIndex.summarize(&value, &MemberLocator::default()),
        "size=1234, depth=4"
    );
}

#[test]
fn test_tree_index_with_dangling_header()
{
    let (snapshot, tree) = tree_fixture(0xdead_0000);
    let value = snapshot.value("t", 0x1000, tree);

    assert_eq!(TreeHeader::read(&value, &MemberLocator::default()), None);
    assert_eq!(Family::TreeIndex.summarize(&value, &MemberLocator::default()), EMPTY_TREE_SUMMARY);
}

#[test]
fn test_tree_index_without_header_members()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let no_handle = b.record("psi::vm::bptree_base", vec![Field::named("root_", s.size_t, 0)]);
    let no_ptr = b.record("psi::vm::mapped_object<header>", vec![Field::named("offset", s.size_t, 0)]);
    let no_ptr_tree = b.record("psi::vm::bp_tree_impl<int>", vec![Field::named("p_hdr_", no_ptr, 0)]);
    b.write_u64(0x1000, 0x8000);
    let snapshot = b.build();
    let locator = MemberLocator::default();

    for ty in [no_handle, no_ptr_tree] {
        let mut summary = TreeIndexSummary::new(snapshot.value("t", 0x1000, ty), locator.clone());
        summary.update();
        assert_eq!(summary.header(), None);
        assert_eq!(summary.summary(), EMPTY_TREE_SUMMARY);
    }
}

/// `bp_tree_impl<int>` deriving from `bptree_base`, header at `header`
fn tree_fixture(header: u64) -> (Snapshot, TypeId)
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let hdr = b.record(
        "psi::vm::bptree_base::header",
        vec![Field::named("size_", s.size_t, 0), Field::named("depth_", s.size_t, 8)],
    );
    let hdr_ptr = b.pointer(hdr);
    let handle = b.record("psi::vm::mapped_object<header>", vec![Field::named("ptr", hdr_ptr, 0)]);
    let base = b.record("psi::vm::bptree_base", vec![Field::named("p_hdr_", handle, 0)]);
    let tree = b.record("psi::vm::bp_tree_impl<int>", vec![Field::base(base, 0)]);
    b.write_u64(0x1000, header);
    b.write_u64(0x8000, 1234).write_u64(0x8008, 4);
    (b.build(), tree)
}

#[test]
fn test_fixed_capacity_vector_with_zero_size()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ty = fc_vector(&mut b, &s, 3);
    write_ints(&mut b, 0x1000, &[1, 2, 3]);
    b.write_u64(0x100c, 0);
    let snapshot = b.build();

    let provider = updated(Family::FixedCapacityVector, snapshot.value("v", 0x1000, ty));
    assert_eq!(provider.child_count(), 0);
    assert!(provider.child_at(0).is_none());
    assert_eq!(provider.summary(), "size=0");
}

#[test]
fn test_unresolvable_run_summarizes_as_empty()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let odd = b.record("my::deque<int>", vec![Field::named("blocks", s.int_ptr, 0)]);
    let set_impl = b.record("psi::vm::flat_set_impl<int>", vec![Field::named("storage_", odd, 0)]);
    b.write_u64(0x1000, 0x8000);
    let snapshot = b.build();

    let provider = updated(Family::FlatSet, snapshot.value("s", 0x1000, set_impl));
    assert_eq!(provider.child_count(), 0);
    assert_eq!(provider.summary(), "size=0");
}

#[test]
fn test_flat_set_finds_storage_in_base()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let storage = libcxx_vector(&mut b, &s);
    let set_impl = b.record("psi::vm::flat_set_impl<int>", vec![Field::named("storage_", storage, 0)]);
    let set = b.record("psi::vm::flat_set<int>", vec![Field::base(set_impl, 0)]);
    b.write_u64(0x1000, 0x8000).write_u64(0x1008, 0x8008).write_u64(0x1010, 0x8010);
    write_ints(&mut b, 0x8000, &[2, 3]);
    let snapshot = b.build();

    let provider = updated(Family::FlatSet, snapshot.value("s", 0x1000, set));
    assert_eq!(provider.summary(), "size=2");
    assert_eq!(provider.child_at(1).unwrap().value_text().as_deref(), Some("3"));
}

#[test]
fn test_mismatched_pair_counts_never_read_past_values()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ints = tr_vector(&mut b, &s);
    let paired = b.record(
        "psi::vm::detail::paired_storage<int, int>",
        vec![Field::named("keys", ints, 0), Field::named("values", ints, 16)],
    );
    place_tr_vector(&mut b, 0x1000, 0x8000, &[1, 2, 3]);
    place_tr_vector(&mut b, 0x1010, 0x9000, &[10]);
    let snapshot = b.build();

    let mut provider = PairedProvider::new(
        snapshot.value("p", 0x1000, paired),
        PairSource::Direct,
        MemberLocator::default(),
    );
    provider.update();

    assert_eq!(provider.keys().count(), 3);
    assert_eq!(provider.values().count(), 1);
    assert_eq!(provider.child_count(), 3);
    assert_eq!(provider.summary(), "size=3");
    assert!(provider.child_at(0).is_some());
    assert!(provider.child_at(1).is_none());
    assert!(provider.child_at(2).is_none());
}

#[test]
fn test_register_wrapper_is_transparent()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let pair = b.record(
        "std::pair<int, int>",
        vec![Field::named("first", s.int, 0), Field::named("second", s.int, 4)],
    );
    let wrapper = b.record("psi::vm::pass_in_reg<std::pair<int, int> >", vec![Field::named("value", pair, 0)]);
    write_ints(&mut b, 0x1000, &[3, 4]);
    let snapshot = b.build();

    let value = snapshot.value("w", 0x1000, wrapper);
    let inner = value.member("value").unwrap();
    let mut provider = RegisterWrapperProvider::new(value);
    provider.update();

    assert_eq!(provider.child_count(), inner.child_count());
    assert_eq!(provider.child_index("second"), inner.child_index("second"));
    assert_eq!(provider.child_index("second"), Some(1));
    assert_eq!(
        provider.child_at(1).and_then(|c| c.value_text()),
        inner.child_at(1).and_then(|c| c.value_text())
    );
    assert_eq!(provider.summary(), "");
}

#[test]
fn test_register_wrapper_summary_uses_inner_value()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let wrapper = b.record("psi::vm::pass_rv_in_reg<int>", vec![Field::named("value", s.int, 0)]);
    b.write_i32(0x1000, -12);
    let snapshot = b.build();

    let provider = updated(Family::RegisterWrapper, snapshot.value("w", 0x1000, wrapper));
    assert_eq!(provider.summary(), "-12");
    assert_eq!(provider.child_count(), 0);
}

#[test]
fn test_update_rereads_memory()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let ty = tr_vector(&mut b, &s);
    place_tr_vector(&mut b, 0x1000, 0x8000, &[1]);
    place_tr_vector(&mut b, 0x2000, 0x9000, &[1, 2, 3, 4]);
    let snapshot = b.build();

    let mut provider = VectorProvider::new(snapshot.value("v", 0x1000, ty));
    assert_eq!(provider.child_count(), 0);
    provider.update();
    assert_eq!(provider.child_count(), 1);
    provider.update();
    assert_eq!(provider.child_count(), 1);

    let other = updated(Family::TransactionalVector, snapshot.value("w", 0x2000, ty));
    assert_eq!(other.child_count(), 4);
}

#[test]
fn test_locator_searches_unnamed_and_library_sub_objects()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let leaf = b.record("psi::vm::detail::leaf", vec![Field::named("target_", s.int, 0)]);
    let anonymous = b.record("", vec![Field::base(leaf, 0)]);
    let foreign = b.record("other::mixin", vec![Field::named("hidden_", s.int, 4)]);
    let outer = b.record(
        "psi::vm::outer",
        vec![Field::unnamed(anonymous, 0), Field::base(foreign, 0)],
    );
    write_ints(&mut b, 0x1000, &[42, 43]);
    let snapshot = b.build();

    let value = snapshot.value("o", 0x1000, outer);
    let locator = MemberLocator::default();
    assert_eq!(locator.locate(&value, "target_").unwrap().unsigned_or(0), 42);
    assert!(locator.locate(&value, "hidden_").is_none());
    assert!(locator.locate(&value, "missing_").is_none());
}

#[test]
fn test_locator_returns_child_named_like_the_field()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let storage = b.record("storage_", vec![Field::named("size_", s.size_t, 0)]);
    let holder = b.record("other::holder", vec![Field::base(storage, 0)]);
    b.write_u64(0x1000, 9);
    let snapshot = b.build();

    let value = snapshot.value("h", 0x1000, holder);
    assert!(value.member("storage_").is_none());

    let found = MemberLocator::default().locate(&value, "storage_").unwrap();
    assert_eq!(found.name().as_deref(), Some("storage_"));
    assert_eq!(found.member("size_").unwrap().unsigned_or(0), 9);
}

#[test]
fn test_locator_respects_depth_limit()
{
    let mut b = SnapshotBuilder::new();
    let s = scalars(&mut b);
    let mut ty = b.record("psi::vm::level0", vec![Field::named("deep_", s.int, 0)]);
    for level in 1..=3 {
        ty = b.record(&format!("psi::vm::level{level}"), vec![Field::base(ty, 0)]);
    }
    write_ints(&mut b, 0x1000, &[5]);
    let snapshot = b.build();
    let value = snapshot.value("v", 0x1000, ty);

    assert!(MemberLocator::new("psi::vm::", 3).locate(&value, "deep_").is_some());
    assert!(MemberLocator::new("psi::vm::", 2).locate(&value, "deep_").is_none());
}
