//! B+tree index summaries (`bptree_base`, `bp_tree_impl`).
//!
//! The tree keeps its bookkeeping in a header reached through `p_hdr_.ptr`.
//! Only the header is read; nodes are never walked, so the family has a
//! summary and no children.

use tracing::debug;

use crate::inspect::TargetValue;
use crate::locate::MemberLocator;

/// Summary shown when the header pointer is missing, null or dangling
pub const EMPTY_TREE_SUMMARY: &str = "empty / uninitialized";

/// Counters read from the tree header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHeader
{
    /// Number of stored entries (`size_`)
    pub size: u64,
    /// Number of levels (`depth_`)
    pub depth: u64,
}

impl TreeHeader
{
    /// Follow `p_hdr_.ptr` once and read the counters
    ///
    /// Returns `None` if the handle or the `ptr` member is missing, or the
    /// pointer is null or points at unreadable memory.
    pub fn read<V: TargetValue>(value: &V, locator: &MemberLocator) -> Option<Self>
    {
        let handle = locator.locate(value, "p_hdr_")?;
        let ptr = handle.member("ptr").and_then(TargetValue::into_valid)?;
        if ptr.unsigned_or(0) == 0 {
            return None;
        }
        let header = ptr.dereference().and_then(TargetValue::into_valid)?;
        let counter = |name: &str| header.member(name).map_or(0, |field| field.unsigned_or(0));
        Some(Self {
            size: counter("size_"),
            depth: counter("depth_"),
        })
    }
}

/// Summary-only view of a B+tree
#[derive(Debug, Clone)]
pub struct TreeIndexSummary<V: TargetValue>
{
    value: V,
    locator: MemberLocator,
    header: Option<TreeHeader>,
}

impl<V: TargetValue> TreeIndexSummary<V>
{
    pub fn new(value: V, locator: MemberLocator) -> Self
    {
        Self {
            value,
            locator,
            header: None,
        }
    }

    /// Re-read the header
    pub fn update(&mut self)
    {
        self.header = TreeHeader::read(&self.value, &self.locator);
        debug!(header = ?self.header, "tree index updated");
    }

    /// Header read by the last `update`
    pub fn header(&self) -> Option<TreeHeader>
    {
        self.header
    }

    /// `size=<n>, depth=<d>`, or [`EMPTY_TREE_SUMMARY`]
    pub fn summary(&self) -> String
    {
        match self.header {
            Some(TreeHeader { size, depth }) => format!("size={size}, depth={depth}"),
            None => EMPTY_TREE_SUMMARY.to_string(),
        }
    }
}
