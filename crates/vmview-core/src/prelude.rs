//! Common module for library exports

pub use crate::config::ViewConfig;
pub use crate::error::{VmViewError, VmViewResult};
pub use crate::inspect::{TargetType, TargetValue};
pub use crate::layout::{ContiguousRun, Encoding};
pub use crate::locate::MemberLocator;
pub use crate::providers::{Family, SyntheticChildren};
pub use crate::registry::{Binding, Registry, TypePattern};
pub use crate::snapshot::{Field, Snapshot, SnapshotBuilder, SnapshotValue};
pub use crate::types::Address;
