//! # vmview-core
//!
//! Debugger-side presentation of `psi::vm` containers.
//!
//! A debugger shows a container as raw members by default: a pointer and a
//! counter, or several levels of standard-library plumbing. This crate turns
//! such values into a one-line summary and a list of element children:
//!
//! - [`layout`]: resolves any supported contiguous run (library vectors and
//!   the three common standard-library vector layouts) to base, element type
//!   and count
//! - [`locate`]: finds a member that may live in a base or unnamed
//!   sub-object
//! - [`providers`]: per-family adapters (vectors, flat sets, flat maps and
//!   paired storage, B+tree headers, register wrappers)
//! - [`registry`]: which type names go to which family
//!
//! ## Host contract
//!
//! The engine never talks to a debugger directly. It is written against the
//! [`TargetValue`] and [`TargetType`] traits, and a host adapts its value API
//! to them. The [`snapshot`] module is one such host, backed by a frozen
//! memory image.
//!
//! ## Failure model
//!
//! Reading a live process is best-effort. A missing member, a null pointer or
//! an unreadable address never aborts presentation: the container degrades to
//! zero elements and an empty or `size=0` summary. [`VmViewError`] is reserved
//! for configuration and host-side failures.

pub mod config;
pub mod error;
pub mod inspect;
pub mod label;
pub mod layout;
pub mod locate;
pub mod prelude;
pub mod providers;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use config::ViewConfig;
pub use error::{VmViewError, VmViewResult};
pub use inspect::{TargetType, TargetValue};
pub use layout::{ContiguousRun, Encoding};
pub use locate::MemberLocator;
pub use providers::{Family, SyntheticChildren};
pub use registry::{Binding, Registry, TypePattern};
