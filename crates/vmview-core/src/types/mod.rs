//! # Types
//!
//! Plain value types shared across the engine.

pub mod address;

pub use address::Address;
