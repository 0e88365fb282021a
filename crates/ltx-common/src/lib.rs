//! Common utilities for LTX.
//!
//! This crate provides foundational types used across the LTX crates:
//!
//! - [`BinaryReader`] - Zero-copy struct reading from byte slices
//! - [`Error`] - Errors raised while reading binary data

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
