//! Shared value types.

pub mod collections;
pub mod sensitivity;
