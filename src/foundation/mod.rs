//! Core value types and the crate error type.

pub mod core;
pub mod error;
