//! Shared types, adapter traits, and core utilities for the Canopy permission engine.
//!
//! This crate contains the foundational types that are shared between the
//! resolver crate and all adapter implementations. Keeping them separate lets
//! storage adapters compile without pulling in the resolver itself.

pub mod cache_adapter;
pub mod error;
pub mod perm_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
