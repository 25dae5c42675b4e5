//! Shared storage helpers for the cont contract suite.
//!
//! This crate provides:
//! - [`iterable_map`]: an insertion-ordered `Address → u32` map in persistent
//!   storage with O(1) lookup, insert and swap-remove.
//! - [`ttl`]: the TTL policy applied to every persistent key.

#![no_std]

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod iterable_map;
pub mod ttl;

pub use iterable_map::IterableMap;
