//! Domain model for cross-type project item aggregation.
//!
//! # Responsibility
//! - Define projects, their kind tag and the items they own.
//! - Define the per-day aggregation record and the presentation records
//!   that change signals are computed over.
//!
//! # Invariants
//! - Every project and item is identified by a stable store-assigned id.
//! - Item ids increase with creation order.

pub mod bucket;
pub mod item;
pub mod presentation;
pub mod project;
