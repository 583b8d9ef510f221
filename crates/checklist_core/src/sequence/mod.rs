//! Ordered sequence management.
//!
//! # Responsibility
//! - Compute reorders as pure transformations (`reorder`).
//! - Define the backing-store contract and failure taxonomy (`store`).
//! - Reconcile local order with the store under partial failure
//!   (`coordinator`, `retry`).
//!
//! # Invariants
//! - Display order is ascending `position`.
//! - Mutations of one sequence never interleave.

pub mod coordinator;
pub mod reorder;
pub mod retry;
pub mod store;
