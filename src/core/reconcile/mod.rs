//! Deduplication of dependent records

pub mod engine;

pub use engine::{pair_by_position, Reconciled, ReconciliationEngine, UniquenessQuery};
