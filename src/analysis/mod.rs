//! Statistics derived from the diagnosis history.

pub mod aggregator;

pub use aggregator::*;
