//! Analysis modules.
//!
//! The aggregator produces region rollups and occupancy classes; the
//! views module derives the list, map and overview data.

pub mod aggregator;
pub mod views;

pub use aggregator::*;
pub use views::*;
