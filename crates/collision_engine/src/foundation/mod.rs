//! Foundation module - shared building blocks
//!
//! - Vector aliases, binary angles and scalar helpers
//! - Slot arenas and fixed-capacity pools
//! - Logging setup

pub mod math;
pub mod collections;
pub mod logging;
