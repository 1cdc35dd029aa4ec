//! Domain rules: urgency tiers and the order status gate
//!
//! Pure functions over [`crate::models`]. No I/O and no knowledge of the
//! calling user; "now" is always passed in.

pub mod transition;
pub mod urgency;

pub use transition::{StatusChange, TransitionPlan};
pub use urgency::classify;
