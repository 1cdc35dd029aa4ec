//! Domain records: cases, orders and user profiles
//!
//! Plain data. Urgency and status rules live in [`crate::rules`].

mod case;
mod order;
mod profile;
mod status;

pub use case::{Case, NewCase};
pub use order::{NewOrder, Order, OrderExtraction};
pub use profile::{non_blank, parse_practice_areas, Profile, ProfileUpdate};
pub use status::{OrderStatus, Urgency};
