//! Urgency classification
//!
//! Maps the nearest actionable deadline of a case to one of three tiers used
//! for sorting and visual priority:
//!
//! | days until deadline | tier      |
//! |---------------------|-----------|
//! | ≤ 2 (incl. overdue) | `urgent`  |
//! | 3..=5               | `warning` |
//! | > 5 or no deadline  | `normal`  |
//!
//! There is no separate "overdue" tier: a deadline in the past saturates to
//! `urgent`. Completed orders never contribute a deadline.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Order, Urgency};

/// Days at or below which a deadline is urgent
pub const URGENT_WITHIN_DAYS: i64 = 2;

/// Days at or below which a deadline is a warning
pub const WARNING_WITHIN_DAYS: i64 = 5;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// `ceil((deadline - now) / 1 day)`
///
/// A date deadline is taken as midnight UTC of that date, so with `now`
/// anywhere on today's date a deadline of today+2 yields 2.
pub fn days_until(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline_at = deadline.and_time(chrono::NaiveTime::MIN).and_utc();
    let millis = (deadline_at - now).num_milliseconds();

    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) != 0 {
        days + 1
    } else {
        days
    }
}

/// Tier for a day count
pub fn tier_for_days(days: i64) -> Urgency {
    if days <= URGENT_WITHIN_DAYS {
        Urgency::Urgent
    } else if days <= WARNING_WITHIN_DAYS {
        Urgency::Warning
    } else {
        Urgency::Normal
    }
}

/// Tier for a single optional deadline
pub fn classify_deadline(deadline: Option<NaiveDate>, now: DateTime<Utc>) -> Urgency {
    deadline
        .map(|d| tier_for_days(days_until(d, now)))
        .unwrap_or(Urgency::Normal)
}

/// Nearest deadline (smallest day count) among orders that are not completed
pub fn nearest_pending_deadline(orders: &[Order], now: DateTime<Utc>) -> Option<i64> {
    orders
        .iter()
        .filter(|order| !order.status.is_completed())
        .filter_map(|order| order.deadline)
        .map(|deadline| days_until(deadline, now))
        .min()
}

/// Classify a case from its orders
///
/// Total: an empty slice, orders without deadlines, or only completed orders
/// all yield [`Urgency::Normal`].
pub fn classify(orders: &[Order], now: DateTime<Utc>) -> Urgency {
    nearest_pending_deadline(orders, now)
        .map(tier_for_days)
        .unwrap_or(Urgency::Normal)
}
