//! Dashboard statistics and case filtering
//!
//! Pure, recomputed on every call, no caching. Output order always follows
//! input order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::models::{Case, Order, Urgency};
use crate::rules::urgency;

/// Summary counters shown above the case list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_cases: usize,
    /// Orders across all cases with status != completed
    pub pending_orders: usize,
    pub completed_orders: usize,
    /// Cases whose urgency is `urgent`
    pub urgent_cases: usize,
}

/// Compute dashboard statistics in O(total orders)
pub fn compute_stats(cases: &[Case]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_cases: cases.len(),
        ..Default::default()
    };

    for case in cases {
        if case.urgency == Urgency::Urgent {
            stats.urgent_cases += 1;
        }
        let counts = order_counts(&case.orders);
        stats.pending_orders += counts.pending;
        stats.completed_orders += counts.completed;
    }

    stats
}

/// Pending/completed split for one case card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderCounts {
    pub pending: usize,
    pub completed: usize,
}

pub fn order_counts(orders: &[Order]) -> OrderCounts {
    let completed = orders.iter().filter(|o| o.status.is_completed()).count();
    OrderCounts {
        pending: orders.len() - completed,
        completed,
    }
}

/// Status filter selected on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// `case.urgency == urgent`
    Urgent,
    /// At least one order not completed
    Pending,
    /// Every order completed; a case with no orders matches vacuously
    Completed,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Urgent => "urgent",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }

    pub fn matches(&self, case: &Case) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Urgent => case.urgency == Urgency::Urgent,
            StatusFilter::Pending => case.orders.iter().any(|o| !o.status.is_completed()),
            StatusFilter::Completed => case.orders.iter().all(|o| o.status.is_completed()),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "urgent" => Ok(StatusFilter::Urgent),
            "pending" => Ok(StatusFilter::Pending),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(ValidationError::InvalidValue {
                field: "status filter",
                value: other.to_string(),
            }),
        }
    }
}

/// Case-insensitive substring match over number, parties and court
///
/// An empty or whitespace-only query matches every case. Otherwise the query
/// is matched as typed, surrounding spaces included.
pub fn matches_query(case: &Case, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let needle = query.to_lowercase();

    [
        &case.case_number,
        &case.petitioner,
        &case.respondent,
        &case.court_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Apply search AND status filter, preserving input order
pub fn filter_cases(cases: &[Case], query: &str, status_filter: StatusFilter) -> Vec<Case> {
    cases
        .iter()
        .filter(|case| matches_query(case, query) && status_filter.matches(case))
        .cloned()
        .collect()
}

/// Replace every case's urgency with the tier derived from its orders
pub fn refresh_urgency(cases: &mut [Case], now: DateTime<Utc>) {
    for case in cases {
        case.urgency = urgency::classify(&case.orders, now);
    }
}

/// Orders newest first (by order date, then upload time) for the timeline
pub fn sorted_orders(orders: &[Order]) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    sorted.sort_by(|a, b| {
        b.order_date
            .cmp(&a.order_date)
            .then_with(|| b.uploaded_at.cmp(&a.uploaded_at))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::{Duration, NaiveDate, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 26, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(order_date: NaiveDate, deadline: Option<NaiveDate>, status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            case_id: Uuid::nil(),
            user_id: Uuid::nil(),
            order_date,
            uploaded_at: now(),
            file_name: "order.pdf".to_string(),
            file_url: "/mock-files/order.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            court_order_file_name: None,
            court_order_file_url: None,
            case_status_file_name: None,
            case_status_file_url: None,
            thumbnail_url: None,
            deadline,
            summary: None,
            action_required: None,
            status,
            completion_date: None,
            completion_document_url: None,
            extracted_data: None,
            updated_at: now(),
        }
    }

    fn case(number: &str, petitioner: &str, respondent: &str, court: &str, urgency: Urgency, orders: Vec<Order>) -> Case {
        Case {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            case_number: number.to_string(),
            petitioner: petitioner.to_string(),
            respondent: respondent.to_string(),
            court_name: court.to_string(),
            case_type: None,
            case_summary: None,
            filing_date: None,
            latest_order_date: date(2024, 9, 26),
            next_hearing_date: None,
            urgency,
            orders,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn sample_cases() -> Vec<Case> {
        vec![
            case(
                "Writ A: 2024/567",
                "Raj Kumar Sharma",
                "State of U.P. and others",
                "Court No. 15",
                Urgency::Urgent,
                vec![order(date(2024, 9, 26), Some(date(2024, 9, 28)), OrderStatus::Pending)],
            ),
            case(
                "Writ B: 2024/892",
                "Priya Singh",
                "Municipal Corporation and others",
                "Court No. 7",
                Urgency::Warning,
                vec![order(date(2024, 9, 25), Some(date(2024, 10, 23)), OrderStatus::InProgress)],
            ),
            case(
                "Civil: 2024/789",
                "ABC Private Ltd",
                "XYZ Corporation and others",
                "Court No. 9",
                Urgency::Normal,
                vec![
                    order(date(2024, 9, 28), None, OrderStatus::Completed),
                    order(date(2024, 9, 10), None, OrderStatus::Completed),
                ],
            ),
            case(
                "PIL: 2024/234",
                "Citizens Welfare Association",
                "State of U.P. and others",
                "Court No. 3",
                Urgency::Normal,
                vec![
                    order(date(2024, 9, 20), Some(date(2024, 10, 11)), OrderStatus::Pending),
                    order(date(2024, 8, 15), None, OrderStatus::Completed),
                ],
            ),
        ]
    }

    #[test]
    fn test_stats_counts() {
        let stats = compute_stats(&sample_cases());
        assert_eq!(
            stats,
            DashboardStats {
                total_cases: 4,
                pending_orders: 3,
                completed_orders: 3,
                urgent_cases: 1,
            }
        );
    }

    #[test]
    fn test_stats_pending_plus_completed_is_total() {
        let mut cases = sample_cases();
        cases.push(case("Empty", "", "", "", Urgency::Normal, vec![]));
        let stats = compute_stats(&cases);
        let total: usize = cases.iter().map(|c| c.orders.len()).sum();
        assert_eq!(stats.pending_orders + stats.completed_orders, total);
    }

    #[test]
    fn test_stats_empty_input() {
        assert_eq!(compute_stats(&[]), DashboardStats::default());
    }

    #[test]
    fn test_filter_identity() {
        let cases = sample_cases();
        assert_eq!(filter_cases(&cases, "", StatusFilter::All), cases);
        assert_eq!(filter_cases(&cases, "   ", StatusFilter::All), cases);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let cases = sample_cases();
        let found = filter_cases(&cases, "sharma", StatusFilter::All);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].petitioner, "Raj Kumar Sharma");

        let found = filter_cases(&cases, "STATE OF U.P.", StatusFilter::All);
        assert_eq!(found.len(), 2);

        let found = filter_cases(&cases, "court no. 9", StatusFilter::All);
        assert_eq!(found[0].case_number, "Civil: 2024/789");

        let found = filter_cases(&cases, "2024/892", StatusFilter::All);
        assert_eq!(found[0].petitioner, "Priya Singh");
    }

    #[test]
    fn test_search_matches_query_as_typed() {
        let cases = sample_cases();
        assert_eq!(filter_cases(&cases, "priya ", StatusFilter::All).len(), 1);
        // Surrounding spaces are part of the needle
        assert!(filter_cases(&cases, "singh ", StatusFilter::All).is_empty());
        assert!(filter_cases(&cases, " priya", StatusFilter::All).is_empty());
        assert_eq!(filter_cases(&cases, "   ", StatusFilter::All).len(), cases.len());
    }

    #[test]
    fn test_status_filter_urgent() {
        let found = filter_cases(&sample_cases(), "", StatusFilter::Urgent);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].case_number, "Writ A: 2024/567");
    }

    #[test]
    fn test_status_filter_pending_uses_some() {
        let found = filter_cases(&sample_cases(), "", StatusFilter::Pending);
        let numbers: Vec<_> = found.iter().map(|c| c.case_number.as_str()).collect();
        assert_eq!(numbers, vec!["Writ A: 2024/567", "Writ B: 2024/892", "PIL: 2024/234"]);
    }

    #[test]
    fn test_status_filter_completed_uses_every() {
        let found = filter_cases(&sample_cases(), "", StatusFilter::Completed);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].case_number, "Civil: 2024/789");
    }

    #[test]
    fn test_completed_filter_includes_case_without_orders() {
        let empty = case("WP/1/2025", "A", "B", "C", Urgency::Normal, vec![]);
        let found = filter_cases(&[empty.clone()], "", StatusFilter::Completed);
        assert_eq!(found, vec![empty.clone()]);

        // ...but it is never "pending"
        assert!(filter_cases(&[empty], "", StatusFilter::Pending).is_empty());
    }

    #[test]
    fn test_filters_compose_with_and() {
        let cases = sample_cases();
        let found = filter_cases(&cases, "state of u.p.", StatusFilter::Urgent);
        assert_eq!(found.len(), 1);
        assert!(filter_cases(&cases, "priya", StatusFilter::Completed).is_empty());
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("pending".parse::<StatusFilter>(), Ok(StatusFilter::Pending));
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert!("overdue".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_refresh_urgency_derives_from_orders() {
        let mut cases = vec![case(
            "Stale",
            "",
            "",
            "",
            Urgency::Normal,
            vec![order(date(2024, 9, 20), Some(now().date_naive() + Duration::days(2)), OrderStatus::Pending)],
        )];
        refresh_urgency(&mut cases, now());
        assert_eq!(cases[0].urgency, Urgency::Urgent);

        cases[0].orders[0].status = OrderStatus::Completed;
        refresh_urgency(&mut cases, now());
        assert_eq!(cases[0].urgency, Urgency::Normal);
    }

    #[test]
    fn test_sorted_orders_newest_first() {
        let orders = vec![
            order(date(2024, 8, 15), None, OrderStatus::Completed),
            order(date(2024, 9, 20), None, OrderStatus::Pending),
        ];
        let sorted = sorted_orders(&orders);
        assert_eq!(sorted[0].order_date, date(2024, 9, 20));
        assert_eq!(sorted[1].order_date, date(2024, 8, 15));
    }

    #[test]
    fn test_order_counts() {
        let counts = order_counts(&sample_cases()[3].orders);
        assert_eq!(counts, OrderCounts { pending: 1, completed: 1 });
    }
}
