//! List view projection: filter, search and sort over a borrowed order list.
//!
//! The projection is recomputed on demand and never written back.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => order.status == *status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Name,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {what} '{value}' (expected one of: {expected})")]
pub struct ParseViewError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for StatusFilter {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<OrderStatus>()
            .map(StatusFilter::Only)
            .map_err(|_| ParseViewError {
                what: "status filter",
                value: s.to_string(),
                expected: "all, pending, processing, completed, cancelled",
            })
    }
}

impl FromStr for SortKey {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "name" => Ok(SortKey::Name),
            "status" => Ok(SortKey::Status),
            _ => Err(ParseViewError {
                what: "sort key",
                value: s.to_string(),
                expected: "date, name, status",
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseViewError {
                what: "sort order",
                value: s.to_string(),
                expected: "asc, desc",
            }),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// UI-only list state: search text, status filter and sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: StatusFilter,
    pub search: String,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl ListQuery {
    /// Case-insensitive substring match on name, email and phone.
    /// An empty (or blank) search matches everything.
    pub fn matches_search(&self, order: &Order) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        order.name.to_lowercase().contains(&needle)
            || order.email.to_lowercase().contains(&needle)
            || order
                .phone
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&needle))
    }

    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        let mut out: Vec<&Order> = orders
            .iter()
            .filter(|o| self.status.matches(o) && self.matches_search(o))
            .collect();
        out.sort_by(|a, b| {
            let ord = compare(self.sort, a, b);
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        out
    }
}

fn compare(key: SortKey, a: &Order, b: &Order) -> Ordering {
    match key {
        SortKey::Date => a.created_at.cmp(&b.created_at),
        SortKey::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use crate::model::Plan;

    fn order(
        id: &str,
        name: &str,
        email: &str,
        phone: Option<&str>,
        status: OrderStatus,
        day: i64,
    ) -> Order {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        Order {
            id: id.into(),
            order_number: format!("PR-{id}"),
            created_at: created,
            updated_at: created,
            name: name.into(),
            email: email.into(),
            phone: phone.map(str::to_string),
            images: vec![],
            plan: Plan::default(),
            payment_fee: 0.0,
            real_profit: 0.0,
            delivery_methods: vec![],
            image_count: None,
            status,
            notes: None,
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(
                "1",
                "Ana Souza",
                "ana@mail.com",
                Some("+55 11 90000-1111"),
                OrderStatus::Pending,
                3,
            ),
            order("2", "bruno Lima", "bruno@work.io", None, OrderStatus::Completed, 1),
            order("3", "Carla Dias", "carla@mail.com", None, OrderStatus::Processing, 2),
            order("4", "Diego", "diego@ANA.org", None, OrderStatus::Completed, 0),
        ]
    }

    fn ids(v: &[&Order]) -> Vec<String> {
        v.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn default_query_is_all_newest_first() {
        let orders = sample();
        let out = ListQuery::default().apply(&orders);
        assert_eq!(ids(&out), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn status_filter_keeps_only_matching() {
        let orders = sample();
        let q = ListQuery {
            status: StatusFilter::Only(OrderStatus::Completed),
            ..Default::default()
        };
        let out = q.apply(&orders);
        assert!(out.iter().all(|o| o.status == OrderStatus::Completed));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive_over_name_email_phone() {
        let orders = sample();
        let q = ListQuery {
            search: "ANA".into(),
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&orders)), vec!["1", "4"]);

        let q = ListQuery {
            search: "90000".into(),
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&orders)), vec!["1"]);

        let q = ListQuery {
            search: "   ".into(),
            ..Default::default()
        };
        assert_eq!(q.apply(&orders).len(), orders.len());
    }

    #[test]
    fn sort_by_name_ignores_case() {
        let orders = sample();
        let q = ListQuery {
            sort: SortKey::Name,
            order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&orders)), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn sort_by_status_descending_is_stable() {
        let orders = sample();
        let q = ListQuery {
            sort: SortKey::Status,
            order: SortOrder::Desc,
            ..Default::default()
        };
        // processing > pending > completed(2, 4 in input order)
        assert_eq!(ids(&q.apply(&orders)), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn projection_does_not_touch_source() {
        let orders = sample();
        let before = orders.clone();
        let _ = ListQuery {
            sort: SortKey::Name,
            ..Default::default()
        }
        .apply(&orders);
        assert_eq!(orders, before);
    }

    #[test]
    fn parse_filters() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "cancelled".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Cancelled)
        );
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!("Name".parse::<SortKey>().unwrap(), SortKey::Name);
        assert!("up".parse::<SortOrder>().is_err());
    }
}
