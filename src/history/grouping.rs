//! Client-side filtering and relative-time bucketing of history items
//!
//! Buckets are computed from `now` on every call and never stored, so labels
//! cannot go stale.

use chrono::{DateTime, Utc};

use super::recorder::HistoryItem;

/// Items sharing one relative-time label
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryGroup {
    pub label: String,
    pub items: Vec<HistoryItem>,
}

/// Relative label for an item created at `created_at`
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);
    if age.num_minutes() < 60 {
        return "Just now".to_string();
    }

    let hours = age.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }
    if hours < 48 {
        return "Yesterday".to_string();
    }
    plural(hours / 24, "day")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Partitions items into labelled buckets, in order of first appearance
pub fn group(items: &[HistoryItem], now: DateTime<Utc>) -> Vec<HistoryGroup> {
    let mut groups: Vec<HistoryGroup> = Vec::new();
    for item in items {
        let label = age_label(item.created_at, now);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.items.push(item.clone()),
            None => groups.push(HistoryGroup {
                label,
                items: vec![item.clone()],
            }),
        }
    }
    groups
}

/// Text and favorites filter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFilter {
    pub query: String,
    pub favorites_only: bool,
}

impl HistoryFilter {
    pub fn matches(&self, item: &HistoryItem) -> bool {
        if self.favorites_only && !item.favorite {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        query.is_empty()
            || item.url.to_lowercase().contains(&query)
            || item.method.to_lowercase().contains(&query)
    }

    pub fn apply(&self, items: &[HistoryItem]) -> Vec<HistoryItem> {
        items.iter().filter(|i| self.matches(i)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::HistoryId;
    use chrono::{Duration, TimeZone};

    fn item(id: &str, created_at: DateTime<Utc>) -> HistoryItem {
        HistoryItem {
            id: HistoryId::from(id),
            method: "GET".into(),
            url: format!("https://{}.example.com", id),
            created_at,
            favorite: false,
        }
    }

    #[test]
    fn test_buckets_for_fixed_now() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let items = vec![
            item("a", now - Duration::minutes(10)),
            item("b", now - Duration::hours(5)),
            item("c", now - Duration::hours(30)),
            item("d", now - Duration::days(4)),
        ];

        let labels: Vec<String> = group(&items, now).into_iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["Just now", "5 hours ago", "Yesterday", "4 days ago"]);
    }

    #[test]
    fn test_singular_and_boundary_labels() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(age_label(now - Duration::minutes(59), now), "Just now");
        assert_eq!(age_label(now - Duration::minutes(60), now), "1 hour ago");
        assert_eq!(age_label(now - Duration::hours(24), now), "Yesterday");
        assert_eq!(age_label(now - Duration::hours(48), now), "2 days ago");
        assert_eq!(age_label(now + Duration::minutes(5), now), "Just now");
    }

    #[test]
    fn test_same_bucket_collects_items() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let items = vec![
            item("a", now - Duration::minutes(1)),
            item("b", now - Duration::minutes(2)),
        ];
        let groups = group(&items, now);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);
    }

    #[test]
    fn test_filter_by_query_and_favorites() {
        let now = Utc::now();
        let mut starred = item("orders", now);
        starred.favorite = true;
        let items = vec![starred, item("users", now)];

        let by_text = HistoryFilter {
            query: "USERS".into(),
            favorites_only: false,
        };
        assert_eq!(by_text.apply(&items).len(), 1);
        assert_eq!(by_text.apply(&items)[0].id, HistoryId::from("users"));

        let favorites = HistoryFilter {
            query: String::new(),
            favorites_only: true,
        };
        assert_eq!(favorites.apply(&items)[0].id, HistoryId::from("orders"));
    }
}
