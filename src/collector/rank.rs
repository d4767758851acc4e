//! Deduplication and recency ordering of extracted events.
use super::{Attributes, MetricEvent};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Keep the first of each `(timestamp, session, name, attributes)` tuple,
/// order newest first, and keep at most `limit` events.
///
/// Events whose timestamp cannot be parsed sort after all others and keep
/// their relative order.
pub fn dedupe_and_rank(events: Vec<MetricEvent>, limit: usize) -> Vec<MetricEvent> {
    let mut seen: HashSet<(String, String, String, Attributes)> = HashSet::new();
    let mut ranked: Vec<_> = events
        .into_iter()
        .filter(|e| {
            seen.insert((
                e.timestamp.clone(),
                e.session_id.clone(),
                e.name.clone(),
                e.attributes.clone(),
            ))
        })
        .map(|e| (e.parsed_timestamp(), e))
        .collect();

    // Stable, so ties keep input order.
    ranked.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ranked.into_iter().take(limit).map(|(_, e)| e).collect()
}
