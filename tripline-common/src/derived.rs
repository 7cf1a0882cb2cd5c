//! Display fields computed from stored data on every read. Nothing here is persisted.

use crate::model::{journey::Journey, like::Like};
use serde_json::Value;

/// `start_date` alone for single-day journeys, `"{start} → {end}"` otherwise.
#[must_use]
pub fn date_range(journey: &Journey) -> String {
    if journey.start_date == journey.end_date {
        journey.start_date.clone()
    } else {
        format!("{} → {}", journey.start_date, journey.end_date)
    }
}

/// Number of waypoints across all days of a journey.
///
/// Days without a `waypoints` entry count as zero. Any other shape than an array of day objects
/// with array-valued waypoints makes the whole total zero.
#[must_use]
pub fn total_waypoints(journey: &Journey) -> usize {
    let Value::Array(days) = &journey.days else {
        return 0;
    };

    days.iter()
        .try_fold(0, |total, day| {
            let Value::Object(day) = day else {
                return None;
            };
            match day.get("waypoints") {
                None | Some(Value::Null) => Some(total),
                Some(Value::Array(waypoints)) => Some(total + waypoints.len()),
                Some(_) => None,
            }
        })
        .unwrap_or(0)
}

#[must_use]
pub fn like_count(likes: &[Like], post_id: &str) -> usize {
    likes
        .iter()
        .filter(|like| like.post_id.as_str() == post_id)
        .count()
}

#[must_use]
pub fn liked_by(likes: &[Like], post_id: &str, user_id: &str) -> bool {
    likes.iter().any(|like| like.is_by(post_id, user_id))
}

#[must_use]
pub fn global_like_count(likes: &[Like]) -> usize {
    likes.len()
}
