//! Conversion between an offer's validity (days) and its deadline date.
//!
//! The creation timestamp anchors both directions once the offer is persisted. Before that,
//! `today` stands in so the values stay meaningful on an unsaved draft.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::validation::ValidationError;

/// Deadline date for `validity` days counted from the anchor, or from `today` without one.
pub fn deadline_from_validity(
    create_date: Option<NaiveDateTime>,
    validity: i32,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationError> {
    let offset = Duration::days(i64::from(validity));
    let deadline = match create_date {
        Some(anchor) => anchor.checked_add_signed(offset).map(|moment| moment.date()),
        None => today.checked_add_signed(offset),
    };

    deadline.ok_or(ValidationError::DeadlineOutOfRange { validity })
}

/// Whole days between the anchor date (or `today`) and `deadline`. May be negative.
pub fn validity_from_deadline(
    deadline: NaiveDate,
    create_date: Option<NaiveDateTime>,
    today: NaiveDate,
) -> i32 {
    let anchor = create_date.map_or(today, |moment| moment.date());
    let days = deadline.signed_duration_since(anchor).num_days();
    // Any two representable dates are well within i32 days of each other.
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}
