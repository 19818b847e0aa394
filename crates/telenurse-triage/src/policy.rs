use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use telenurse_core::models::assessment::NotificationLevel;
use telenurse_core::models::symptom::SymptomRating;

/// Prefix of the reason attached to assessments that need a clinician to
/// read the transcript because extraction failed.
pub const MANUAL_REVIEW_PREFIX: &str = "needs manual review";

/// The escalation decision for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub flag_for_oncologist: bool,
    pub flag_reason: Option<String>,
}

/// Level a single rating qualifies for on its own.
fn rating_level(rating: &SymptomRating) -> NotificationLevel {
    let frequency = rating.frequency;
    if rating.severity >= 4 || frequency.is_some_and(|f| f >= 4) {
        NotificationLevel::Red
    } else if rating.severity == 3 && frequency.is_none_or(|f| f == 3) {
        NotificationLevel::Amber
    } else {
        NotificationLevel::None
    }
}

/// Evaluate the notification level for a set of ratings.
///
/// - `red` if any symptom has severity ≥ 4, or frequency ≥ 4.
/// - `amber` if none is red and any symptom has severity 3 with frequency
///   absent or 3.
/// - `none` otherwise.
///
/// The reason lists every symptom that triggered the decided level, in key
/// order.
pub fn evaluate(symptoms: &BTreeMap<String, SymptomRating>) -> Notification {
    let level = symptoms
        .values()
        .map(rating_level)
        .max()
        .unwrap_or_default();

    if level == NotificationLevel::None {
        return Notification {
            level,
            flag_for_oncologist: false,
            flag_reason: None,
        };
    }

    let triggers: Vec<String> = symptoms
        .iter()
        .filter(|(_, rating)| rating_level(rating) == level)
        .map(|(key, rating)| describe(key, rating))
        .collect();

    let title = match level {
        NotificationLevel::Red => "Red",
        _ => "Amber",
    };

    Notification {
        level,
        flag_for_oncologist: true,
        flag_reason: Some(format!("{title} escalation: {}", triggers.join("; "))),
    }
}

/// Escalation for an assessment whose extraction failed.
///
/// Whatever ratings did validate are still evaluated; the result is raised
/// to at least `amber` and always flagged so a clinician reviews the
/// transcript.
pub fn manual_review(partial: &BTreeMap<String, SymptomRating>, error: &str) -> Notification {
    let known = evaluate(partial);
    let mut reason = format!("{MANUAL_REVIEW_PREFIX}: {error}");
    if let Some(known_reason) = &known.flag_reason {
        reason.push_str(" | ");
        reason.push_str(known_reason);
    }

    Notification {
        level: known.level.max(NotificationLevel::Amber),
        flag_for_oncologist: true,
        flag_reason: Some(reason),
    }
}

fn describe(key: &str, rating: &SymptomRating) -> String {
    let mut out = format!("{key} (severity {}", rating.severity);
    if let Some(frequency) = rating.frequency {
        let _ = write!(out, ", frequency {frequency}");
    }
    out.push(')');
    out
}
