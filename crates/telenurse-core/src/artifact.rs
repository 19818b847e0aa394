//! Artifact naming conventions.
//!
//! Pure string functions with no storage dependency. These define the
//! canonical name of a persisted assessment and where it lives in an
//! object store.

/// Key prefix for assessments in an object store.
pub const ASSESSMENTS_PREFIX: &str = "assessment_records/";

const NAME_PREFIX: &str = "patient_";
const NAME_SEPARATOR: &str = "_assessment_";
const NAME_SUFFIX: &str = ".json";

/// The parts of a well-formed artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName<'a> {
    pub patient_id: &'a str,
    /// Fixed-width UTC stamp; sorts chronologically as a string.
    pub stamp: &'a str,
}

/// Fixed-width, filename-safe rendering of a timestamp:
/// `YYYY-MM-DDTHH-MM-SS.nnnnnnnnnZ`.
pub fn stamp(timestamp: jiff::Timestamp) -> String {
    format!(
        "{}.{:09}Z",
        timestamp.strftime("%Y-%m-%dT%H-%M-%S"),
        timestamp.subsec_nanosecond()
    )
}

/// Name of the artifact holding a patient's assessment taken at `timestamp`.
pub fn assessment_name(patient_id: &str, timestamp: jiff::Timestamp) -> String {
    format!(
        "{NAME_PREFIX}{patient_id}{NAME_SEPARATOR}{}{NAME_SUFFIX}",
        stamp(timestamp)
    )
}

/// Object key of an artifact under the assessments prefix.
pub fn assessment_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

/// Split an artifact name into its parts.
///
/// Returns `None` for anything that is not a well-formed name, including
/// names with path separators.
pub fn parse_assessment_name(name: &str) -> Option<ArtifactName<'_>> {
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return None;
    }
    let body = name.strip_prefix(NAME_PREFIX)?.strip_suffix(NAME_SUFFIX)?;
    let (patient_id, stamp) = body.rsplit_once(NAME_SEPARATOR)?;
    if patient_id.is_empty() || !is_stamp(stamp) {
        return None;
    }
    Some(ArtifactName { patient_id, stamp })
}

fn is_stamp(s: &str) -> bool {
    // 2025-01-31T09-15-00.123456789Z
    s.len() == 30
        && s.ends_with('Z')
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | 'T' | '.' | 'Z'))
}

/// Sort artifact names newest first; ties broken by name.
/// Names that do not parse are dropped.
pub fn newest_first<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut names: Vec<String> = names
        .into_iter()
        .filter(|n| parse_assessment_name(n).is_some())
        .collect();
    names.sort_by(|a, b| {
        let (sa, sb) = (stamp_of(a), stamp_of(b));
        sb.cmp(sa).then_with(|| a.cmp(b))
    });
    names
}

fn stamp_of(name: &str) -> &str {
    parse_assessment_name(name).map(|n| n.stamp).unwrap_or_default()
}
