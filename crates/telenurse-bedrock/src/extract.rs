//! Structured symptom extraction from a finished interview.
//!
//! The model is asked for a single JSON object describing every symptom it
//! rated. The response is validated entry by entry: entries that pass are
//! kept even when others fail, so a partially usable answer is never thrown
//! away.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use telenurse_core::models::assessment::Language;
use telenurse_core::models::message::Transcript;
use telenurse_core::models::symptom::{SymptomKind, SymptomRating, checked_rating, symptom_key};

use crate::chat::ChatMessage;
use crate::gateway::{CompletionMode, CompletionRequest};
use crate::prompt::InterviewContext;

pub const EXTRACTION_INSTRUCTION: &str = "\
You are recording a structured symptom assessment from a finished patient interview. \
Rate only the symptoms the patient discussed, using the scales in the interview instructions below. \
Respond with a single JSON object and nothing else, in this shape:
{\"symptoms\": [{\"symptom\": \"fatigue|appetite|nausea|cough|discomfort\", \
\"severity_rating\": 1-5, \"frequency_rating\": 1-5 or null, \"location\": string or null, \
\"key_indicators\": [\"exact patient quote\"], \"additional_notes\": string or null}], \
\"mood_assessment\": string, \"conversation_notes\": string}
Rules:
- severity_rating and frequency_rating are integers from 1 to 5.
- fatigue and appetite have no frequency_rating; nausea, cough and discomfort always have one.
- Give a location only for discomfort, with one entry per distinct body location.
- key_indicators must be copied word for word from what the patient said.";

/// Validated ratings plus the model's free-text observations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSymptoms {
    pub symptoms: BTreeMap<String, SymptomRating>,
    pub mood_assessment: Option<String>,
    pub conversation_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no JSON object found in model response")]
    NoJson,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("response has no symptoms array")]
    MissingSymptoms,

    #[error("symptom entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("symptom entry {index}: unknown symptom {name:?}")]
    UnknownSymptom { index: usize, name: String },

    #[error("{key}: {field} rating is missing")]
    MissingRating { key: String, field: &'static str },

    #[error("{key}: {field} rating must be an integer from 1 to 5, got {value}")]
    InvalidRating {
        key: String,
        field: &'static str,
        value: String,
    },

    #[error("{key}: symptom has no frequency axis")]
    UnexpectedFrequency { key: String },

    #[error("{key}: only discomfort carries a location")]
    UnexpectedLocation { key: String },

    #[error("{key}: symptom rated more than once")]
    DuplicateSymptom { key: String },

    #[error("{key}: key indicator {quote:?} is not something the patient said")]
    UnverifiedQuote { key: String, quote: String },
}

/// An extraction that did not fully validate.
///
/// `partial` holds whatever did validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub errors: Vec<ExtractionError>,
    pub partial: ExtractedSymptoms,
}

impl ExtractionFailure {
    fn whole(error: ExtractionError) -> Self {
        Self {
            errors: vec![error],
            partial: ExtractedSymptoms::default(),
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExtractionFailure {}

/// The localized request that closes the interview and asks for ratings.
pub fn closing_cue(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Based on our conversation, please provide a complete symptom assessment in the required structured format."
        }
        Language::Zh => "根據我們的對話，請提供完整的症狀評估，使用要求的結構化格式。",
    }
}

/// Build the extraction call for a finished transcript.
pub fn extraction_request(context: &InterviewContext<'_>, transcript: &Transcript) -> CompletionRequest {
    let mut messages = context.chat_messages(transcript.messages());
    messages.push(ChatMessage::user(closing_cue(context.language)));
    CompletionRequest {
        system: vec![EXTRACTION_INSTRUCTION.to_string(), context.policy.to_string()],
        messages,
        mode: CompletionMode::Extraction,
    }
}

#[derive(Deserialize)]
struct RawResponse {
    symptoms: Option<Vec<serde_json::Value>>,
    mood_assessment: Option<String>,
    conversation_notes: Option<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(alias = "symptom_name", alias = "name")]
    symptom: Option<String>,
    #[serde(alias = "severity")]
    severity_rating: Option<serde_json::Value>,
    #[serde(alias = "frequency")]
    frequency_rating: Option<serde_json::Value>,
    location: Option<String>,
    #[serde(default)]
    key_indicators: Option<Vec<String>>,
    additional_notes: Option<String>,
}

/// Parse and validate the model's extraction response against the
/// transcript it was produced from.
pub fn parse_extraction(
    response: &str,
    transcript: &Transcript,
) -> Result<ExtractedSymptoms, ExtractionFailure> {
    let json_str = locate_json(response).ok_or_else(|| ExtractionFailure::whole(ExtractionError::NoJson))?;

    let raw: RawResponse = serde_json::from_str(json_str)
        .map_err(|e| ExtractionFailure::whole(ExtractionError::MalformedJson(e.to_string())))?;

    let mut extracted = ExtractedSymptoms {
        symptoms: BTreeMap::new(),
        mood_assessment: non_blank(raw.mood_assessment),
        conversation_notes: non_blank(raw.conversation_notes),
    };

    let Some(entries) = raw.symptoms else {
        return Err(ExtractionFailure {
            errors: vec![ExtractionError::MissingSymptoms],
            partial: extracted,
        });
    };

    let patient_messages: Vec<&str> = transcript.patient_messages().collect();
    let mut errors = Vec::new();

    for (index, value) in entries.into_iter().enumerate() {
        match validate_entry(index, value, &patient_messages) {
            Ok((rating, quote_errors)) => {
                errors.extend(quote_errors);
                let key = rating.key();
                if extracted.symptoms.contains_key(&key) {
                    errors.push(ExtractionError::DuplicateSymptom { key });
                } else {
                    extracted.symptoms.insert(key, rating);
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(extracted)
    } else {
        Err(ExtractionFailure {
            errors,
            partial: extracted,
        })
    }
}

/// Find the JSON object in a response: a ```` ```json ```` fence if there
/// is one, otherwise the outermost braces.
fn locate_json(response: &str) -> Option<&str> {
    if let Some(fence) = response.find("```json") {
        let body_start = fence + "```json".len();
        if let Some(len) = response[body_start..].find("```") {
            return Some(response[body_start..body_start + len].trim());
        }
    }
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Validate one entry. Unverified quotes are dropped and reported without
/// rejecting the rating, so its severity still reaches escalation.
fn validate_entry(
    index: usize,
    value: serde_json::Value,
    patient_messages: &[&str],
) -> Result<(SymptomRating, Vec<ExtractionError>), ExtractionError> {
    let entry: RawEntry = serde_json::from_value(value).map_err(|e| ExtractionError::InvalidEntry {
        index,
        reason: e.to_string(),
    })?;

    let name = entry.symptom.ok_or_else(|| ExtractionError::InvalidEntry {
        index,
        reason: "symptom name is missing".to_string(),
    })?;
    let kind: SymptomKind = name
        .parse()
        .map_err(|_| ExtractionError::UnknownSymptom { index, name: name.clone() })?;

    let location = non_blank(entry.location);
    let key = symptom_key(kind, location.as_deref());
    if location.is_some() && !kind.has_location() {
        return Err(ExtractionError::UnexpectedLocation { key });
    }

    let severity = rating(&key, "severity", entry.severity_rating)?
        .ok_or_else(|| ExtractionError::MissingRating { key: key.clone(), field: "severity" })?;

    let frequency = rating(&key, "frequency", entry.frequency_rating)?;
    match (kind.has_frequency(), frequency) {
        (true, None) => {
            return Err(ExtractionError::MissingRating { key, field: "frequency" });
        }
        (false, Some(_)) => return Err(ExtractionError::UnexpectedFrequency { key }),
        _ => {}
    }

    let mut key_indicators = Vec::new();
    let mut quote_errors = Vec::new();
    for quote in entry.key_indicators.unwrap_or_default() {
        let needle = normalize_quote(&quote);
        if needle.is_empty() {
            continue;
        }
        let found = patient_messages
            .iter()
            .find_map(|message| find_verbatim(message, needle));
        match found {
            Some(words) => key_indicators.push(words.to_string()),
            None => quote_errors.push(ExtractionError::UnverifiedQuote {
                key: key.clone(),
                quote,
            }),
        }
    }

    let rating = SymptomRating {
        symptom_name: kind,
        severity,
        frequency,
        key_indicators,
        additional_notes: non_blank(entry.additional_notes),
        location,
    };
    Ok((rating, quote_errors))
}

fn rating(
    key: &str,
    field: &'static str,
    value: Option<serde_json::Value>,
) -> Result<Option<u8>, ExtractionError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .as_i64()
        .and_then(|n| checked_rating(key, field, n).ok())
        .map(Some)
        .ok_or_else(|| ExtractionError::InvalidRating {
            key: key.to_string(),
            field,
            value: value.to_string(),
        })
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

const QUOTE_MARKS: &[char] = &['"', '\'', '“', '”', '‘', '’', '「', '」', '『', '』'];
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '。', '，', '！', '？'];

/// Strip surrounding quote marks, whitespace and trailing punctuation.
fn normalize_quote(quote: &str) -> &str {
    quote
        .trim()
        .trim_matches(QUOTE_MARKS)
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim()
}

/// Find `needle` in `haystack`, ignoring case and treating any whitespace
/// run as equal to any other. Returns the matching slice of `haystack`.
fn find_verbatim<'h>(haystack: &'h str, needle: &str) -> Option<&'h str> {
    let needle: Vec<char> = needle.chars().collect();
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();
    (0..hay.len()).find_map(|start| {
        let end = match_at(&hay, start, &needle)?;
        let end_byte = hay.get(end).map_or(haystack.len(), |&(i, _)| i);
        Some(&haystack[hay[start].0..end_byte])
    })
}

fn match_at(hay: &[(usize, char)], start: usize, needle: &[char]) -> Option<usize> {
    let (mut h, mut n) = (start, 0);
    while n < needle.len() {
        if needle[n].is_whitespace() {
            while n < needle.len() && needle[n].is_whitespace() {
                n += 1;
            }
            let run_start = h;
            while h < hay.len() && hay[h].1.is_whitespace() {
                h += 1;
            }
            if h == run_start {
                return None;
            }
        } else {
            let &(_, c) = hay.get(h)?;
            if !c.to_lowercase().eq(needle[n].to_lowercase()) {
                return None;
            }
            h += 1;
            n += 1;
        }
    }
    Some(h)
}
