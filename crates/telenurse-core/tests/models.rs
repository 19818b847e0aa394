use std::collections::BTreeMap;

use telenurse_core::error::CoreError;
use telenurse_core::models::assessment::{
    Assessment, InputMode, Language, NotificationLevel, validate_patient_id,
};
use telenurse_core::models::message::{Message, Role, Transcript};
use telenurse_core::models::symptom::{SymptomKind, SymptomRating, checked_rating, symptom_key};

#[test]
fn symptom_aliases_resolve_to_canonical_kinds() {
    assert_eq!("lack_of_appetite".parse::<SymptomKind>().unwrap(), SymptomKind::Appetite);
    assert_eq!("Pain".parse::<SymptomKind>().unwrap(), SymptomKind::Discomfort);
    assert_eq!(" cough ".parse::<SymptomKind>().unwrap(), SymptomKind::Cough);
    assert!(matches!(
        "dizziness".parse::<SymptomKind>(),
        Err(CoreError::UnknownSymptom(_))
    ));
}

#[test]
fn only_fatigue_and_appetite_lack_a_frequency_axis() {
    let without: Vec<_> = SymptomKind::ALL
        .iter()
        .filter(|k| !k.has_frequency())
        .collect();
    assert_eq!(without, vec![&SymptomKind::Fatigue, &SymptomKind::Appetite]);
}

#[test]
fn discomfort_locations_produce_composite_keys() {
    assert_eq!(symptom_key(SymptomKind::Discomfort, Some("Lower  Back")), "discomfort:lower_back");
    assert_eq!(symptom_key(SymptomKind::Discomfort, Some("knee")), "discomfort:knee");
    assert_eq!(symptom_key(SymptomKind::Discomfort, Some("  ")), "discomfort");
    assert_eq!(symptom_key(SymptomKind::Discomfort, None), "discomfort");
    // Location is meaningless for other symptoms and does not affect the key.
    assert_eq!(symptom_key(SymptomKind::Cough, Some("chest")), "cough");
}

#[test]
fn ratings_outside_the_scale_are_rejected() {
    assert_eq!(checked_rating("cough", "severity", 1).unwrap(), 1);
    assert_eq!(checked_rating("cough", "severity", 5).unwrap(), 5);
    let err = checked_rating("cough", "frequency", 6).unwrap_err();
    assert_eq!(err.to_string(), "cough: frequency rating 6 is outside range [1, 5]");
    assert!(checked_rating("cough", "severity", 0).is_err());
}

#[test]
fn patient_ids_must_be_filename_safe() {
    assert_eq!(validate_patient_id("  p-01_a ").unwrap(), "p-01_a");
    assert!(matches!(validate_patient_id("   "), Err(CoreError::MissingField(_))));
    assert!(validate_patient_id("../etc").is_err());
    assert!(validate_patient_id("a b").is_err());
    assert!(validate_patient_id(&"x".repeat(65)).is_err());
}

#[test]
fn transcript_is_ordered_and_renders_roles() {
    let mut transcript = Transcript::new();
    transcript.push(Message::interviewer("How was your week?"));
    transcript.push(Message::patient("Tiring, I need naps most days."));
    transcript.push(Message::interviewer("Naps can help."));

    assert_eq!(transcript.len(), 3);
    assert_eq!(
        transcript.patient_messages().collect::<Vec<_>>(),
        vec!["Tiring, I need naps most days."]
    );
    assert_eq!(
        transcript.render(),
        "Interviewer: How was your week?\nPatient: Tiring, I need naps most days.\nInterviewer: Naps can help."
    );
}

#[test]
fn assessment_serializes_with_contract_field_names() {
    let mut symptoms = BTreeMap::new();
    symptoms.insert(
        "fatigue".to_string(),
        SymptomRating {
            symptom_name: SymptomKind::Fatigue,
            severity: 2,
            frequency: None,
            key_indicators: vec!["not as much pep".to_string()],
            additional_notes: None,
            location: None,
        },
    );
    let assessment = Assessment {
        patient_id: "p1".to_string(),
        timestamp: "2025-03-01T08:05:09.123456789Z".parse().unwrap(),
        language: Language::Zh,
        input_mode: InputMode::Speech,
        symptoms,
        mood_assessment: Some("cheerful".to_string()),
        conversation_notes: None,
        flag_for_oncologist: false,
        flag_reason: None,
        oncologist_notification_level: NotificationLevel::None,
    };

    let json = serde_json::to_value(&assessment).unwrap();
    let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "conversation_notes",
            "flag_for_oncologist",
            "flag_reason",
            "input_mode",
            "language",
            "mood_assessment",
            "oncologist_notification_level",
            "patient_id",
            "symptoms",
            "timestamp",
        ]
    );
    assert_eq!(json["language"], "zh");
    assert_eq!(json["input_mode"], "speech");
    assert_eq!(json["oncologist_notification_level"], "none");
    assert_eq!(json["symptoms"]["fatigue"]["symptom_name"], "fatigue");
    assert!(json["symptoms"]["fatigue"].get("frequency").is_none());

    let back: Assessment = serde_json::from_value(json).unwrap();
    assert_eq!(back, assessment);
}

#[test]
fn notification_levels_are_ordered_by_severity() {
    assert!(NotificationLevel::None < NotificationLevel::Amber);
    assert!(NotificationLevel::Amber < NotificationLevel::Red);
}
