/// Mood detection policy
///
/// The classifier itself is an external collaborator behind the
/// `MoodClassifier` trait. This module owns the caller-side rules: which
/// texts are worth classifying, how a raw model reply is parsed, and which
/// mood a failure falls back to.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::mood::{Mood, MoodCatalog};
use crate::prompts::TextGenerator;

/// Texts shorter than this (trimmed, in characters) are not classified
pub const MIN_CLASSIFY_CHARS: usize = 5;

const SHORT_TEXT_CONFIDENCE: f64 = 0.3;
const FAILURE_CONFIDENCE: f64 = 0.3;
const UNKNOWN_MOOD_CONFIDENCE: f64 = 0.5;
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Raw classifier answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "mood")]
    pub mood_id: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Resolved mood with a confidence in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct MoodAnalysis {
    pub mood: Mood,
    pub confidence: f64,
}

impl MoodAnalysis {
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            ConfidenceLevel::High
        } else if score > 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can name the mood of a text.
pub trait MoodClassifier {
    fn classify(&self, text: &str) -> Result<Classification>;
}

/// Classifier backed by a free-form text generator.
pub struct GeneratorClassifier<G> {
    generator: G,
    catalog: MoodCatalog,
}

impl<G: TextGenerator> GeneratorClassifier<G> {
    pub fn new(generator: G, catalog: MoodCatalog) -> Self {
        Self { generator, catalog }
    }
}

impl<G: TextGenerator> MoodClassifier for GeneratorClassifier<G> {
    fn classify(&self, text: &str) -> Result<Classification> {
        let prompt = classification_prompt(text, &self.catalog);
        let reply = self
            .generator
            .generate(&prompt)
            .context("Mood classification request failed")?;
        debug!("Classifier reply: {}", reply);
        parse_classification(&reply)
    }
}

/// Instruction asking a model for the primary mood of `text`.
pub fn classification_prompt(text: &str, catalog: &MoodCatalog) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert emotion analyst. Read this personal journal entry and identify \
         the PRIMARY emotional state of the writer.\n\n",
    );
    prompt.push_str("Available moods and their meanings:\n");
    for mood in catalog.iter() {
        prompt.push_str(&format!(
            "{}: {}\n",
            mood.id,
            mood.description.as_deref().unwrap_or(&mood.name)
        ));
    }
    prompt.push_str(&format!("\nJournal entry:\n\"{}\"\n\n", text));
    prompt.push_str(
        "Look for explicit emotion words, the overall tone, and context clues about the \
         writer's state of mind.\n\n",
    );
    prompt.push_str(
        "Respond ONLY with a JSON object (no markdown, no extra text):\n\
         {\"mood\": \"mood_id\", \"confidence\": 0.85}\n\n",
    );
    prompt.push_str(&format!(
        "mood_id must be one of: {}\nconfidence is between 0.0 and 1.0.\n",
        catalog.ids().join(", ")
    ));
    prompt.push_str("Only answer \"neutral\" when the text is truly balanced.");

    prompt
}

/// Parse a model reply of the form `{"mood": "calm", "confidence": 0.8}`,
/// optionally wrapped in a markdown code fence.
pub fn parse_classification(reply: &str) -> Result<Classification> {
    let cleaned = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(cleaned)
        .map_err(|e| anyhow!("Invalid classifier reply '{}': {}", cleaned, e))
}

fn normalize_confidence(raw: Option<f64>) -> f64 {
    match raw {
        Some(c) if c.is_finite() && c != 0.0 => c.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Detect the mood of `text`. Never fails: short texts, classifier errors
/// and unknown mood ids all fall back to the catalog's neutral mood.
pub fn detect_mood<C: MoodClassifier + ?Sized>(
    classifier: &C,
    text: &str,
    catalog: &MoodCatalog,
) -> MoodAnalysis {
    if text.trim().chars().count() < MIN_CLASSIFY_CHARS {
        debug!("Text too short to classify, using fallback mood");
        return MoodAnalysis {
            mood: catalog.fallback(),
            confidence: SHORT_TEXT_CONFIDENCE,
        };
    }

    let classification = match classifier.classify(text) {
        Ok(classification) => classification,
        Err(e) => {
            warn!("Mood detection failed: {:#}", e);
            return MoodAnalysis {
                mood: catalog.fallback(),
                confidence: FAILURE_CONFIDENCE,
            };
        }
    };

    match catalog.find(&classification.mood_id) {
        Some(mood) => MoodAnalysis {
            mood: mood.clone(),
            confidence: normalize_confidence(classification.confidence),
        },
        None => {
            warn!("Classifier returned unknown mood '{}'", classification.mood_id);
            MoodAnalysis {
                mood: catalog.fallback(),
                confidence: UNKNOWN_MOOD_CONFIDENCE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::Cell;

    struct FixedClassifier {
        reply: Result<Classification, String>,
        calls: Cell<usize>,
    }

    impl FixedClassifier {
        fn answering(mood: &str, confidence: Option<f64>) -> Self {
            Self {
                reply: Ok(Classification {
                    mood_id: mood.to_string(),
                    confidence,
                }),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("network down".to_string()),
                calls: Cell::new(0),
            }
        }
    }

    impl MoodClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> Result<Classification> {
            self.calls.set(self.calls.get() + 1);
            match &self.reply {
                Ok(c) => Ok(c.clone()),
                Err(msg) => bail!("{}", msg),
            }
        }
    }

    struct EchoGenerator(String);

    impl TextGenerator for EchoGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    const TEXT: &str = "I finally finished the project and feel light.";

    #[test]
    fn test_short_text_skips_classifier() {
        let catalog = MoodCatalog::default();
        let classifier = FixedClassifier::answering("happy", Some(0.9));

        let analysis = detect_mood(&classifier, "  ok  ", &catalog);
        assert_eq!(analysis.mood.id, "neutral");
        assert_eq!(analysis.confidence, 0.3);
        assert_eq!(classifier.calls.get(), 0);
    }

    #[test]
    fn test_known_mood() {
        let catalog = MoodCatalog::default();
        let classifier = FixedClassifier::answering("happy", Some(0.85));

        let analysis = detect_mood(&classifier, TEXT, &catalog);
        assert_eq!(analysis.mood.id, "happy");
        assert_eq!(analysis.confidence, 0.85);
        assert_eq!(analysis.level(), ConfidenceLevel::High);
    }

    #[test]
    fn test_classifier_error_falls_back() {
        let catalog = MoodCatalog::default();
        let analysis = detect_mood(&FixedClassifier::failing(), TEXT, &catalog);
        assert_eq!(analysis.mood.id, "neutral");
        assert_eq!(analysis.confidence, 0.3);
    }

    #[test]
    fn test_unknown_mood_falls_back() {
        let catalog = MoodCatalog::default();
        let classifier = FixedClassifier::answering("ecstatic", Some(0.99));

        let analysis = detect_mood(&classifier, TEXT, &catalog);
        assert_eq!(analysis.mood.id, "neutral");
        assert_eq!(analysis.confidence, 0.5);
    }

    #[test]
    fn test_confidence_normalized() {
        let catalog = MoodCatalog::default();
        let cases = [(Some(1.7), 1.0), (Some(-0.2), 0.0), (Some(0.0), 0.5), (None, 0.5)];
        for (raw, expected) in cases {
            let classifier = FixedClassifier::answering("calm", raw);
            let analysis = detect_mood(&classifier, TEXT, &catalog);
            assert_eq!(analysis.confidence, expected, "raw={:?}", raw);
        }
    }

    #[test]
    fn test_parse_classification() {
        let parsed = parse_classification(r#"{"mood": "calm", "confidence": 0.8}"#).unwrap();
        assert_eq!(parsed.mood_id, "calm");
        assert_eq!(parsed.confidence, Some(0.8));

        let fenced = "```json\n{\"mood\": \"sad\", \"confidence\": 0.6}\n```";
        assert_eq!(parse_classification(fenced).unwrap().mood_id, "sad");

        let bare = parse_classification(r#"{"mood": "anxious"}"#).unwrap();
        assert_eq!(bare.confidence, None);

        assert!(parse_classification("I think you feel calm").is_err());
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(0.71), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.41), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Medium.to_string(), "medium");
    }

    #[test]
    fn test_prompt_lists_catalog() {
        let catalog = MoodCatalog::default();
        let prompt = classification_prompt("Long day at work", &catalog);
        assert!(prompt.contains("calm: Peaceful and centered"));
        assert!(prompt.contains("\"Long day at work\""));
        assert!(prompt.contains(&catalog.ids().join(", ")));
    }

    #[test]
    fn test_generator_classifier() {
        let catalog = MoodCatalog::default();
        let classifier = GeneratorClassifier::new(
            EchoGenerator("```json\n{\"mood\": \"grateful\", \"confidence\": 0.75}\n```".into()),
            catalog.clone(),
        );
        let analysis = detect_mood(&classifier, TEXT, &catalog);
        assert_eq!(analysis.mood.id, "grateful");
        assert_eq!(analysis.confidence, 0.75);

        let garbled = GeneratorClassifier::new(EchoGenerator("calm?".into()), catalog.clone());
        let analysis = detect_mood(&garbled, TEXT, &catalog);
        assert_eq!(analysis.mood.id, "neutral");
        assert_eq!(analysis.confidence, 0.3);
    }
}
