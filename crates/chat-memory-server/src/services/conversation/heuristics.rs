//! Keyword heuristics for topic, tone, intent and preference signals.
//!
//! All rule tables are data ([`HeuristicProfile`]); the extractor only knows
//! how to evaluate them. Two profiles ship: `basic` and `extended`, which
//! differ in their tone rules and topic keyword lists.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::types::PreferenceKind;

static LIKES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i (?:like|love) (.+)").expect("valid likes regex"));

static DISLIKES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)i (?:don't like|don’t like|do not like|hate) (.+)")
        .expect("valid dislikes regex")
});

const LIKES_FALLBACK: &str = "general topics";
const DISLIKES_FALLBACK: &str = "certain topics";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicProfileKind {
    #[default]
    Basic,
    Extended,
}

/// A label chosen when the lower-cased message contains any keyword.
/// `max_len` additionally requires the message to be shorter than that.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
    pub max_len: Option<usize>,
}

impl KeywordRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            max_len: None,
        }
    }

    pub fn shorter_than(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    fn matches(&self, lowered: &str) -> bool {
        if let Some(max) = self.max_len {
            if lowered.chars().count() >= max {
                return false;
            }
        }
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicProfile {
    /// Evaluated independently; every matching rule contributes its label
    pub topics: Vec<KeywordRule>,
    /// Priority order, first match wins
    pub tones: Vec<KeywordRule>,
    pub default_tone: String,
    /// Priority order, first match wins
    pub intents: Vec<KeywordRule>,
    pub default_intent: String,
}

impl HeuristicProfile {
    pub fn for_kind(kind: HeuristicProfileKind) -> Self {
        match kind {
            HeuristicProfileKind::Basic => Self::basic(),
            HeuristicProfileKind::Extended => Self::extended(),
        }
    }

    pub fn basic() -> Self {
        Self {
            topics: vec![
                KeywordRule::new("weather", &["weather"]),
                KeywordRule::new("music", &["music"]),
                KeywordRule::new("food", &["food", "cook"]),
                KeywordRule::new("travel", &["travel", "trip"]),
                KeywordRule::new("work", &["work", "job"]),
                KeywordRule::new("health", &["health", "exercise"]),
                KeywordRule::new("technology", &["technology", "tech"]),
                KeywordRule::new("education", &["education", "learn"]),
            ],
            tones: base_tones(),
            default_tone: "neutral".to_string(),
            intents: intents(),
            default_intent: "statement".to_string(),
        }
    }

    pub fn extended() -> Self {
        let mut tones = base_tones();
        tones.push(KeywordRule::new("enthusiastic", &["love", "amazing"]));
        tones.push(KeywordRule::new("frustrated", &["hate", "terrible"]));

        Self {
            topics: vec![
                KeywordRule::new("technology", &["tech", "computer", "software", "programming", "code"]),
                KeywordRule::new("health", &["health", "exercise", "fitness", "workout", "diet"]),
                KeywordRule::new("travel", &["travel", "trip", "vacation", "destination", "flight"]),
                KeywordRule::new("food", &["food", "cook", "recipe", "restaurant", "cuisine"]),
                KeywordRule::new("music", &["music", "song", "artist", "concert", "playlist"]),
                KeywordRule::new("work", &["work", "job", "career", "office", "business"]),
                KeywordRule::new("education", &["learn", "study", "school", "university", "course"]),
                KeywordRule::new("weather", &["weather", "climate", "temperature", "forecast"]),
            ],
            tones,
            default_tone: "neutral".to_string(),
            intents: intents(),
            default_intent: "statement".to_string(),
        }
    }
}

fn base_tones() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("excited", &["!", "excited"]),
        KeywordRule::new("curious", &["?"]).shorter_than(20),
        KeywordRule::new("grateful", &["thank", "thanks"]),
        KeywordRule::new("apologetic", &["sorry", "apologize"]),
        KeywordRule::new("needing_help", &["help", "need"]),
    ]
}

fn intents() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("question", &["what", "how", "why"]),
        KeywordRule::new("request_help", &["help", "assist"]),
        KeywordRule::new("gratitude", &["thank"]),
        KeywordRule::new("farewell", &["bye", "goodbye"]),
        KeywordRule::new("greeting", &["hello", "hi"]),
    ]
}

/// Everything extracted from one user message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSignals {
    pub topics: Vec<String>,
    pub tone: String,
    pub intent: String,
    pub preferences: BTreeMap<PreferenceKind, String>,
}

#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    profile: HeuristicProfile,
}

impl HeuristicExtractor {
    pub fn new(profile: HeuristicProfile) -> Self {
        Self { profile }
    }

    pub fn analyze(&self, message: &str) -> MessageSignals {
        let lowered = message.to_lowercase();
        let signals = MessageSignals {
            topics: self.topics_of(&lowered),
            tone: self.tone_of(&lowered),
            intent: self.intent_of(&lowered),
            preferences: Self::preferences(message),
        };
        debug!(
            "Signals: tone={}, intent={}, topics={:?}, preferences={}",
            signals.tone,
            signals.intent,
            signals.topics,
            signals.preferences.len()
        );
        signals
    }

    pub fn topics(&self, message: &str) -> Vec<String> {
        self.topics_of(&message.to_lowercase())
    }

    pub fn tone(&self, message: &str) -> String {
        self.tone_of(&message.to_lowercase())
    }

    pub fn intent(&self, message: &str) -> String {
        self.intent_of(&message.to_lowercase())
    }

    /// "I like/love X" and "I don't like/hate X". Case-insensitive on the
    /// trigger, the captured object keeps the user's casing.
    pub fn preferences(message: &str) -> BTreeMap<PreferenceKind, String> {
        let lowered = message.to_lowercase();
        let mut prefs = BTreeMap::new();

        if lowered.contains("i like") || lowered.contains("i love") {
            let value = capture_object(&LIKES_PATTERN, message).unwrap_or(LIKES_FALLBACK);
            prefs.insert(PreferenceKind::Likes, value.to_string());
        }

        if contains_dislike_trigger(&lowered) {
            let value = capture_object(&DISLIKES_PATTERN, message).unwrap_or(DISLIKES_FALLBACK);
            prefs.insert(PreferenceKind::Dislikes, value.to_string());
        }

        prefs
    }

    fn topics_of(&self, lowered: &str) -> Vec<String> {
        self.profile
            .topics
            .iter()
            .filter(|rule| rule.matches(lowered))
            .map(|rule| rule.label.clone())
            .collect()
    }

    fn tone_of(&self, lowered: &str) -> String {
        first_match(&self.profile.tones, lowered)
            .unwrap_or(&self.profile.default_tone)
            .to_string()
    }

    fn intent_of(&self, lowered: &str) -> String {
        first_match(&self.profile.intents, lowered)
            .unwrap_or(&self.profile.default_intent)
            .to_string()
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(HeuristicProfile::basic())
    }
}

fn first_match<'a>(rules: &'a [KeywordRule], lowered: &str) -> Option<&'a String> {
    rules
        .iter()
        .find(|rule| rule.matches(lowered))
        .map(|rule| &rule.label)
}

fn contains_dislike_trigger(lowered: &str) -> bool {
    ["i don't like", "i don’t like", "i do not like", "i hate"]
        .iter()
        .any(|t| lowered.contains(t))
}

fn capture_object<'a>(pattern: &Regex, message: &'a str) -> Option<&'a str> {
    pattern
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}
