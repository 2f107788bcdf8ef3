//! Language Resolver
//!
//! Picks the language configuration block (engine, voice, fallback asset)
//! for a piece of text. Only a primary/secondary distinction is exposed:
//! whatever the detector says, anything other than the secondary language
//! resolves to the primary one.

use crate::config::{Config, LanguageConfig};
use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Texts shorter than this many whitespace-delimited tokens skip detection
pub const MIN_DETECTION_TOKENS: usize = 4;

/// Pluggable language identification
pub trait LanguageDetector: Send + Sync + std::fmt::Debug {
    /// Returns a language code, or `None` when undecidable
    fn detect(&self, text: &str) -> Result<Option<String>>;
}

/// Result of a resolution: the code that was chosen and its config block
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLanguage {
    pub code: String,
    pub config: LanguageConfig,
}

/// Immutable language table plus detector
#[derive(Debug)]
pub struct LanguageResolver {
    primary: String,
    secondary: String,
    table: HashMap<String, LanguageConfig>,
    /// Entry for the primary language
    fallback: LanguageConfig,
    detector: Box<dyn LanguageDetector>,
}

impl LanguageResolver {
    pub fn new(config: &Config) -> Self {
        Self::with_detector(config, Box::new(StopwordDetector))
    }

    pub fn with_detector(config: &Config, detector: Box<dyn LanguageDetector>) -> Self {
        let config = config.clone().normalized();
        Self {
            fallback: config.default_entry(),
            primary: config.default_language.clone(),
            secondary: config.secondary_language.clone(),
            table: config.languages,
            detector,
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Resolve `text` to a language config.
    ///
    /// A recognized `explicit` code wins outright. `None` or `"auto"` runs
    /// detection. Unrecognized codes land on the primary entry.
    pub fn resolve(&self, text: &str, explicit: Option<&str>) -> ResolvedLanguage {
        let code = match explicit.map(str::trim) {
            Some(code) if !code.is_empty() && !code.eq_ignore_ascii_case("auto") => {
                code.to_lowercase()
            }
            _ => self.detect(text),
        };
        self.lookup(&code)
    }

    /// Look a code up in the table, landing on the primary entry when absent
    pub fn lookup(&self, code: &str) -> ResolvedLanguage {
        if let Some(config) = self.table.get(code) {
            return ResolvedLanguage {
                code: code.to_string(),
                config: config.clone(),
            };
        }

        warn!("⚠️ No config for language '{}', using '{}'", code, self.primary);
        ResolvedLanguage {
            code: self.primary.clone(),
            config: self.fallback.clone(),
        }
    }

    fn detect(&self, text: &str) -> String {
        let tokens = text.split_whitespace().count();
        if tokens < MIN_DETECTION_TOKENS {
            debug!(
                "Text has {} tokens, skipping detection (primary '{}')",
                tokens, self.primary
            );
            return self.primary.clone();
        }

        match self.detector.detect(text) {
            Ok(Some(code)) if code.eq_ignore_ascii_case(&self.secondary) => {
                debug!("🌐 Detected secondary language '{}'", self.secondary);
                self.secondary.clone()
            }
            Ok(Some(code)) => {
                debug!("🌐 Detected '{}', mapping to primary '{}'", code, self.primary);
                self.primary.clone()
            }
            Ok(None) => {
                debug!("Language undecidable, using primary '{}'", self.primary);
                self.primary.clone()
            }
            Err(e) => {
                warn!("⚠️ Language detection failed, using primary: {}", e);
                self.primary.clone()
            }
        }
    }
}

/// Function-word lists per language. Short, frequent words carry most of the
/// signal in conversational sentences.
const STOPWORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "and", "is", "are", "was", "to", "of", "a", "in", "that", "it", "you", "i",
            "this", "with", "for", "not", "have", "what", "be", "on", "my", "your",
        ],
    ),
    (
        "nl",
        &[
            "de", "het", "een", "en", "is", "ik", "niet", "dat", "van", "je", "jij", "wat",
            "ben", "zijn", "met", "voor", "op", "naar", "maar", "ook", "hallo", "goed", "mijn",
            "wij", "hoe",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ich", "du", "ein", "eine", "mit",
            "zu", "auf", "für", "wir", "sie", "es", "auch", "wie", "mein",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "et", "est", "je", "tu", "un", "une", "des", "pas", "que", "qui",
            "dans", "pour", "avec", "nous", "vous", "mon", "ce",
        ],
    ),
];

/// Scores tokens against per-language function-word lists.
///
/// No hits, or a tie for the best score, is undecidable.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopwordDetector;

impl LanguageDetector for StopwordDetector {
    fn detect(&self, text: &str) -> Result<Option<String>> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut best: Option<(&str, usize)> = None;
        let mut tied = false;
        for &(code, list) in STOPWORDS {
            let score = words.iter().filter(|w| list.contains(&w.as_str())).count();
            match best {
                Some((_, top)) if score > top => {
                    best = Some((code, score));
                    tied = false;
                }
                Some((_, top)) if score == top => tied = true,
                None => best = Some((code, score)),
                _ => {}
            }
        }

        Ok(match best {
            Some((code, score)) if score > 0 && !tied => Some(code.to_string()),
            _ => None,
        })
    }
}
