//! Label cleaning pipelines for route names, trip headsigns and stop names.
//!
//! Each pipeline is an ordered list of pattern → replacement rules followed
//! by a tidy/capitalize pass. Order matters: street-type rewrites produce the
//! `av.`/`boul.` shapes that later rules and the capitalizer expect.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// Stop rerunning a pipeline after this many passes.
const MAX_PASSES: usize = 16;

/// Trip headsigns only.
const HEADSIGN_RULES: &[(&str, &str)] = &[
    // Keep the destination after the last "vers" or "à"
    (r"^(?:.*\s)?(?:vers|à)\s+", ""),
    (r"^\s*(?:direction\s+)+", ""),
    (r"\btaxi[- ]?bus\s*t\s*(\d+)\b", "T${1}"),
];

/// Shared French lexical rewrites.
const FRENCH_LEXICAL_RULES: &[(&str, &str)] = &[
    (r"\bsainte\b", "Ste"),
    (r"\bsaint\b", "St"),
    (r"\b(?:boulevard|boul)\b\.?", "boul."),
    (r"\b(?:avenue|av)\b\.?", "av."),
    (r"\b(?:chemin|ch)\b\.?", "ch."),
];

/// Stop names only: "face à", "devant le" and friends.
const PREPOSITION_RULES: &[(&str, &str)] = &[
    (r"^face\s+(?:à|a|aux|au)\s+", " "),
    (r"^(?:face\s+)+", " "),
    (r"\s+face\s+(?:à|a|aux|au)\s+", " "),
    (r"\s+face\s+", " "),
    (r"^devant\s+(?:les\s+|le\s+|la\s+|l')?", " "),
    (r"\s+devant\s+(?:les\s+|le\s+|la\s+|l')?", " "),
];

/// Whitespace and boundary punctuation.
const TIDY_RULES: &[(&str, &str)] = &[
    (r"\s+", " "),
    (r" ,", ","),
    (r"^[\s\-/,;:.]+", ""),
    (r"[\s\-/,;:]+$", ""),
];

/// Words kept lowercase unless they open the label.
const LOWERCASE_WORDS: &[&str] = &[
    "de", "du", "des", "la", "le", "les", "l", "d", "à", "au", "aux", "et", "en", "sur", "rue",
    "av", "boul", "ch",
];

/// Agency-supplied rule, as written in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

/// Agency-supplied extra rules per pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizerRules {
    #[serde(default)]
    pub route_long_name: Vec<RuleSpec>,
    #[serde(default)]
    pub trip_headsign: Vec<RuleSpec>,
    #[serde(default)]
    pub stop_name: Vec<RuleSpec>,
}

/// A pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern {pattern:?}: {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// One case-insensitive pattern → replacement step.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, InvalidPattern> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }
}

/// An ordered rule list ending with the tidy/capitalize pass.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: &'static str,
    rules: Vec<Rule>,
}

impl Pipeline {
    fn build(
        name: &'static str,
        leading: &[(&str, &str)],
        extra: &[RuleSpec],
        trailing: &[&[(&str, &str)]],
    ) -> Result<Self, InvalidPattern> {
        let mut rules = Vec::new();
        for (pattern, replacement) in leading {
            rules.push(Rule::new(pattern, replacement)?);
        }
        for spec in extra {
            rules.push(Rule::new(&spec.pattern, &spec.replacement)?);
        }
        for stage in trailing {
            for (pattern, replacement) in stage.iter() {
                rules.push(Rule::new(pattern, replacement)?);
            }
        }
        for (pattern, replacement) in TIDY_RULES {
            rules.push(Rule::new(pattern, replacement)?);
        }
        Ok(Self { name, rules })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Clean a label.
    ///
    /// Passes repeat until the output stops changing, so
    /// `apply(apply(s)) == apply(s)`.
    pub fn apply(&self, input: &str) -> String {
        let mut current = self.apply_once(input);
        for _ in 1..MAX_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::warn!("[NORMALIZE] {} did not settle for {:?}", self.name, input);
        current
    }

    fn apply_once(&self, input: &str) -> String {
        let cleaned = self
            .rules
            .iter()
            .fold(input.to_string(), |acc, rule| rule.apply(&acc));
        french_case(&cleaned)
    }
}

/// The three label pipelines of one agency.
#[derive(Debug, Clone)]
pub struct Normalizer {
    route_long_name: Pipeline,
    trip_headsign: Pipeline,
    stop_name: Pipeline,
}

impl Normalizer {
    pub fn new(extra: &NormalizerRules) -> Result<Self, InvalidPattern> {
        Ok(Self {
            route_long_name: Pipeline::build(
                "route_long_name",
                &[],
                &extra.route_long_name,
                &[FRENCH_LEXICAL_RULES],
            )?,
            trip_headsign: Pipeline::build(
                "trip_headsign",
                HEADSIGN_RULES,
                &extra.trip_headsign,
                &[FRENCH_LEXICAL_RULES],
            )?,
            stop_name: Pipeline::build(
                "stop_name",
                &[],
                &extra.stop_name,
                &[FRENCH_LEXICAL_RULES, PREPOSITION_RULES],
            )?,
        })
    }

    pub fn route_long_name(&self, name: &str) -> String {
        self.route_long_name.apply(name)
    }

    pub fn trip_headsign(&self, headsign: &str) -> String {
        self.trip_headsign.apply(headsign)
    }

    pub fn stop_name(&self, name: &str) -> String {
        self.stop_name.apply(name)
    }

    pub fn pipelines(&self) -> [&Pipeline; 3] {
        [&self.route_long_name, &self.trip_headsign, &self.stop_name]
    }
}

/// French label capitalization.
///
/// Shouted words are lowercased before capitalizing. Particles and street
/// types stay lowercase unless they open the label.
fn french_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut word = String::new();
    let mut first = true;
    for ch in label.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
            continue;
        }
        if !word.is_empty() {
            out.push_str(&case_word(&word, first));
            first = false;
            word.clear();
        }
        out.push(ch);
    }
    if !word.is_empty() {
        out.push_str(&case_word(&word, first));
    }
    out
}

fn case_word(word: &str, first: bool) -> String {
    let lower = word.to_lowercase();
    if !first && LOWERCASE_WORDS.contains(&lower.as_str()) {
        return lower;
    }
    let shouted = !word.chars().skip(1).any(char::is_lowercase);
    if shouted {
        capitalize(&lower)
    } else {
        capitalize(word)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
