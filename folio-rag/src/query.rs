//! Query preprocessing: normalization, entity and topic extraction, expansion.
//!
//! This is literal pattern matching over the tables in [`crate::lexicon`],
//! not a language model. Output is deterministic for a given input.
//!
//! ```rust,ignore
//! use folio_rag::query::preprocess;
//!
//! let query = preprocess("Tell me about Virgin America");
//! assert_eq!(query.normalized, "virgin america");
//! assert!(query.entities.contains(&"Virgin America".to_string()));
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::{
    CONTEXT_PATTERNS, ENTITY_RULES, FIRST_PERSON_PATTERNS, QUESTION_PATTERNS, STOP_WORD_MAX_LEN,
    STOP_WORDS, SUBJECT, TRAILING_QUESTION, Topic,
};

static QUESTION_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(QUESTION_PATTERNS));

static TRAILING_QUESTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TRAILING_QUESTION).expect("trailing question pattern is valid"));

static FIRST_PERSON_REGEXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    FIRST_PERSON_PATTERNS
        .iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("first-person pattern is valid"), *replacement)
        })
        .collect()
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).expect("question pattern is valid")).collect()
}

/// The result of preprocessing one user question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessedQuery {
    /// The question exactly as the user typed it.
    pub original: String,
    /// Lower-cased question with question phrases and short stop words removed.
    pub normalized: String,
    /// Retrieval string: normalized text enriched with entities and context terms.
    pub expanded: String,
    /// Canonical entities mentioned in the question.
    pub entities: Vec<String>,
    /// Topic category names and the trigger phrases that matched them.
    pub keywords: Vec<String>,
}

impl PreprocessedQuery {
    /// Whether the question mentions the portfolio subject.
    pub fn mentions_subject(&self) -> bool {
        self.entities.iter().any(|e| e == SUBJECT)
    }
}

/// Run the full preprocessing chain. Never fails; empty input yields empty fields.
pub fn preprocess(raw: &str) -> PreprocessedQuery {
    let normalized = normalize(raw);
    let entities = extract_entities(raw);
    let keywords = extract_keywords(&normalized);
    let expanded = expand(&normalized, &entities, &keywords);

    PreprocessedQuery { original: raw.to_string(), normalized, expanded, entities, keywords }
}

/// Lower-case, strip question phrases and the trailing `?`, drop short stop words.
///
/// A token is removed only when it is a stop word **and** no longer than
/// [`STOP_WORD_MAX_LEN`] characters, so `"the"` survives while `"is"` does not.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_lowercase().trim().to_string();

    for pattern in QUESTION_REGEXES.iter() {
        if let Some(end) = pattern.find(&text).map(|m| m.end()) {
            text.drain(..end);
        }
    }
    text = TRAILING_QUESTION_REGEX.replace(&text, "").into_owned();

    text.split_whitespace().filter(|token| !is_droppable(token)).collect::<Vec<_>>().join(" ")
}

// Candidate for product review: most filters drop every stop word regardless of length.
fn is_droppable(token: &str) -> bool {
    STOP_WORDS.contains(&token) && token.chars().count() <= STOP_WORD_MAX_LEN
}

/// Canonical entities whose trigger occurs anywhere in the lower-cased raw question.
pub fn extract_entities(raw: &str) -> Vec<String> {
    let lowered = raw.to_lowercase();
    let mut entities = Vec::new();

    for rule in ENTITY_RULES {
        if rule.triggers.iter().any(|trigger| lowered.contains(trigger)) {
            for entity in rule.entities {
                push_unique(&mut entities, entity);
            }
        }
    }
    entities
}

/// Topic names plus the literal trigger phrases found in the normalized text.
///
/// Triggers match at the start of a word, so `"project"` fires on `"projects"`
/// but `"ui"` does not fire on `"building"`.
pub fn extract_keywords(normalized: &str) -> Vec<String> {
    let padded = format!(" {normalized}");
    let mut keywords = Vec::new();

    for topic in Topic::ALL {
        for trigger in topic.triggers() {
            if padded.contains(&format!(" {trigger}")) {
                push_unique(&mut keywords, topic.name());
                push_unique(&mut keywords, trigger);
            }
        }
    }
    keywords
}

/// Topics whose category name appears in `keywords`, in table order.
pub fn topics(keywords: &[String]) -> Vec<Topic> {
    Topic::ALL.into_iter().filter(|t| keywords.iter().any(|k| k == t.name())).collect()
}

/// Rewrite third-person references to the subject in the first person.
pub fn to_first_person(text: &str) -> String {
    FIRST_PERSON_REGEXES.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, *replacement).into_owned()
    })
}

/// Build the retrieval string. Only ever adds tokens to `normalized`.
pub fn expand(normalized: &str, entities: &[String], keywords: &[String]) -> String {
    let mut parts: Vec<String> = vec![normalized.to_string(), entities.join(" ")];

    if entities.iter().any(|e| e == SUBJECT) {
        parts.push(to_first_person(normalized));
    }
    for topic in topics(keywords) {
        parts.push(topic.expansion().to_string());
    }
    for (pattern, context) in CONTEXT_PATTERNS {
        if normalized.contains(pattern) {
            parts.push((*context).to_string());
        }
    }

    dedup_tokens(&parts.join(" "))
}

/// Drop repeated whitespace tokens, keeping the first occurrence of each.
fn dedup_tokens(text: &str) -> String {
    let mut seen = HashSet::new();
    text.split_whitespace().filter(|token| seen.insert(*token)).collect::<Vec<_>>().join(" ")
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_pattern_and_question_mark() {
        assert_eq!(normalize("What is Michael's favorite project?"), "michael's favorite project");
    }

    #[test]
    fn several_patterns_each_fire_once() {
        assert_eq!(normalize("Can you please tell me about his degree?"), "his degree");
        // "what is" fires once only; the second occurrence is content.
        assert_eq!(normalize("what is what is"), "what");
    }

    #[test]
    fn drops_only_short_stop_words() {
        assert_eq!(normalize("the role of design in a team"), "the role design team");
        assert_eq!(normalize("does he do that"), "does he that");
    }

    #[test]
    fn empty_and_blank_input_normalize_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
        assert_eq!(normalize("?"), "");
    }

    #[test]
    fn entity_extraction_deduplicates() {
        let entities = extract_entities("Virgin America vs Alaska: virgin or alaska?");
        assert_eq!(entities, vec!["Virgin America", "airline", "Alaska Airlines"]);
    }

    #[test]
    fn keywords_include_category_and_trigger() {
        let keywords = extract_keywords("favorite projects and design research");
        assert_eq!(keywords, vec!["projects", "project", "design", "research"]);
    }

    #[test]
    fn every_trigger_survives_normalization() {
        for topic in Topic::ALL {
            for trigger in topic.triggers() {
                let keywords = extract_keywords(&normalize(trigger));
                assert!(
                    keywords.iter().any(|k| k == topic.name()),
                    "trigger '{trigger}' cannot fire for {}",
                    topic.name()
                );
            }
        }
    }

    #[test]
    fn outside_of_work_reaches_personal_topic() {
        let query = preprocess("What do you do outside of work?");
        assert!(query.keywords.iter().any(|k| k == "personal"));
        assert_eq!(topics(&query.keywords), vec![Topic::Personal]);
    }

    #[test]
    fn keywords_match_at_word_start_only() {
        assert!(extract_keywords("building things").is_empty());
    }

    #[test]
    fn first_person_rewrite() {
        assert_eq!(to_first_person("michael's favorite project"), "my favorite project");
        assert_eq!(to_first_person("where did he study"), "where did i study");
    }

    #[test]
    fn expansion_biases_toward_first_person_for_subject() {
        let query = preprocess("What is Michael's favorite project?");
        assert!(query.mentions_subject());
        let tokens: Vec<&str> = query.expanded.split_whitespace().collect();
        assert_eq!(&tokens[..3], &["michael's", "favorite", "project"]);
        assert!(tokens.contains(&"my"));
        assert!(tokens.contains(&"Michael"));
        assert!(tokens.contains(&"proudest"));
        assert!(tokens.contains(&"shipped"));
    }

    #[test]
    fn expansion_has_no_duplicate_tokens() {
        let query = preprocess("Tell me about the project, the project and the team");
        let tokens: Vec<&str> = query.expanded.split_whitespace().collect();
        let unique: HashSet<&str> = tokens.iter().copied().collect();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn empty_query_is_degenerate_but_valid() {
        let query = preprocess("");
        assert_eq!(query.normalized, "");
        assert!(query.entities.is_empty());
        assert!(query.keywords.is_empty());
        assert_eq!(query.expanded, "");
    }

    #[test]
    fn virgin_america_scenario() {
        let query = preprocess("Tell me about Virgin America");
        assert_eq!(query.normalized, "virgin america");
        assert!(query.entities.iter().any(|e| e == "Virgin America"));
        assert!(!query.mentions_subject());
    }
}
