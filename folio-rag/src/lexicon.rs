//! Static lookup tables driving query preprocessing.
//!
//! Everything here is configuration data. Tables are evaluated in the order
//! they are declared, which keeps normalization and expansion reproducible.

use serde::{Deserialize, Serialize};

/// Leading question phrases removed during normalization, in priority order.
///
/// Every pattern is anchored at the start of the text and applied at most
/// once, so `"can you please tell me about x"` reduces to `"x"`.
pub const QUESTION_PATTERNS: &[&str] = &[
    r"^can\s+you\s+",
    r"^could\s+you\s+",
    r"^would\s+you\s+",
    r"^please\s+",
    r"^tell\s+me\s+about\s+",
    r"^tell\s+me\s+",
    r"^i\s+want\s+to\s+know\s+",
    r"^what\s+(is|are|was|were)\s+",
    r"^what's\s+",
    r"^who\s+(is|was)\s+",
    r"^describe\s+",
    r"^explain\s+",
];

/// Trailing question mark(s), removed after the leading patterns.
pub const TRAILING_QUESTION: &str = r"\s*\?+\s*$";

/// Short function words. A token is dropped only if it appears here *and*
/// is at most [`STOP_WORD_MAX_LEN`] characters long.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "am", "be", "of", "to", "in", "on", "at", "by",
    "for", "and", "or", "me", "i", "it", "do", "does", "did", "about", "as", "so", "if", "up",
    "we", "us", "what", "that", "this",
];

/// Longest stop word that is still filtered out.
pub const STOP_WORD_MAX_LEN: usize = 2;

/// Canonical name of the person the portfolio belongs to.
pub const SUBJECT: &str = "Michael";

/// Maps trigger substrings of the raw question to canonical entity names.
#[derive(Debug, Clone, Copy)]
pub struct EntityRule {
    /// Lower-case substrings that activate the rule.
    pub triggers: &'static [&'static str],
    /// Canonical entities added when any trigger matches.
    pub entities: &'static [&'static str],
}

/// Known people, employers and case studies.
pub const ENTITY_RULES: &[EntityRule] = &[
    EntityRule { triggers: &["michael", "mike"], entities: &[SUBJECT] },
    EntityRule {
        triggers: &["virgin america", "virgin"],
        entities: &["Virgin America", "airline"],
    },
    EntityRule { triggers: &["alaska"], entities: &["Alaska Airlines", "airline"] },
    EntityRule { triggers: &["hoteltonight", "hotel tonight"], entities: &["HotelTonight"] },
    EntityRule { triggers: &["work & co", "work and co", "workco"], entities: &["Work & Co"] },
    EntityRule { triggers: &["this site", "this website"], entities: &["portfolio website"] },
];

/// Topic categories recognised in the normalized question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Education,
    Career,
    Projects,
    Skills,
    Design,
    Personal,
    Contact,
}

impl Topic {
    /// Every topic, in evaluation order.
    pub const ALL: [Topic; 7] = [
        Topic::Education,
        Topic::Career,
        Topic::Projects,
        Topic::Skills,
        Topic::Design,
        Topic::Personal,
        Topic::Contact,
    ];

    /// Category name emitted as a keyword.
    pub fn name(self) -> &'static str {
        match self {
            Topic::Education => "education",
            Topic::Career => "career",
            Topic::Projects => "projects",
            Topic::Skills => "skills",
            Topic::Design => "design",
            Topic::Personal => "personal",
            Topic::Contact => "contact",
        }
    }

    /// Phrases that signal the topic. Matched at the start of a word against
    /// normalized text, so they must not contain droppable stop words.
    pub fn triggers(self) -> &'static [&'static str] {
        match self {
            Topic::Education => {
                &["education", "school", "college", "university", "degree", "studied"]
            }
            Topic::Career => &[
                "career",
                "job",
                "work history",
                "experience",
                "worked",
                "role",
                "employer",
                "company",
            ],
            Topic::Projects => {
                &["project", "case study", "portfolio", "built", "shipped", "launched"]
            }
            Topic::Skills => &["skill", "tool", "figma", "prototyp", "strength"],
            Topic::Design => {
                &["design", "ux", "ui", "user experience", "interface", "research"]
            }
            Topic::Personal => {
                &["hobby", "hobbies", "free time", "outside work", "personal", "interests"]
            }
            Topic::Contact => &["contact", "email", "hire", "reach out", "linkedin", "available"],
        }
    }

    /// Contextual terms appended to the expanded query when the topic is present.
    pub fn expansion(self) -> &'static str {
        match self {
            Topic::Education => "education degree university school studied graduated",
            Topic::Career => "career experience roles companies worked employment history",
            Topic::Projects => "projects case studies work shipped launched product",
            Topic::Skills => "skills tools methods strengths expertise",
            Topic::Design => "design process ux research interaction visual",
            Topic::Personal => "personal interests hobbies life outside work",
            Topic::Contact => "contact email reach availability hiring",
        }
    }
}

/// Substring of the normalized question paired with the context it adds.
pub const CONTEXT_PATTERNS: &[(&str, &str)] = &[
    ("favorite", "favorite proudest best highlight most meaningful"),
    ("why", "motivation reason because decided"),
    ("how", "process approach method steps"),
    ("learn", "lessons learned takeaways growth"),
    ("challeng", "challenges obstacles problems solved"),
    ("impact", "impact results metrics outcomes"),
    ("team", "team collaboration cross-functional partners"),
    ("award", "awards recognition honors"),
];

/// Third-person references to the subject and their first-person rewrite.
/// Applied in order, each to the whole text.
pub const FIRST_PERSON_PATTERNS: &[(&str, &str)] = &[
    (r"\b(michael|mike)['’]s\b", "my"),
    (r"\b(michael|mike)\b", "i"),
    (r"\bhis\b", "my"),
    (r"\bhim\b", "me"),
    (r"\bhe\b", "i"),
];

/// Phrase found in the assistant's canned answer to off-topic questions.
pub const REDIRECT_PHRASE: &str = "I'm here to help with questions about Michael's work";
