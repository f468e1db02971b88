//! Keyword Validator
//!
//! Lexical first line of defense: normalize, strip literals, then reject if
//! any write or administrative keyword appears as a whole word.
//!
//! Keyword matching cannot recognise arbitrary procedure or function calls
//! (new procedure names are not keywords). That is why this validator is
//! always chained with [`crate::validator::plan::PlanValidator`] in
//! production and never used on its own.
//!
//! Matching is purely lexical, so a property or variable named like a
//! keyword (`e.start`, `n.set`) is rejected too. Such properties can still
//! be read with a string key, as in `e['start']`, since literal contents
//! are inert.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::literals::strip_string_literals;
use super::normalize::normalize;
use super::{QueryValidator, Verdict};
use crate::guard_error::{ConfigError, Rejection};

/// Version tag of [`KeywordSet::builtin`]. Bump it whenever the list changes
/// so deployed configuration can be audited against it.
pub const BUILTIN_KEYWORD_SET_VERSION: &str = "cypher-5-r2";

const BUILTIN_KEYWORDS: &[&str] = &[
    "CREATE",
    "INSERT",
    "SET",
    "DELETE",
    "REMOVE",
    "MERGE",
    "DROP",
    "CALL",
    "LOAD",
    "FOREACH",
    "GRANT",
    "DENY",
    "REVOKE",
    "SHOW",
    "ALTER",
    "RENAME",
    "TERMINATE",
    "START",
    "STOP",
    "ENABLE",
    "DEALLOCATE",
    "REALLOCATE",
];

/// Ordered, versioned set of banned keywords.
///
/// This is configuration rather than code: it has to be reviewed every time
/// the query language grows new write or procedure syntax, since a missing
/// keyword is a silent hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKeywordSet")]
pub struct KeywordSet {
    version: String,
    keywords: Vec<String>,
}

#[derive(Deserialize)]
struct RawKeywordSet {
    version: String,
    keywords: Vec<String>,
}

impl TryFrom<RawKeywordSet> for KeywordSet {
    type Error = ConfigError;

    fn try_from(raw: RawKeywordSet) -> Result<Self, Self::Error> {
        KeywordSet::new(raw.version, raw.keywords)
    }
}

impl KeywordSet {
    pub fn new<I, S>(version: impl Into<String>, keywords: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(ConfigError::Message(
                "keyword set version cannot be empty".to_string(),
            ));
        }

        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty()
                || !keyword
                    .chars()
                    .all(|c| c.is_ascii_alphabetic() || c == '_')
            {
                return Err(ConfigError::Message(format!(
                    "invalid keyword '{}' in keyword set {}",
                    keyword, version
                )));
            }
            let keyword = keyword.to_ascii_uppercase();
            if !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        if normalized.is_empty() {
            return Err(ConfigError::Message(format!(
                "keyword set {} has no keywords",
                version
            )));
        }

        Ok(Self {
            version,
            keywords: normalized,
        })
    }

    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_KEYWORD_SET_VERSION.to_string(),
            keywords: BUILTIN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(keyword))
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::builtin()
    }
}

pub struct KeywordValidator {
    keyword_set: KeywordSet,
    patterns: Vec<(String, Regex)>,
}

impl KeywordValidator {
    pub fn new(keyword_set: KeywordSet) -> Self {
        let patterns = keyword_set
            .keywords()
            .iter()
            .map(|keyword| {
                // Keywords are validated as `[A-Z_]+`, so the pattern always compiles
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
                    .expect("keyword pattern");
                (keyword.clone(), pattern)
            })
            .collect();

        Self {
            keyword_set,
            patterns,
        }
    }

    pub fn keyword_set(&self) -> &KeywordSet {
        &self.keyword_set
    }

    /// Returns the first banned keyword found outside string literals
    pub fn find_keyword(&self, query: &str) -> Option<&str> {
        let normalized = normalize(query);
        let stripped = strip_string_literals(normalized.as_str());

        self.patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(&stripped))
            .map(|(keyword, _)| keyword.as_str())
    }

    /// Synchronous check; needs no engine and no runtime
    pub fn check(&self, query: &str) -> Verdict {
        match self.find_keyword(query) {
            Some(keyword) => {
                warn!(
                    keyword,
                    keyword_set = %self.keyword_set.version(),
                    query_len = query.len(),
                    "Query rejected: banned keyword outside string literal"
                );
                Verdict::Rejected(Rejection::ContainsWriteOrAdminKeyword)
            }
            None => {
                debug!(query_len = query.len(), "No banned keyword found");
                Verdict::Allowed
            }
        }
    }
}

impl Default for KeywordValidator {
    fn default() -> Self {
        Self::new(KeywordSet::builtin())
    }
}

#[async_trait]
impl QueryValidator for KeywordValidator {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn validate(&self, query: &str) -> Verdict {
        self.check(query)
    }
}
