//! Coverage: how much of a posting's vocabulary the profile already speaks to.
//!
//! Shape (stable across engines):
//! `{"matched": [string], "missing": [string], "score": number in [0, 1]}`

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub score: f64,
}

/// Words that appear in job URLs and postings but say nothing about the role.
const STOP_WORDS: &[&str] = &[
    "and", "the", "for", "with", "you", "our", "job", "jobs", "career", "careers", "posting",
    "postings", "apply", "view", "www", "html", "htm", "php", "aspx", "details", "position",
    "positions", "opening", "openings", "index", "role", "roles", "listing", "search",
];

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .map(str::to_lowercase)
        .filter(|t| t.len() >= 2)
}

/// Extracts role keywords from a job URL's path, e.g.
/// `/jobs/senior-rust-engineer` → `["senior", "rust", "engineer"]`.
pub fn keywords_from_url(url: &url::Url) -> Vec<String> {
    let mut seen = HashSet::new();
    url.path_segments()
        .into_iter()
        .flatten()
        .flat_map(|segment| tokens(segment).collect::<Vec<_>>())
        .filter(|t| t.len() >= 3)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Splits `keywords` into those present in `profile_text` as whole words and those absent.
///
/// score = matched / total, rounded to two decimals; 0.0 when there are no keywords.
pub fn keyword_coverage(keywords: &[String], profile_text: &str) -> Coverage {
    let vocabulary: HashSet<String> = tokens(profile_text).collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut seen = HashSet::new();

    for keyword in keywords {
        let normalized = keyword.trim().to_lowercase();
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        let parts: Vec<String> = tokens(&normalized).collect();
        let present = !parts.is_empty() && parts.iter().all(|t| vocabulary.contains(t));
        if present {
            matched.push(normalized);
        } else {
            missing.push(normalized);
        }
    }

    let total = matched.len() + missing.len();
    let score = if total == 0 {
        0.0
    } else {
        ((matched.len() as f64 / total as f64) * 100.0).round() / 100.0
    };

    Coverage {
        matched,
        missing,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_from_url_path() {
        let url = url::Url::parse("https://example.com/jobs/senior-rust-engineer/4821").unwrap();
        assert_eq!(keywords_from_url(&url), vec!["senior", "rust", "engineer"]);
    }

    #[test]
    fn test_keywords_from_numeric_path_is_empty() {
        let url = url::Url::parse("https://jobs.example.com/123").unwrap();
        assert!(keywords_from_url(&url).is_empty());
    }

    #[test]
    fn test_keyword_coverage_splits_matched_and_missing() {
        let keywords = vec!["rust".to_string(), "kafka".to_string(), "SQL".to_string()];
        let cov = keyword_coverage(&keywords, "Backend engineer: Rust, Postgres and SQL tuning.");
        assert_eq!(cov.matched, vec!["rust", "sql"]);
        assert_eq!(cov.missing, vec!["kafka"]);
        assert_eq!(cov.score, 0.67);
    }

    #[test]
    fn test_keyword_coverage_whole_words_only() {
        let cov = keyword_coverage(&["go".to_string()], "Good at Django");
        assert!(cov.matched.is_empty());
        assert_eq!(cov.missing, vec!["go"]);
        assert_eq!(cov.score, 0.0);
    }

    #[test]
    fn test_keyword_coverage_empty_keywords() {
        let cov = keyword_coverage(&[], "anything");
        assert_eq!(cov.score, 0.0);
        assert!(cov.matched.is_empty() && cov.missing.is_empty());
    }

    #[test]
    fn test_keyword_coverage_handles_symbols() {
        let keywords = vec!["c++".to_string(), "c#".to_string()];
        let cov = keyword_coverage(&keywords, "Ten years of C++ and some C#.");
        assert_eq!(cov.matched, vec!["c++", "c#"]);
        assert_eq!(cov.score, 1.0);
    }

    #[test]
    fn test_coverage_shape_is_stable() {
        let value = serde_json::to_value(keyword_coverage(&["rust".to_string()], "rust")).unwrap();
        let obj = value.as_object().unwrap();
        let mut fields: Vec<_> = obj.keys().cloned().collect();
        fields.sort();
        assert_eq!(fields, vec!["matched", "missing", "score"]);
    }
}
