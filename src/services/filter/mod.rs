//! Keyword filters applied to titles while rows are collected.
//!
//! Keywords are separated by commas or whitespace; a double-quoted phrase is
//! one keyword. Matching is a case-insensitive substring match.

use regex::{Regex, RegexBuilder};

use crate::models::settings::{AgendaSettings, SettingsError};

/// One compiled keyword list.
#[derive(Debug, Clone)]
pub struct KeywordsFilter {
    keywords: Vec<String>,
    pattern: Option<Regex>,
    match_when_empty: bool,
}

impl KeywordsFilter {
    /// `match_when_empty` is the answer of a filter with no keywords.
    pub fn new(text: &str, match_when_empty: bool) -> Result<Self, SettingsError> {
        let keywords = parse_keywords(text);
        let pattern = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|keyword| regex::escape(keyword))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&alternation)
                .case_insensitive(true)
                .build()
                .map_err(|err| SettingsError::InvalidKeywords {
                    pattern: text.to_string(),
                    reason: err.to_string(),
                })?;
            Some(regex)
        };

        Ok(Self {
            keywords,
            pattern,
            match_when_empty,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn matched(&self, text: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(text),
            None => self.match_when_empty,
        }
    }
}

/// Hide and show keyword filters of one widget.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    hide: KeywordsFilter,
    show: KeywordsFilter,
}

impl SourceFilter {
    pub fn new(hide_keywords: &str, show_keywords: &str) -> Result<Self, SettingsError> {
        Ok(Self {
            hide: KeywordsFilter::new(hide_keywords, false)?,
            show: KeywordsFilter::new(show_keywords, true)?,
        })
    }

    pub fn from_settings(settings: &AgendaSettings) -> Result<Self, SettingsError> {
        Self::new(
            &settings.hide_based_on_keywords,
            &settings.show_based_on_keywords,
        )
    }

    /// Filter that keeps everything.
    pub fn allow_all() -> Self {
        Self {
            hide: KeywordsFilter {
                keywords: Vec::new(),
                pattern: None,
                match_when_empty: false,
            },
            show: KeywordsFilter {
                keywords: Vec::new(),
                pattern: None,
                match_when_empty: true,
            },
        }
    }

    /// Not hidden and shown.
    pub fn retains(&self, title: &str) -> bool {
        !self.hide.matched(title) && self.show.matched(title)
    }
}

fn parse_keywords(text: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                if quoted {
                    push_keyword(&mut keywords, &mut current);
                }
                quoted = !quoted;
            }
            ',' => push_keyword(&mut keywords, &mut current),
            ch if ch.is_whitespace() && !quoted => push_keyword(&mut keywords, &mut current),
            ch => current.push(ch),
        }
    }
    push_keyword(&mut keywords, &mut current);
    keywords
}

fn push_keyword(keywords: &mut Vec<String>, current: &mut String) {
    let keyword = current.trim();
    if !keyword.is_empty() && !keywords.iter().any(|existing| existing == keyword) {
        keywords.push(keyword.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", &[]; "empty")]
    #[test_case("birthday", &["birthday"]; "single")]
    #[test_case("a, b  c", &["a", "b", "c"]; "commas and spaces")]
    #[test_case("\"team lunch\" gym", &["team lunch", "gym"]; "quoted phrase")]
    #[test_case("gym gym", &["gym"]; "duplicates collapsed")]
    fn test_parse_keywords(text: &str, expected: &[&str]) {
        let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_keywords(text), expected);
    }

    #[test]
    fn test_empty_filter_default_answer() {
        assert!(!KeywordsFilter::new("", false).unwrap().matched("anything"));
        assert!(KeywordsFilter::new("  ", true).unwrap().matched("anything"));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let filter = KeywordsFilter::new("birthday", false).unwrap();
        assert!(filter.matched("Anna's BIRTHDAY party"));
        assert!(!filter.matched("Anniversary"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let filter = KeywordsFilter::new("c++ (draft)", false).unwrap();
        assert!(filter.matched("Learn C++ today"));
        assert!(filter.matched("Spec (draft)"));
        assert!(!filter.matched("c"));
    }

    #[test]
    fn test_source_filter_hide_wins_over_show() {
        let filter = SourceFilter::new("cancelled", "meeting").unwrap();
        assert!(filter.retains("Team meeting"));
        assert!(!filter.retains("Team meeting (cancelled)"));
        assert!(!filter.retains("Lunch"));
    }

    #[test]
    fn test_allow_all() {
        let filter = SourceFilter::allow_all();
        assert!(filter.retains(""));
        assert!(filter.retains("Anything at all"));
    }
}
