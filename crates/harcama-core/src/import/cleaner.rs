//! Merchant description cleaning
//!
//! Statement descriptions carry loyalty-point annotations, installment
//! markers, dates, country codes and amounts around the merchant name. The
//! cleaner removes them with an ordered list of rules. Order matters: point
//! annotations go before the country-code rule because a code such as `TR`
//! sits in front of an annotation until the annotation is removed.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::error::Result;

/// Titles shorter than this (in characters) are rejected
pub const MIN_TITLE_LEN: usize = 3;

/// Why a description could not become a title
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleanRejection {
    #[error("title is empty")]
    Empty,

    #[error("title '{0}' is too short to be meaningful")]
    TooShort(String),
}

/// A single (pattern, replacement) step
#[derive(Debug, Clone)]
pub struct CleaningRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CleaningRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Result<Self> {
        Self::build(name, pattern, replacement, true)
    }

    fn case_sensitive(name: &'static str, pattern: &str, replacement: &'static str) -> Result<Self> {
        Self::build(name, pattern, replacement, false)
    }

    fn build(
        name: &'static str,
        pattern: &str,
        replacement: &'static str,
        case_insensitive: bool,
    ) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            name,
            pattern,
            replacement,
        })
    }

    /// Apply this rule alone
    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement).into_owned()
    }
}

/// Ordered rule chain turning a raw description into a title
#[derive(Debug, Clone)]
pub struct DescriptionCleaner {
    rules: Vec<CleaningRule>,
}

impl DescriptionCleaner {
    /// Build the rule chain; `point_keywords` are the loyalty program labels
    pub fn new(point_keywords: &[String]) -> Result<Self> {
        let mut rules = Vec::new();

        if let Some(alternation) = keyword_alternation(point_keywords) {
            rules.push(CleaningRule::new(
                "point_annotation",
                &format!(
                    r"(?:\b(?:KAZANILAN|KAZANDIĞINIZ|IPTAL\s+EDILEN|İPTAL\s+EDİLEN)\s+)?\b(?:{})\b\s*:?\s*\d[\d.,]*",
                    alternation
                ),
                " ",
            )?);
        }

        rules.push(CleaningRule::new(
            "installment_parenthesized",
            r"\(\s*\d{1,2}\s*/\s*\d{1,2}\s*(?:TK|TAKSIT|TAKSİT)?\s*\)",
            " ",
        )?);
        rules.push(CleaningRule::new(
            "installment_marker",
            r"\b\d{1,2}\s*/\s*\d{1,2}\s*(?:TK|TAKSIT|TAKSİT)\b",
            " ",
        )?);
        rules.push(CleaningRule::new(
            "installment_trailing",
            r"\s+\d{1,2}/\d{1,2}(?:[^/\d].*)?$",
            "",
        )?);
        rules.push(CleaningRule::new(
            "leading_date",
            r"^\s*\d{1,4}[./-]\d{1,2}[./-]\d{1,4}(?:\s+\d{1,2}:\d{2}(?::\d{2})?)?\s*",
            "",
        )?);
        // Uppercase only; TL is a currency, not a country
        rules.push(CleaningRule::case_sensitive(
            "country_code",
            r"\s+(?:[A-SU-Z][A-Z]|T[A-KM-Z])\s*$",
            "",
        )?);
        rules.push(CleaningRule::new(
            "currency_amount",
            r"(?:₺|\bTL\b|\bTRY\b)\s*\d[\d.,]*|\d[\d.,]*\s*(?:₺|TL\b|TRY\b)",
            " ",
        )?);
        rules.push(CleaningRule::new("whitespace", r"\s+", " ")?);
        rules.push(CleaningRule::new(
            "edge_punctuation",
            r"^[\s*\-,:;/]+|[\s*\-,:;/]+$",
            "",
        )?);

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CleaningRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&CleaningRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Run every rule in order
    pub fn clean(&self, raw: &str) -> String {
        self.rules
            .iter()
            .fold(raw.to_string(), |text, rule| rule.apply(&text))
            .trim()
            .to_string()
    }

    /// Clean and apply the minimum-length guard
    pub fn clean_title(&self, raw: &str) -> std::result::Result<String, CleanRejection> {
        let cleaned = self.clean(raw);
        if cleaned.is_empty() {
            return Err(CleanRejection::Empty);
        }
        if cleaned.chars().count() < MIN_TITLE_LEN {
            return Err(CleanRejection::TooShort(cleaned));
        }
        Ok(cleaned)
    }
}

/// Longest-first alternation so `MAXIPUAN` wins over `PUAN`
fn keyword_alternation(keywords: &[String]) -> Option<String> {
    let mut keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return None;
    }
    keywords.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));

    let escaped: Vec<String> = keywords
        .iter()
        .map(|k| {
            k.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    Some(escaped.join("|"))
}
