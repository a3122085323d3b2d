//! Keyword-based category classification
//!
//! Each named category scores its keywords against the folded
//! title + description: +10 when the whole text is the keyword, +5 when the
//! keyword appears as a separate word, +1 when it appears anywhere. The
//! highest total wins; ties go to the category listed first; no hits at all
//! means `Other`.

use crate::config::CategoryCatalog;
use crate::models::Category;

use super::normalize_text;

const EXACT_SCORE: u32 = 10;
const WORD_SCORE: u32 = 5;
const SUBSTRING_SCORE: u32 = 1;

#[derive(Debug, Clone)]
pub struct Classifier {
    /// Folded keywords per named category, in enumeration order
    keywords: Vec<(Category, Vec<String>)>,
}

impl Classifier {
    pub fn new(catalog: &CategoryCatalog) -> Self {
        let keywords = Category::named()
            .map(|category| {
                let folded = catalog
                    .keywords(category)
                    .iter()
                    .map(|k| normalize_text(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                (category, folded)
            })
            .collect();
        Self { keywords }
    }

    /// Score every named category
    pub fn scores(&self, title: &str, description: &str) -> Vec<(Category, u32)> {
        let text = normalize_text(&format!("{} {}", title, description));
        let padded = format!(" {} ", text);

        self.keywords
            .iter()
            .map(|(category, keywords)| {
                let score = keywords
                    .iter()
                    .map(|keyword| {
                        let mut score = 0;
                        if text == *keyword {
                            score += EXACT_SCORE;
                        }
                        if padded.contains(&format!(" {} ", keyword)) {
                            score += WORD_SCORE;
                        }
                        if text.contains(keyword.as_str()) {
                            score += SUBSTRING_SCORE;
                        }
                        score
                    })
                    .sum();
                (*category, score)
            })
            .collect()
    }

    pub fn classify(&self, title: &str, description: &str) -> Category {
        let mut best = (Category::Other, 0);
        for (category, score) in self.scores(title, description) {
            if score > best.1 {
                best = (category, score);
            }
        }
        best.0
    }
}
