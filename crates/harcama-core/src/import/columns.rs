//! Header row to canonical field mapping

use serde::Serialize;
use tracing::debug;

use crate::config::ColumnSynonyms;
use crate::error::{Error, Result};

use super::normalize_text;

/// Canonical import fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Amount,
    Date,
    Category,
    Description,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Self::Title,
        Self::Amount,
        Self::Date,
        Self::Category,
        Self::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::Category => "category",
            Self::Description => "description",
        }
    }
}

/// A source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub index: usize,
    pub header: String,
}

/// Where each canonical field comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub title: ColumnRef,
    pub amount: ColumnRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<ColumnRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ColumnRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<ColumnRef>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&ColumnRef> {
        match field {
            Field::Title => Some(&self.title),
            Field::Amount => Some(&self.amount),
            Field::Date => self.date.as_ref(),
            Field::Category => self.category.as_ref(),
            Field::Description => self.description.as_ref(),
        }
    }
}

/// Maps localized headers onto canonical fields
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    /// Folded synonyms, indexed like `Field::ALL`
    synonyms: [Vec<String>; 5],
}

impl ColumnMapper {
    pub fn new(synonyms: &ColumnSynonyms) -> Self {
        let fold = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|s| normalize_text(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            synonyms: [
                fold(&synonyms.title),
                fold(&synonyms.amount),
                fold(&synonyms.date),
                fold(&synonyms.category),
                fold(&synonyms.description),
            ],
        }
    }

    /// Map a header row
    ///
    /// Exact synonym matches win, then headers containing a synonym as a
    /// word (longest synonym first). If title or amount is still missing,
    /// columns are assigned by position: title, amount, date.
    pub fn map_columns(&self, headers: &[String]) -> Result<ColumnMapping> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_text(h)).collect();
        let mut slots: [Option<usize>; 5] = [None; 5];
        let mut used = vec![false; headers.len()];

        // Exact matches
        for (f, synonyms) in self.synonyms.iter().enumerate() {
            if let Some(i) = (0..normalized.len())
                .find(|&i| !used[i] && synonyms.iter().any(|s| *s == normalized[i]))
            {
                slots[f] = Some(i);
                used[i] = true;
            }
        }

        // Headers containing a synonym, longest synonym first
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (f, synonyms) in self.synonyms.iter().enumerate() {
            if slots[f].is_some() {
                continue;
            }
            for (i, header) in normalized.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let padded = format!(" {} ", header);
                if let Some(len) = synonyms
                    .iter()
                    .filter(|s| padded.contains(&format!(" {} ", s)))
                    .map(|s| s.len())
                    .max()
                {
                    candidates.push((len, f, i));
                }
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        for (_, f, i) in candidates {
            if slots[f].is_none() && !used[i] {
                slots[f] = Some(i);
                used[i] = true;
            }
        }

        // Positional fallback
        let (title, amount) = (0, 1);
        if slots[title].is_none() || slots[amount].is_none() {
            debug!("Header match incomplete, falling back to column positions");
            for (f, preferred) in [(title, 0), (amount, 1)] {
                if slots[f].is_none() {
                    let pick = if preferred < used.len() && !used[preferred] {
                        Some(preferred)
                    } else {
                        used.iter().position(|u| !u)
                    };
                    if let Some(i) = pick {
                        slots[f] = Some(i);
                        used[i] = true;
                    }
                }
            }
            let date = 2;
            if slots[date].is_none() && used.len() > 2 && !used[2] {
                slots[date] = Some(2);
                used[2] = true;
            }
        }

        let column = |slot: Option<usize>| {
            slot.map(|index| ColumnRef {
                index,
                header: headers[index].trim().to_string(),
            })
        };

        match (column(slots[0]), column(slots[1])) {
            (Some(title), Some(amount)) => {
                let mapping = ColumnMapping {
                    title,
                    amount,
                    date: column(slots[2]),
                    category: column(slots[3]),
                    description: column(slots[4]),
                };
                debug!(?mapping, "Detected columns");
                Ok(mapping)
            }
            _ => Err(Error::Import(format!(
                "could not identify columns (headers: {})",
                headers.join(", ")
            ))),
        }
    }
}
