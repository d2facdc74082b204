//! Culture records and their insights.
//!
//! A [`Culture`] is the unit the ledger caches: a named bundle of general
//! insights plus insights filed under named categories. The remote service
//! serves snake_case field names:
//!
//! ```json
//! {
//!   "name": "Japan",
//!   "general_insights": [
//!     {
//!       "summary": "Bowing",
//!       "information": "Bowing is a common greeting.",
//!       "source": { "data": "https://example.com", "type": "link" }
//!     }
//!   ],
//!   "specialized_insights": {
//!     "Dining": [ { "summary": "...", "information": "...", "source": { "data": "...", "type": "..." } } ]
//!   },
//!   "modified": 1700000000000
//! }
//! ```
//!
//! Cached payloads are written with camelCase names (`generalInsights`,
//! `specializedInsights`); both spellings are accepted when reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Mapping of culture name to last-modified epoch milliseconds.
pub type Catalogue = BTreeMap<String, i64>;

/// Where an insight's information came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    pub information: String,
    pub source: Source,
}

impl Insight {
    pub fn new(
        summary: impl Into<String>,
        information: impl Into<String>,
        source_data: impl Into<String>,
        source_kind: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            information: information.into(),
            source: Source {
                data: source_data.into(),
                kind: source_kind.into(),
            },
        }
    }

    /// Check that every field carries content
    pub fn validate(&self) -> Result<(), InsightError> {
        let fields = [
            ("summary", &self.summary),
            ("information", &self.information),
            ("source.data", &self.source.data),
            ("source.type", &self.source.kind),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(InsightError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Address of a single insight inside a culture.
///
/// `category == None` points into the general insights.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsightRef {
    pub category: Option<String>,
    pub position: usize,
}

impl InsightRef {
    pub fn general(position: usize) -> Self {
        Self {
            category: None,
            position,
        }
    }

    pub fn specialized(category: impl Into<String>, position: usize) -> Self {
        Self {
            category: Some(category.into()),
            position,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InsightError {
    #[error("insight field '{0}' is required")]
    MissingField(&'static str),

    #[error("category name is required for specialized insights")]
    MissingCategory,

    #[error("no insight at {0:?}")]
    NoSuchInsight(InsightRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Culture {
    pub name: String,
    #[serde(default, alias = "general_insights")]
    pub general_insights: Vec<Insight>,
    #[serde(default, alias = "specialized_insights")]
    pub specialized_insights: BTreeMap<String, Vec<Insight>>,
    pub modified: i64,
}

impl Culture {
    pub fn new(name: impl Into<String>, modified: i64) -> Self {
        Self {
            name: name.into(),
            general_insights: Vec::new(),
            specialized_insights: BTreeMap::new(),
            modified,
        }
    }

    /// Last modification time, if `modified` is a representable timestamp
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.modified)
    }

    pub fn insight_count(&self) -> usize {
        self.general_insights.len()
            + self
                .specialized_insights
                .values()
                .map(Vec::len)
                .sum::<usize>()
    }

    pub fn insight(&self, at: &InsightRef) -> Option<&Insight> {
        self.bucket(at.category.as_deref())?.get(at.position)
    }

    /// Append an insight and return its address
    pub fn insert_insight(
        &mut self,
        category: Option<&str>,
        insight: Insight,
    ) -> Result<InsightRef, InsightError> {
        insight.validate()?;

        let bucket = match category {
            None => &mut self.general_insights,
            Some(name) if name.trim().is_empty() => return Err(InsightError::MissingCategory),
            Some(name) => self.specialized_insights.entry(name.to_string()).or_default(),
        };
        bucket.push(insight);

        Ok(InsightRef {
            category: category.map(str::to_string),
            position: bucket.len() - 1,
        })
    }

    /// Replace the insight at `at`, returning the previous one
    pub fn replace_insight(
        &mut self,
        at: &InsightRef,
        insight: Insight,
    ) -> Result<Insight, InsightError> {
        insight.validate()?;

        let slot = self
            .bucket_mut(at.category.as_deref())
            .and_then(|bucket| bucket.get_mut(at.position))
            .ok_or_else(|| InsightError::NoSuchInsight(at.clone()))?;

        Ok(std::mem::replace(slot, insight))
    }

    /// Remove the insight at `at`; an emptied category is dropped
    pub fn remove_insight(&mut self, at: &InsightRef) -> Result<Insight, InsightError> {
        let bucket = self
            .bucket_mut(at.category.as_deref())
            .filter(|bucket| at.position < bucket.len())
            .ok_or_else(|| InsightError::NoSuchInsight(at.clone()))?;

        let removed = bucket.remove(at.position);
        let emptied = bucket.is_empty();

        if let (Some(category), true) = (&at.category, emptied) {
            self.specialized_insights.remove(category);
        }

        Ok(removed)
    }

    fn bucket(&self, category: Option<&str>) -> Option<&Vec<Insight>> {
        match category {
            None => Some(&self.general_insights),
            Some(name) => self.specialized_insights.get(name),
        }
    }

    fn bucket_mut(&mut self, category: Option<&str>) -> Option<&mut Vec<Insight>> {
        match category {
            None => Some(&mut self.general_insights),
            Some(name) => self.specialized_insights.get_mut(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_insight(tag: &str) -> Insight {
        Insight::new(
            format!("summary {tag}"),
            format!("information {tag}"),
            "https://example.com",
            "link",
        )
    }

    #[test]
    fn test_deserialize_remote_shape() {
        let json = r#"{
            "name": "Japan",
            "general_insights": [
                {"summary": "Bowing", "information": "Common greeting", "source": {"data": "book", "type": "print"}}
            ],
            "specialized_insights": {
                "Dining": [
                    {"summary": "Chopsticks", "information": "Never stand them upright", "source": {"data": "x", "type": "link"}}
                ]
            },
            "modified": 1700000000000
        }"#;

        let culture: Culture = serde_json::from_str(json).unwrap();
        assert_eq!(culture.name, "Japan");
        assert_eq!(culture.general_insights[0].source.kind, "print");
        assert_eq!(culture.specialized_insights["Dining"].len(), 1);
        assert_eq!(culture.insight_count(), 2);
    }

    #[test]
    fn test_cached_shape_round_trips() {
        let mut culture = Culture::new("Japan", 7);
        culture
            .insert_insight(Some("Dining"), sample_insight("d"))
            .unwrap();

        let value = serde_json::to_value(&culture).unwrap();
        assert!(value.get("specializedInsights").is_some());
        assert!(value.get("specialized_insights").is_none());

        let restored: Culture = serde_json::from_value(value).unwrap();
        assert_eq!(restored, culture);
    }

    #[test]
    fn test_missing_insight_lists_default_to_empty() {
        let culture: Culture = serde_json::from_str(r#"{"name": "Peru", "modified": 5}"#).unwrap();
        assert!(culture.general_insights.is_empty());
        assert!(culture.specialized_insights.is_empty());
    }

    #[test]
    fn test_source_kind_serializes_as_type() {
        let value = serde_json::to_value(sample_insight("a")).unwrap();
        assert_eq!(value["source"]["type"], "link");
        assert!(value["source"].get("kind").is_none());
    }

    #[test]
    fn test_modified_at() {
        let culture = Culture::new("Chile", 1_700_000_000_000);
        let at = culture.modified_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_insert_and_address_insights() {
        let mut culture = Culture::new("Kenya", 1);

        let general = culture.insert_insight(None, sample_insight("g")).unwrap();
        let special = culture
            .insert_insight(Some("Greetings"), sample_insight("s"))
            .unwrap();

        assert_eq!(general, InsightRef::general(0));
        assert_eq!(special, InsightRef::specialized("Greetings", 0));
        assert_eq!(culture.insight(&special).unwrap().summary, "summary s");
        assert!(culture.insight(&InsightRef::specialized("Nope", 0)).is_none());
    }

    #[test]
    fn test_insert_rejects_blank_fields() {
        let mut culture = Culture::new("Kenya", 1);
        let mut insight = sample_insight("x");
        insight.information = "   ".to_string();

        assert_eq!(
            culture.insert_insight(None, insight),
            Err(InsightError::MissingField("information"))
        );
        assert_eq!(
            culture.insert_insight(Some(" "), sample_insight("y")),
            Err(InsightError::MissingCategory)
        );
        assert_eq!(culture.insight_count(), 0);
    }

    #[test]
    fn test_replace_insight() {
        let mut culture = Culture::new("Fiji", 1);
        let at = culture.insert_insight(None, sample_insight("old")).unwrap();

        let previous = culture.replace_insight(&at, sample_insight("new")).unwrap();
        assert_eq!(previous.summary, "summary old");
        assert_eq!(culture.insight(&at).unwrap().summary, "summary new");

        let missing = InsightRef::general(4);
        assert_eq!(
            culture.replace_insight(&missing, sample_insight("z")),
            Err(InsightError::NoSuchInsight(missing.clone()))
        );
    }

    #[test]
    fn test_remove_last_specialized_drops_category() {
        let mut culture = Culture::new("Chad", 1);
        let at = culture
            .insert_insight(Some("Music"), sample_insight("m"))
            .unwrap();

        culture.remove_insight(&at).unwrap();
        assert!(!culture.specialized_insights.contains_key("Music"));
        assert!(culture.remove_insight(&at).is_err());
    }

    #[test]
    fn test_remove_general_shifts_positions() {
        let mut culture = Culture::new("Oman", 1);
        culture.insert_insight(None, sample_insight("0")).unwrap();
        culture.insert_insight(None, sample_insight("1")).unwrap();

        let removed = culture.remove_insight(&InsightRef::general(0)).unwrap();
        assert_eq!(removed.summary, "summary 0");
        assert_eq!(
            culture.insight(&InsightRef::general(0)).unwrap().summary,
            "summary 1"
        );
    }
}
