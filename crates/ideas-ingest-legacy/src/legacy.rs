//! The two pre-migration record shapes.
//!
//! Every field the old data may omit is an `Option` (or a defaulted `Vec`),
//! so a missing value is a checked state rather than a surprise at runtime.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what} legacy data: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A field the old data stores either as free text or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    /// One string; list items are joined with ", ".
    pub fn joined(&self) -> String {
        match self {
            TextOrList::Text(text) => text.trim().to_string(),
            TextOrList::List(items) => non_blank(items).collect::<Vec<_>>().join(", "),
        }
    }

    /// A list; free text becomes a single entry.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            TextOrList::Text(text) if text.trim().is_empty() => Vec::new(),
            TextOrList::Text(text) => vec![text.trim().to_string()],
            TextOrList::List(items) => non_blank(items).map(str::to_string).collect(),
        }
    }
}

fn non_blank(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Entry of the keyed "summary" collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryIdea {
    #[serde(default, deserialize_with = "legacy_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub investment_amount: Option<String>,
    pub time_to_market: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
    /// Review count or review list; carried by the format but not migrated.
    pub reviews: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub target_audience: Option<String>,
    pub market_size: Option<String>,
}

/// Entry of the "detailed" list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedIdea {
    #[serde(default, deserialize_with = "legacy_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub detailed_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub investment: Option<String>,
    pub time_to_market: Option<String>,
    pub market_analysis: Option<MarketAnalysis>,
    pub business_model: Option<String>,
    pub revenue_streams: Option<TextOrList>,
    pub competitive_advantage: Option<String>,
    pub challenges: Option<TextOrList>,
    pub required_skills: Option<TextOrList>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
}

/// One legacy record, tagged with the shape it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyIdea {
    Summary(SummaryIdea),
    Detailed(DetailedIdea),
}

impl LegacyIdea {
    pub fn original_id(&self) -> Option<u64> {
        match self {
            LegacyIdea::Summary(s) => s.id,
            LegacyIdea::Detailed(d) => d.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            LegacyIdea::Summary(s) => &s.title,
            LegacyIdea::Detailed(d) => &d.title,
        }
    }
}

/// Ids appear both as numbers and as numeric strings.
fn legacy_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid legacy id `{s}`"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SummaryFile {
    Keyed(BTreeMap<String, SummaryIdea>),
    Listed(Vec<SummaryIdea>),
}

/// Parse the summary file: an object keyed by id (a plain array is accepted
/// too). Entries come back in numeric key order, and an entry without an
/// `id` takes its key.
pub fn parse_summary(bytes: &[u8]) -> Result<Vec<SummaryIdea>, LegacyError> {
    let file: SummaryFile = serde_json::from_slice(bytes).map_err(|source| LegacyError::Parse {
        what: "summary",
        source,
    })?;

    let ideas = match file {
        SummaryFile::Listed(ideas) => ideas,
        SummaryFile::Keyed(map) => {
            let mut entries: Vec<(String, SummaryIdea)> = map.into_iter().collect();
            entries.sort_by_cached_key(|(key, _)| (key.trim().parse::<u64>().ok(), key.clone()));
            entries
                .into_iter()
                .map(|(key, mut idea)| {
                    if idea.id.is_none() {
                        idea.id = key.trim().parse().ok();
                    }
                    idea
                })
                .collect()
        }
    };
    Ok(ideas)
}

/// Parse the detailed file: a JSON array.
pub fn parse_detailed(bytes: &[u8]) -> Result<Vec<DetailedIdea>, LegacyError> {
    serde_json::from_slice(bytes).map_err(|source| LegacyError::Parse {
        what: "detailed",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_or_list_accepts_both_forms() {
        let list: TextOrList = serde_json::from_str(r#"["Funding", " ", "Competition"]"#).unwrap();
        assert_eq!(list.joined(), "Funding, Competition");
        assert_eq!(list.to_list(), vec!["Funding", "Competition"]);

        let text: TextOrList = serde_json::from_str(r#""Hiring is hard""#).unwrap();
        assert_eq!(text.joined(), "Hiring is hard");
        assert_eq!(text.to_list(), vec!["Hiring is hard"]);
    }

    #[test]
    fn test_summary_keys_fill_missing_ids_in_numeric_order() {
        let json = br#"{
            "10": { "title": "Ten" },
            "2": { "title": "Two", "id": "2" },
            "1": { "title": "One", "reviews": 4 }
        }"#;
        let ideas = parse_summary(json).unwrap();
        let titles: Vec<&str> = ideas.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Ten"]);
        assert_eq!(ideas[2].id, Some(10));
        assert_eq!(ideas[1].id, Some(2));
    }

    #[test]
    fn test_detailed_nested_fields() {
        let json = br#"[{
            "id": 3,
            "title": "Farm drones",
            "detailedDescription": "Spraying as a service",
            "marketAnalysis": { "targetAudience": "Farmers", "marketSize": "National" },
            "challenges": ["Regulation"],
            "revenueStreams": "Per-acre fees"
        }]"#;
        let ideas = parse_detailed(json).unwrap();
        let idea = &ideas[0];
        assert_eq!(idea.id, Some(3));
        assert_eq!(
            idea.market_analysis.as_ref().and_then(|m| m.target_audience.as_deref()),
            Some("Farmers")
        );
        assert_eq!(idea.revenue_streams, Some(TextOrList::Text("Per-acre fees".into())));
        assert!(idea.required_skills.is_none());
    }

    #[test]
    fn test_malformed_files_are_parse_errors() {
        assert!(matches!(
            parse_detailed(b"{\"not\": \"a list\"}"),
            Err(LegacyError::Parse { what: "detailed", .. })
        ));
        assert!(matches!(
            parse_summary(b"[1, 2"),
            Err(LegacyError::Parse { what: "summary", .. })
        ));
    }
}
