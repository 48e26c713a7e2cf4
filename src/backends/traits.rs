//! Backend traits and types

use crate::error::BackendError;
use crate::results::ResultRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of result requested from the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Images,
    News,
    Videos,
    Books,
}

impl Category {
    /// All supported categories
    pub const ALL: [Category; 5] = [
        Category::Text,
        Category::Images,
        Category::News,
        Category::Videos,
        Category::Books,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Images => "images",
            Self::News => "news",
            Self::Videos => "videos",
            Self::Books => "books",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Safe search level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    On,
    #[default]
    Moderate,
    Off,
}

impl FromStr for SafeSearch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "strict" => Ok(Self::On),
            "moderate" => Ok(Self::Moderate),
            "off" => Ok(Self::Off),
            other => Err(format!("unknown safesearch level: {other}")),
        }
    }
}

/// Time limit filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeLimit {
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "m")]
    Month,
    #[serde(rename = "y")]
    Year,
}

impl TimeLimit {
    /// Single-letter code used by most providers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "m",
            Self::Year => "y",
        }
    }
}

impl FromStr for TimeLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" | "day" => Ok(Self::Day),
            "w" | "week" => Ok(Self::Week),
            "m" | "month" => Ok(Self::Month),
            "y" | "year" => Ok(Self::Year),
            other => Err(format!("unknown timelimit: {other}")),
        }
    }
}

/// Parameters passed to every backend search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Search query string
    pub query: String,
    /// Region code such as `us-en`
    pub region: String,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Time limit filter
    pub timelimit: Option<TimeLimit>,
    /// Page number (1-indexed)
    pub page: u32,
    /// Backend-specific options
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            region: "us-en".to_string(),
            safesearch: SafeSearch::default(),
            timelimit: None,
            page: 1,
            extra: HashMap::new(),
        }
    }

    /// Language part of the region code (`us-en` -> `en`)
    pub fn language(&self) -> &str {
        self.region
            .split_once('-')
            .map(|(_, lang)| lang)
            .filter(|lang| !lang.is_empty())
            .unwrap_or("en")
    }

    /// Country part of the region code (`us-en` -> `us`)
    pub fn country(&self) -> &str {
        self.region
            .split_once('-')
            .map(|(country, _)| country)
            .filter(|country| !country.is_empty())
            .unwrap_or("us")
    }
}

/// Static identity of a backend implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendDescriptor {
    /// Implementation name, unique per backend type
    pub name: &'static str,
    /// Underlying service; backends sharing it are queried at most once per call
    pub provider: &'static str,
    /// Higher is preferred
    pub priority: i32,
    /// Category served
    pub category: Category,
}

/// Capability every search backend provides
#[async_trait]
pub trait Backend: Send + Sync {
    /// Static identity of this backend
    fn descriptor(&self) -> &BackendDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name
    }

    fn provider(&self) -> &str {
        self.descriptor().provider
    }

    fn priority(&self) -> i32 {
        self.descriptor().priority
    }

    /// Run a search and return raw records
    async fn search(&self, params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("music".parse::<Category>().is_err());
    }

    #[test]
    fn test_region_parts() {
        let mut params = SearchParams::new("rust");
        assert_eq!(params.country(), "us");
        assert_eq!(params.language(), "en");

        params.region = "de-de".to_string();
        assert_eq!(params.country(), "de");
        assert_eq!(params.language(), "de");

        params.region = "garbage".to_string();
        assert_eq!(params.language(), "en");
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!("strict".parse::<SafeSearch>(), Ok(SafeSearch::On));
        assert_eq!("w".parse::<TimeLimit>(), Ok(TimeLimit::Week));
        assert!("fortnight".parse::<TimeLimit>().is_err());
    }
}
