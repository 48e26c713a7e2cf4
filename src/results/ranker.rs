//! Query relevance ranking

use super::types::ResultRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid token regex"));

/// Fields consulted, in order, for the descriptive text of a record
const BODY_FIELDS: [&str; 4] = ["body", "description", "snippet", "info"];

/// Reorders records by simple token overlap with the query
///
/// Records are bucketed by whether the title and the body mention any query
/// token. The sort is stable, so records in the same bucket keep their
/// aggregation order, and nothing is ever removed.
#[derive(Debug, Clone)]
pub struct SimpleFilterRanker {
    min_token_length: usize,
}

impl Default for SimpleFilterRanker {
    fn default() -> Self {
        Self::new(3)
    }
}

impl SimpleFilterRanker {
    /// Create a ranker ignoring query tokens shorter than `min_token_length`
    pub fn new(min_token_length: usize) -> Self {
        Self { min_token_length }
    }

    /// Lowercased query tokens used for matching
    pub fn tokens(&self, query: &str) -> HashSet<String> {
        let lower = query.to_lowercase();
        let all: HashSet<String> = TOKEN_SPLIT
            .split(&lower)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let long: HashSet<String> = all
            .iter()
            .filter(|t| t.chars().count() >= self.min_token_length)
            .cloned()
            .collect();

        if long.is_empty() {
            all
        } else {
            long
        }
    }

    /// Rank records against the query
    pub fn rank(&self, records: Vec<ResultRecord>, query: &str) -> Vec<ResultRecord> {
        let tokens = self.tokens(query);
        if tokens.is_empty() {
            return records;
        }

        let mut scored: Vec<(u8, ResultRecord)> = records
            .into_iter()
            .map(|record| (Self::bucket(&record, &tokens), record))
            .collect();

        scored.sort_by_key(|(bucket, _)| *bucket);
        scored.into_iter().map(|(_, record)| record).collect()
    }

    fn bucket(record: &ResultRecord, tokens: &HashSet<String>) -> u8 {
        let title = record.get_str("title").unwrap_or_default();
        let body = BODY_FIELDS
            .iter()
            .find_map(|field| record.get_str(field))
            .unwrap_or_default();

        match (mentions(title, tokens), mentions(body, tokens)) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

fn mentions(text: &str, tokens: &HashSet<String>) -> bool {
    if text.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    tokens.iter().any(|token| text.contains(token.as_str()))
}
