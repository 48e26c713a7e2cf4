//! Aggregation of records from several backends with de-duplication

use super::types::ResultRecord;
use std::collections::HashSet;

/// Identity fields used by the search facade
pub const DEFAULT_IDENTITY_FIELDS: [&str; 4] = ["href", "image", "url", "embed_url"];

/// Accumulates records in insertion order, dropping duplicates
///
/// A record is a duplicate when any of its identity-field values has already
/// been seen on an accepted record. Fields absent from a record are ignored
/// for that record.
#[derive(Debug, Clone)]
pub struct ResultsAggregator {
    identity_fields: Vec<String>,
    seen: HashSet<String>,
    records: Vec<ResultRecord>,
}

impl Default for ResultsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FIELDS)
    }
}

impl ResultsAggregator {
    /// Create an aggregator keyed by the given identity fields
    pub fn new<I, S>(identity_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity_fields: identity_fields.into_iter().map(Into::into).collect(),
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Add records, returning how many were accepted
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        let before = self.records.len();
        for record in records {
            self.push(record);
        }
        self.records.len() - before
    }

    /// Add one record, returning whether it was accepted
    pub fn push(&mut self, record: ResultRecord) -> bool {
        let signature: Vec<String> = self
            .identity_fields
            .iter()
            .filter_map(|field| record.identity_value(field))
            .collect();

        if signature.iter().any(|value| self.seen.contains(value)) {
            return false;
        }

        self.seen.extend(signature);
        self.records.push(record);
        true
    }

    /// Number of accepted records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been accepted yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identity fields fixed at construction
    pub fn identity_fields(&self) -> &[String] {
        &self.identity_fields
    }

    /// Accepted records in first-accepted order
    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}
