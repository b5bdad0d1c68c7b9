//! Core types for safe-fetch

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ErrorDetail;

/// Opaque name of one remote item (a URL or a resource key)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Create a new Identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for Identifier {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one fetch attempt
///
/// Exactly one variant is populated per identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult<R> {
    /// The fetcher produced a record
    Success {
        /// Identifier that was fetched
        identifier: Identifier,
        /// The retrieved record
        record: R,
    },

    /// The fetcher failed for this identifier
    Failure {
        /// Identifier that could not be fetched
        identifier: Identifier,
        /// Why the fetch failed
        error: ErrorDetail,
    },
}

impl<R> FetchResult<R> {
    /// Identifier this result belongs to
    pub fn identifier(&self) -> &Identifier {
        match self {
            FetchResult::Success { identifier, .. } | FetchResult::Failure { identifier, .. } => {
                identifier
            }
        }
    }

    /// Whether the fetch produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// Borrow the record, if any
    pub fn record(&self) -> Option<&R> {
        match self {
            FetchResult::Success { record, .. } => Some(record),
            FetchResult::Failure { .. } => None,
        }
    }

    /// Borrow the error detail, if any
    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { error, .. } => Some(error),
        }
    }
}

/// All per-identifier results of one batch, in input order
///
/// The success and failure views partition the results: they never overlap
/// and together cover every input identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchOutcome<R> {
    results: Vec<FetchResult<R>>,
}

impl<R> Default for BatchOutcome<R> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<R> BatchOutcome<R> {
    /// Wrap results that are already in input order
    pub fn new(results: Vec<FetchResult<R>>) -> Self {
        Self { results }
    }

    /// Number of results (equals the number of input identifiers)
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True for a batch with no identifiers
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// All results in input order
    pub fn results(&self) -> &[FetchResult<R>] {
        &self.results
    }

    /// Iterate over all results in input order
    pub fn iter(&self) -> std::slice::Iter<'_, FetchResult<R>> {
        self.results.iter()
    }

    /// Successful records in input order
    pub fn successes(&self) -> Vec<&R> {
        self.results.iter().filter_map(FetchResult::record).collect()
    }

    /// Failed identifiers with their error detail, in input order
    pub fn failures(&self) -> Vec<(&Identifier, &ErrorDetail)> {
        self.results
            .iter()
            .filter_map(|result| match result {
                FetchResult::Failure { identifier, error } => Some((identifier, error)),
                FetchResult::Success { .. } => None,
            })
            .collect()
    }

    /// Identifiers that produced no record, in input order
    pub fn failed_identifiers(&self) -> Vec<Identifier> {
        self.failures()
            .into_iter()
            .map(|(identifier, _)| identifier.clone())
            .collect()
    }

    /// Number of successful results
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of failed results
    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// True when no identifier failed (also true for an empty batch)
    pub fn is_complete_success(&self) -> bool {
        self.results.iter().all(FetchResult::is_success)
    }

    /// Consume the outcome and keep only the records, in input order
    pub fn into_successes(self) -> Vec<R> {
        self.into_parts().0
    }

    /// Consume the outcome into records and failures, both in input order
    pub fn into_parts(self) -> (Vec<R>, Vec<(Identifier, ErrorDetail)>) {
        let mut records = Vec::new();
        let mut failures = Vec::new();
        for result in self.results {
            match result {
                FetchResult::Success { record, .. } => records.push(record),
                FetchResult::Failure { identifier, error } => failures.push((identifier, error)),
            }
        }
        (records, failures)
    }

    /// Counts for this outcome, with the supplied wall-clock duration
    pub fn summary(&self, elapsed: Duration) -> BatchSummary {
        let succeeded = self.success_count();
        BatchSummary {
            total: self.len(),
            succeeded,
            failed: self.len() - succeeded,
            elapsed,
        }
    }
}

impl<R> IntoIterator for BatchOutcome<R> {
    type Item = FetchResult<R>;
    type IntoIter = std::vec::IntoIter<FetchResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a BatchOutcome<R> {
    type Item = &'a FetchResult<R>;
    type IntoIter = std::slice::Iter<'a, FetchResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Successes in input order (free-function form of [`BatchOutcome::successes`])
pub fn successes<R>(outcome: &BatchOutcome<R>) -> Vec<&R> {
    outcome.successes()
}

/// Failures in input order (free-function form of [`BatchOutcome::failures`])
pub fn failures<R>(outcome: &BatchOutcome<R>) -> Vec<(&Identifier, &ErrorDetail)> {
    outcome.failures()
}

/// Counts for one finished batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of identifiers in the batch
    pub total: usize,
    /// Number of identifiers that produced a record
    pub succeeded: usize,
    /// Number of identifiers that failed
    pub failed: usize,
    /// Wall-clock duration of the batch
    pub elapsed: Duration,
}

/// Event emitted while a batch runs
///
/// Consumers receive these through [`BatchFetcher::subscribe`](crate::BatchFetcher::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch started
    BatchStarted {
        /// Number of identifiers in the batch
        total: usize,
    },

    /// One identifier produced a record
    ItemSucceeded {
        /// Position of the identifier in the input
        index: usize,
        /// The identifier
        identifier: Identifier,
    },

    /// One identifier failed after all attempts
    ItemFailed {
        /// Position of the identifier in the input
        index: usize,
        /// The identifier
        identifier: Identifier,
        /// Why it failed
        error: ErrorDetail,
    },

    /// A batch finished
    BatchFinished {
        /// Number of identifiers that produced a record
        succeeded: usize,
        /// Number of identifiers that failed
        failed: usize,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: &str, record: u32) -> FetchResult<u32> {
        FetchResult::Success {
            identifier: id.into(),
            record,
        }
    }

    fn failed(id: &str) -> FetchResult<u32> {
        FetchResult::Failure {
            identifier: id.into(),
            error: ErrorDetail::new("fetch_failed", format!("no record for {id}")),
        }
    }

    #[test]
    fn identifier_conversions() {
        let from_str: Identifier = "goblin".into();
        let from_string: Identifier = String::from("goblin").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str, "goblin");
        assert_eq!(from_str.as_str(), "goblin");
        assert_eq!(from_str.to_string(), "goblin");
        assert_eq!(from_str.into_inner(), "goblin");
    }

    #[test]
    fn identifier_serializes_as_plain_string() {
        let json = serde_json::to_string(&Identifier::new("https://example.com/a")).unwrap();
        assert_eq!(json, r#""https://example.com/a""#);
    }

    #[test]
    fn views_partition_in_input_order() {
        let outcome = BatchOutcome::new(vec![ok("a", 1), failed("b"), ok("c", 3), failed("d")]);

        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.successes(), vec![&1, &3]);

        let failed_ids: Vec<&str> = outcome
            .failures()
            .into_iter()
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(failed_ids, vec!["b", "d"]);

        assert_eq!(outcome.success_count() + outcome.failure_count(), outcome.len());
        assert!(!outcome.is_complete_success());
    }

    #[test]
    fn free_function_views_match_methods() {
        let outcome = BatchOutcome::new(vec![failed("x"), ok("y", 7)]);
        assert_eq!(successes(&outcome), outcome.successes());
        assert_eq!(failures(&outcome), outcome.failures());
    }

    #[test]
    fn empty_outcome() {
        let outcome: BatchOutcome<u32> = BatchOutcome::default();
        assert!(outcome.is_empty());
        assert!(outcome.successes().is_empty());
        assert!(outcome.failures().is_empty());
        assert!(outcome.is_complete_success());
    }

    #[test]
    fn into_parts_keeps_order() {
        let outcome = BatchOutcome::new(vec![ok("a", 1), failed("b"), ok("c", 3)]);
        let (records, failures) = outcome.into_parts();
        assert_eq!(records, vec![1, 3]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "b");
        assert_eq!(failures[0].1.code, "fetch_failed");
    }

    #[test]
    fn summary_counts() {
        let outcome = BatchOutcome::new(vec![ok("a", 1), failed("b"), failed("c")]);
        let summary = outcome.summary(Duration::from_millis(250));
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                succeeded: 1,
                failed: 2,
                elapsed: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn fetch_result_serializes_tagged() {
        let json = serde_json::to_value(failed("b")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["identifier"], "b");
        assert_eq!(json["error"]["code"], "fetch_failed");

        let json = serde_json::to_value(ok("a", 1)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["record"], 1);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::ItemSucceeded {
            index: 2,
            identifier: "c".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "item_succeeded");
        assert_eq!(json["index"], 2);
        assert_eq!(json["identifier"], "c");
    }
}
