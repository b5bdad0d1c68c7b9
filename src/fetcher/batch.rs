//! [`BatchFetcher`]: runs a [`Fetcher`] over an ordered set of identifiers.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;

use crate::config::{Config, RetryConfig};
use crate::error::{ErrorDetail, Result};
use crate::retry::fetch_with_retry;
use crate::types::{BatchOutcome, Event, FetchResult, Identifier};

use super::Fetcher;

/// Runs a [`Fetcher`] over many identifiers without letting one failure abort the rest
///
/// With `fetch.concurrency == 1` identifiers are attempted one after another.
/// Higher values run up to that many attempts at once; results are put back
/// into input order before they are returned either way.
pub struct BatchFetcher {
    config: Config,
    event_tx: broadcast::Sender<Event>,
}

impl BatchFetcher {
    /// Create a batch fetcher
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: Config) -> Self {
        let (event_tx, _) = broadcast::channel(config.fetch.event_capacity);
        Self { config, event_tx }
    }

    /// The configuration this fetcher runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to batch progress events
    ///
    /// Only events sent after subscribing are received. A slow receiver that
    /// falls more than `fetch.event_capacity` events behind gets `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Fetch every identifier and collect one result per identifier, in input order
    ///
    /// Duplicates are attempted independently. An empty input yields an empty
    /// outcome. Individual failures (after retries) become
    /// [`FetchResult::Failure`] entries; this method itself never fails.
    pub async fn fetch_all<F, I>(&self, identifiers: I, fetcher: &F) -> BatchOutcome<F::Record>
    where
        F: Fetcher + ?Sized,
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let identifiers: Vec<Identifier> = identifiers.into_iter().map(Into::into).collect();
        let total = identifiers.len();
        let concurrency = self.config.fetch.concurrency;
        let started = Instant::now();

        tracing::info!(total, concurrency, "Starting fetch batch");
        self.event_tx.send(Event::BatchStarted { total }).ok();

        let results = if concurrency <= 1 {
            let mut results = Vec::with_capacity(total);
            for (index, identifier) in identifiers.into_iter().enumerate() {
                results.push(self.attempt(index, identifier, fetcher).await);
            }
            results
        } else {
            let mut indexed: Vec<(usize, FetchResult<F::Record>)> =
                stream::iter(identifiers.into_iter().enumerate())
                    .map(|(index, identifier)| async move {
                        (index, self.attempt(index, identifier, fetcher).await)
                    })
                    .buffer_unordered(concurrency)
                    .collect()
                    .await;

            // Completion order is arbitrary; restore input order
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, result)| result).collect()
        };

        let outcome = BatchOutcome::new(results);
        let summary = outcome.summary(started.elapsed());

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis(),
            "Fetch batch finished"
        );
        self.event_tx
            .send(Event::BatchFinished {
                succeeded: summary.succeeded,
                failed: summary.failed,
            })
            .ok();

        outcome
    }

    /// Run one identifier through the retry policy and wrap the result
    async fn attempt<F>(
        &self,
        index: usize,
        identifier: Identifier,
        fetcher: &F,
    ) -> FetchResult<F::Record>
    where
        F: Fetcher + ?Sized,
    {
        let outcome =
            fetch_with_retry(&self.config.retry, || fetcher.fetch_one(&identifier)).await;

        match outcome.result {
            Ok(record) => {
                tracing::debug!(
                    index,
                    identifier = %identifier,
                    attempts = outcome.attempts,
                    "Fetched record"
                );
                self.event_tx
                    .send(Event::ItemSucceeded {
                        index,
                        identifier: identifier.clone(),
                    })
                    .ok();
                FetchResult::Success { identifier, record }
            }
            Err(e) => {
                let error = ErrorDetail::from_error(&e, outcome.attempts);
                tracing::warn!(
                    index,
                    identifier = %identifier,
                    code = %error.code,
                    attempts = outcome.attempts,
                    error = %e,
                    "Fetch failed, recording and continuing"
                );
                self.event_tx
                    .send(Event::ItemFailed {
                        index,
                        identifier: identifier.clone(),
                        error: error.clone(),
                    })
                    .ok();
                FetchResult::Failure { identifier, error }
            }
        }
    }
}

/// Fetch every identifier sequentially, without retries, and collect the outcome
///
/// Shorthand for a [`BatchFetcher`] with default settings and
/// [`RetryConfig::disabled`].
pub async fn fetch_all<F, I>(identifiers: I, fetcher: &F) -> BatchOutcome<F::Record>
where
    F: Fetcher + ?Sized,
    I: IntoIterator,
    I::Item: Into<Identifier>,
{
    let config = Config {
        retry: RetryConfig::disabled(),
        ..Config::default()
    };
    BatchFetcher::with_validated(config)
        .fetch_all(identifiers, fetcher)
        .await
}
