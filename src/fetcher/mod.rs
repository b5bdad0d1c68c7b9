//! Batch fetching with per-identifier failure capture.
//!
//! - [`Fetcher`] - the per-identifier fetch contract supplied by a collaborator
//! - [`fetch_fn`] - adapts an async closure into a [`Fetcher`]
//! - [`batch`] - [`BatchFetcher`], which runs a fetcher over many identifiers
//!
//! A failing identifier never stops the batch: its error is recorded next to
//! the identifier and the remaining identifiers are still attempted.

mod batch;


pub use batch::{BatchFetcher, fetch_all};

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::Identifier;

/// Retrieves one record for one identifier
///
/// Implementations own their timeout and transport policy. Returning `Err`
/// marks only this identifier as failed.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Record produced for a successful fetch
    type Record: Send;

    /// Fetch the record named by `identifier`
    async fn fetch_one(&self, identifier: &Identifier) -> Result<Self::Record>;
}

#[async_trait]
impl<T> Fetcher for Arc<T>
where
    T: Fetcher + ?Sized,
{
    type Record = T::Record;

    async fn fetch_one(&self, identifier: &Identifier) -> Result<Self::Record> {
        (**self).fetch_one(identifier).await
    }
}

/// [`Fetcher`] backed by an async closure, see [`fetch_fn`]
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap an async closure as a [`Fetcher`]
///
/// ```no_run
/// use safe_fetch::{Identifier, fetch_all, fetch_fn};
///
/// # async fn example() {
/// let fetcher = fetch_fn(|id: Identifier| async move {
///     Ok::<_, safe_fetch::Error>(id.as_str().len())
/// });
/// let outcome = fetch_all(["a", "bb"], &fetcher).await;
/// assert_eq!(outcome.successes(), vec![&1, &2]);
/// # }
/// ```
pub fn fetch_fn<F, Fut, R>(f: F) -> FnFetcher<F>
where
    F: Fn(Identifier) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R>> + Send,
    R: Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut, R> Fetcher for FnFetcher<F>
where
    F: Fn(Identifier) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R>> + Send,
    R: Send,
{
    type Record = R;

    async fn fetch_one(&self, identifier: &Identifier) -> Result<R> {
        (self.f)(identifier.clone()).await
    }
}
