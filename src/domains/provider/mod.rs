//! Market-data provider domain.
//!
//! Tools never talk to the network directly. They ask a
//! [`MarketDataProvider`] for a dataset and get back a [`Payload`]; the
//! provider reports failures as [`ProviderError`], already classified for
//! the pipeline's retry decisions.

mod error;
mod http;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::core::pipeline::Payload;

pub use error::ProviderError;
pub use http::HttpProvider;

/// Query parameters sent with a dataset request, in order.
pub type Query = Vec<(&'static str, String)>;

/// Source of market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the dataset at `path` (relative to the provider root).
    ///
    /// Arrays of objects come back as [`Payload::Table`], anything else as
    /// [`Payload::Scalar`].
    async fn fetch(&self, path: &str, query: &[(&'static str, String)]) -> Result<Payload, ProviderError>;
}
