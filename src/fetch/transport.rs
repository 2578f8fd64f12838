//! Network access for the remote catalog.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
   config::Config,
   error::{HttpError, Result},
};

/// Fetches one catalog document by URL.
///
/// The downloader only ever needs raw response bodies, so tests can swap in
/// an in-memory implementation.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
   async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed transport. Timeouts are enforced per request.
pub struct HttpTransport {
   client: reqwest::Client,
}

impl HttpTransport {
   pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
      let client = reqwest::Client::builder()
         .timeout(timeout)
         .user_agent(user_agent)
         .build()
         .map_err(HttpError::Request)?;
      Ok(Self { client })
   }

   pub fn from_config(cfg: &Config) -> Result<Self> {
      Self::new(cfg.request_timeout(), &cfg.user_agent)
   }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
   async fn get(&self, url: &str) -> Result<Vec<u8>> {
      tracing::debug!("GET {url}");
      let response = self
         .client
         .get(url)
         .send()
         .await
         .map_err(HttpError::Request)?;

      if !response.status().is_success() {
         return Err(
            HttpError::StatusCode { url: url.to_string(), status: response.status().as_u16() }.into(),
         );
      }

      let bytes = response.bytes().await.map_err(HttpError::Request)?;
      Ok(bytes.to_vec())
   }
}
