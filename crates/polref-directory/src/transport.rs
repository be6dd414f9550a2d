//! The HTTP seam.
//!
//! The client only ever issues redirect-following GETs, so that is all a
//! transport has to provide. Tests substitute an in-process fake.

use std::{future::Future, time::Duration};

use polref_core::{Error, Result};
use reqwest::{Client, redirect};

use crate::config::DirectoryConfig;

/// A completed GET, after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
  pub status:    u16,
  /// The URL the last redirect landed on.
  pub final_url: String,
  pub body:      Vec<u8>,
}

impl Fetched {
  pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

pub trait Transport: Send + Sync {
  /// GET `url`, following redirects. A non-success status is not an error
  /// at this layer.
  fn get(&self, url: &str) -> impl Future<Output = Result<Fetched>> + Send;
}

// ─── reqwest ─────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
  client: Client,
}

impl ReqwestTransport {
  pub fn new(config: &DirectoryConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(config.user_agent.clone())
      .redirect(redirect::Policy::limited(10))
      .build()
      .map_err(|e| Error::Transport(Box::new(e)))?;
    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  async fn get(&self, url: &str) -> Result<Fetched> {
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| Error::Transport(Box::new(e)))?;

    let status = resp.status().as_u16();
    let final_url = resp.url().to_string();
    let body = resp
      .bytes()
      .await
      .map_err(|e| Error::Transport(Box::new(e)))?
      .to_vec();
    Ok(Fetched { status, final_url, body })
  }
}
