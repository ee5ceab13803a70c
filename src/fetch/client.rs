use crate::config::CollectorConfig;
use crate::error::{CollectError, FetchError};
use anyhow::{Context, Result};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client as HttpClient, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

const USER_AGENT: &str = concat!("registrations-harmonizer/", env!("CARGO_PKG_VERSION"));

/// HTTP access to remote publishers.
///
/// Redirects are followed by hand so the hop count stays bounded and the body
/// of every skipped hop is drained. Calls to the same host are spaced by the
/// politeness delay, and a transient failure is retried once.
pub struct Fetcher {
    http_client: HttpClient,
    max_redirects: usize,
    politeness_delay: Duration,
    retry_delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl Fetcher {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .redirect(Policy::none())
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            max_redirects: config.max_redirects,
            politeness_delay: config.politeness_delay(),
            retry_delay: config.retry_delay(),
            next_slot: Mutex::new(HashMap::new()),
        })
    }

    /// Downloads the first candidate that answers with a success status.
    ///
    /// Candidates are tried in order; a success short-circuits the rest.
    /// Fails with `NotFound` only once every candidate has failed.
    pub async fn fetch(&self, candidates: &[String]) -> Result<Vec<u8>, CollectError> {
        for url in candidates {
            match self.retry_once(url, || self.fetch_one(url)).await {
                Ok(body) => {
                    tracing::debug!(url = %url, bytes = body.len(), "Fetched document");
                    return Ok(body);
                }
                Err(e) => tracing::debug!(url = %url, error = %e, "Candidate failed"),
            }
        }
        Err(CollectError::not_found(candidates.iter().cloned()))
    }

    /// GET returning a deserialized JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CollectError> {
        let body = self
            .retry_once(url, || async {
                let request = self.http_client.get(parse_url(url)?).query(query);
                self.send(url, request).await
            })
            .await
            .map_err(exhausted)?;
        decode_json(&body)
    }

    /// POST of a JSON request body, returning a deserialized JSON body.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T, CollectError> {
        let body = self
            .retry_once(url, || async {
                let request = self.http_client.post(parse_url(url)?).json(payload);
                self.send(url, request).await
            })
            .await
            .map_err(exhausted)?;
        decode_json(&body)
    }

    async fn retry_once<F, Fut, T>(&self, url: &str, call: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match call().await {
            Err(e) if e.is_transient() => {
                tracing::warn!(url = %url, error = %e, "Transient failure, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                call().await
            }
            other => other,
        }
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut current = parse_url(url)?;

        for _ in 0..=self.max_redirects {
            self.pace(&current).await;
            let response = self
                .http_client
                .get(current.clone())
                .send()
                .await
                .map_err(|source| FetchError::Transient {
                    url: current.to_string(),
                    source,
                })?;
            let status = response.status();

            if status.is_redirection() {
                let next = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|location| response.url().join(location).ok());
                // drain the hop so the connection can be reused
                let _ = response.bytes().await;
                match next {
                    Some(next) => {
                        tracing::trace!(from = %current, to = %next, "Following redirect");
                        current = next;
                        continue;
                    }
                    None => return Err(FetchError::MissingLocation(current.to_string())),
                }
            }

            if !status.is_success() {
                let _ = response.bytes().await;
                return Err(FetchError::Status {
                    url: current.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|source| FetchError::Transient {
                    url: current.to_string(),
                    source,
                })?;
            return Ok(body.to_vec());
        }

        Err(FetchError::TooManyRedirects(url.to_string()))
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Vec<u8>, FetchError> {
        if let Ok(parsed) = Url::parse(url) {
            self.pace(&parsed).await;
        }
        let transient = |source| FetchError::Transient {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(transient)?;
        let status = response.status();
        if !status.is_success() {
            let _ = response.bytes().await;
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(transient)?;
        Ok(body.to_vec())
    }

    /// Waits for this host's next politeness slot and reserves the following one.
    async fn pace(&self, url: &Url) {
        if self.politeness_delay.is_zero() {
            return;
        }
        let host = url.host_str().unwrap_or_default().to_string();
        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(&host).copied().filter(|s| *s > now).unwrap_or(now);
            slots.insert(host, slot + self.politeness_delay);
            slot
        };
        sleep_until(slot).await;
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// A transient failure that survived its retry counts as a missing document.
fn exhausted(err: FetchError) -> CollectError {
    if err.is_transient() {
        CollectError::not_found([err.url().to_string()])
    } else {
        err.into()
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, CollectError> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    Ok(serde_json::from_slice(body)?)
}
