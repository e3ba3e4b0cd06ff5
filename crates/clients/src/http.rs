//! Shared authenticated JSON transport with bounded retries.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

const MAX_RETRIES: usize = 3;
const RETRY_DELAYS: [u64; 4] = [0, 1, 2, 4];

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Bearer-token JSON client rooted at one base URL.
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ClientInit(e.to_string()))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned(), token })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let response = self.send(|| self.request(Method::GET, &url).query(query)).await?;
        decode(response, path).await
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response =
            self.send(|| self.request(Method::POST, &url).query(query).json(body)).await?;
        decode(response, path).await
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.url(path);
        let response = self.send(|| self.request(Method::GET, &url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
    }

    /// Sends the request built by `build`, retrying transient failures.
    async fn send<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<ClientError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_secs = RETRY_DELAYS.get(attempt).copied().unwrap_or(4);
                let delay = Duration::from_secs(delay_secs);
                tokio::time::sleep(delay).await;
                tracing::warn!(
                    base_url = %self.base_url,
                    "API retry attempt {attempt}/{MAX_RETRIES} after {delay:?}"
                );
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    let err = ClientError::HttpRequest(e);
                    if err.is_transient() {
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                },
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            let err = ClientError::HttpStatus { code: status.as_u16(), body: truncate(&body, 500).to_owned() };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(ClientError::RetriesExhausted(Box::new(
            last_error.unwrap_or_else(|| ClientError::MissingField("response".to_owned())),
        )))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, ClientError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::JsonParse {
        context: format!("{context} (body: {})", truncate(&body, 200)),
        source: e,
    })
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn test_truncate_within_limit() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exceeds_limit() {
        assert_eq!(truncate("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_unicode_boundary() {
        let result = truncate("привет", 3);
        assert_eq!(result, "п");
    }
}
