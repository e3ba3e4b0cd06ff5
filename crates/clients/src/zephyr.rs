//! Zephyr Scale Cloud REST API v2 client.
//!
//! List endpoints are offset-paginated (`startAt` / `maxResults` / `isLast`); every
//! read here drains all pages before returning.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use ztoq_core::{
    SOURCE_PAGE_SIZE, SourceClient, ZephyrAttachment, ZephyrFolder, ZephyrProject, ZephyrTestCase,
    ZephyrTestCycle, ZephyrTestExecution, ZephyrTestStep,
};

use crate::error::ClientError;
use crate::http::{ApiClient, DEFAULT_TIMEOUT_SECS};

/// Public Zephyr Scale Cloud endpoint.
pub const DEFAULT_ZEPHYR_BASE_URL: &str = "https://api.zephyrscale.smartbear.com/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    is_last: Option<bool>,
    #[serde(default)]
    total: Option<usize>,
}

impl<T> Page<T> {
    fn is_final(&self, fetched: usize) -> bool {
        if self.values.is_empty() {
            return true;
        }
        match (self.is_last, self.total) {
            (Some(is_last), _) => is_last,
            (None, Some(total)) => fetched >= total,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepEntry {
    #[serde(default)]
    inline: Option<InlineStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineStep {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    test_data: Option<String>,
    #[serde(default)]
    expected_result: Option<String>,
}

/// Client for one Zephyr Scale tenant.
#[derive(Debug, Clone)]
pub struct ZephyrClient {
    api: ApiClient,
    page_size: usize,
}

impl ZephyrClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: &str, api_token: String) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(base_url, api_token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            page_size: SOURCE_PAGE_SIZE,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Drains every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        let mut start_at = 0usize;
        loop {
            let mut query = filters.to_vec();
            query.push(("startAt", start_at.to_string()));
            query.push(("maxResults", self.page_size.to_string()));

            let page: Page<T> = self.api.get_json(path, &query).await?;
            let received = page.values.len();
            let next = page.start_at.max(start_at) + received;
            let done = page.is_final(items.len() + received);
            items.extend(page.values);
            tracing::debug!(path, start_at, received, total = items.len(), "fetched page");
            if done {
                return Ok(items);
            }
            start_at = next;
        }
    }
}

#[async_trait]
impl SourceClient for ZephyrClient {
    async fn get_project(&self, project_key: &str) -> Result<ZephyrProject> {
        Ok(self.api.get_json(&format!("projects/{project_key}"), &[]).await?)
    }

    async fn get_folders(&self, project_key: &str) -> Result<Vec<ZephyrFolder>> {
        Ok(self.get_all("folders", &[("projectKey", project_key.to_owned())]).await?)
    }

    async fn get_test_cases(&self, project_key: &str) -> Result<Vec<ZephyrTestCase>> {
        Ok(self.get_all("testcases", &[("projectKey", project_key.to_owned())]).await?)
    }

    async fn get_test_steps(&self, test_case_key: &str) -> Result<Vec<ZephyrTestStep>> {
        let entries: Vec<StepEntry> =
            self.get_all(&format!("testcases/{test_case_key}/teststeps"), &[]).await?;
        let steps = entries
            .into_iter()
            .filter_map(|entry| entry.inline)
            .zip(1u32..)
            .map(|(inline, index)| ZephyrTestStep {
                index,
                description: inline.description,
                test_data: inline.test_data,
                expected_result: inline.expected_result,
            })
            .collect();
        Ok(steps)
    }

    async fn get_test_cycles(&self, project_key: &str) -> Result<Vec<ZephyrTestCycle>> {
        Ok(self.get_all("testcycles", &[("projectKey", project_key.to_owned())]).await?)
    }

    async fn get_test_executions(&self, project_key: &str) -> Result<Vec<ZephyrTestExecution>> {
        Ok(self.get_all("testexecutions", &[("projectKey", project_key.to_owned())]).await?)
    }

    async fn download_attachment(&self, attachment: &ZephyrAttachment) -> Result<Vec<u8>> {
        let url = attachment
            .url
            .as_deref()
            .ok_or_else(|| ClientError::MissingField(format!("url of attachment {}", attachment.id)))?;
        Ok(self.api.get_bytes(url).await?)
    }
}
