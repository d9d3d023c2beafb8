use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use super::errors::ApiError;
use crate::delivery::ReportSink;
use crate::models::{LeaveTarget, TerminationReport};

/// HTTP client for the platform's video analytics endpoints.
#[derive(Clone, Debug)]
pub struct AnalyticsApi {
    client: reqwest::Client,
    base_url: Url,
}

impl AnalyticsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from_reqwest)?;

        Self::with_client(client, base_url)
    }

    /// Share an existing connection pool
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(base_url.to_string()));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{orgId}/video/{videoId}/leave`, with ids percent-encoded
    pub fn leave_url(&self, target: &LeaveTarget) -> Result<Url, ApiError> {
        target
            .leave_url(&self.base_url)
            .ok_or_else(|| ApiError::InvalidEndpoint(self.base_url.to_string()))
    }

    /// Post a leave report and wait for the backend to acknowledge it
    pub async fn post_leave(
        &self,
        target: &LeaveTarget,
        report: &TerminationReport,
    ) -> Result<(), ApiError> {
        let url = self.leave_url(target)?;
        debug!(
            "Posting leave report for session {} to {}",
            report.session_id, url
        );

        let response = self.client.post(url).json(report).send().await?;
        Self::check_status(response).await
    }

    /// Post an already-serialized JSON body, as queued by the beacon
    pub async fn post_json_bytes(&self, url: &str, body: Vec<u8>) -> Result<(), ApiError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            // Response bodies are informational only
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), body))
    }
}

#[async_trait]
impl ReportSink for AnalyticsApi {
    async fn send_report(
        &self,
        target: &LeaveTarget,
        report: &TerminationReport,
    ) -> Result<(), ApiError> {
        self.post_leave(target, report).await
    }
}
