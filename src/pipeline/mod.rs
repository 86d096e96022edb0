// src/pipeline/mod.rs
// Pipeline controller: sequences analyze → persist → notify for one diff
//
// This is a best-effort enrichment layered on top of the scraping pipeline:
// no failure here ever propagates to the diff-ingestion caller. Everything
// is swallowed after logging and reported as a terminal state.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::analysis::{self, AnalysisResult, DiffPayload, ScrapeMetadata};
use crate::config::AiSettings;
use crate::error::Result;
use crate::llm::{AiClient, RequestPurpose, prompt};
use crate::notify::{DispatchPayload, EmailConfig, NotificationRouter};
use crate::store::{EmailConfigStore, ResultStore, SettingsStore, WebsiteStore};

/// Inbound invocation for one detected change
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub user_id: String,
    pub result_id: String,
    pub website_id: String,
    pub website_name: String,
    pub website_url: String,
    pub diff: DiffPayload,
    #[serde(default)]
    pub scrape: ScrapeMetadata,
}

/// Terminal (and intermediate) states of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Received,
    Analyzing,
    Analyzed,
    AnalysisSkipped,
    AnalysisFailed,
    Notified,
    NotificationSkipped,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::AnalysisSkipped => "analysis_skipped",
            Self::AnalysisFailed => "analysis_failed",
            Self::Notified => "notified",
            Self::NotificationSkipped => "notification_skipped",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-shot analysis-and-dispatch pipeline.
///
/// Each diff triggers one independent run; runs share no mutable state
/// beyond the durable store behind [`ResultStore`].
pub struct Pipeline {
    settings: Arc<dyn SettingsStore>,
    results: Arc<dyn ResultStore>,
    websites: Arc<dyn WebsiteStore>,
    email_configs: Arc<dyn EmailConfigStore>,
    client: AiClient,
    router: NotificationRouter,
}

impl Pipeline {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        results: Arc<dyn ResultStore>,
        websites: Arc<dyn WebsiteStore>,
        email_configs: Arc<dyn EmailConfigStore>,
        client: AiClient,
        router: NotificationRouter,
    ) -> Self {
        Self {
            settings,
            results,
            websites,
            email_configs,
            client,
            router,
        }
    }

    /// Run one diff through the state machine and return the terminal state.
    /// Never returns an error to the caller.
    pub async fn run(&self, job: AnalysisJob) -> RunState {
        info!(
            result_id = %job.result_id,
            website = %job.website_name,
            "analysis run received"
        );

        let settings = match self.settings.ai_settings(&job.user_id).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(result_id = %job.result_id, error = %e, "settings lookup failed, skipping analysis");
                return RunState::AnalysisSkipped;
            }
        };

        if !settings.analysis_available() {
            debug!(result_id = %job.result_id, "AI analysis disabled or API key absent, skipping");
            return RunState::AnalysisSkipped;
        }

        let result = match self.analyze(&settings, &job).await {
            Ok(result) => result,
            Err(e) => {
                warn!(result_id = %job.result_id, error = %e, "analysis failed");
                return RunState::AnalysisFailed;
            }
        };

        info!(
            result_id = %job.result_id,
            score = result.score,
            is_meaningful = result.is_meaningful,
            "analysis complete"
        );

        // Persistence must succeed before any dispatch is triggered.
        if let Err(e) = self.results.save_analysis(&job.result_id, &result).await {
            error!(result_id = %job.result_id, error = %e, "failed to persist analysis result");
            return RunState::AnalysisFailed;
        }

        self.notify(&job, result).await
    }

    async fn analyze(&self, settings: &AiSettings, job: &AnalysisJob) -> Result<AnalysisResult> {
        let context = prompt::analysis_context(&job.website_name, &job.website_url, &job.diff);
        let payload = self
            .client
            .exchange(
                settings,
                RequestPurpose::Analysis,
                settings.system_prompt_or_default(),
                &context,
            )
            .await?;
        analysis::evaluate(&payload, settings)
    }

    async fn notify(&self, job: &AnalysisJob, result: AnalysisResult) -> RunState {
        let delivery = match self
            .websites
            .delivery_settings(&job.website_id, &job.user_id)
            .await
        {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(result_id = %job.result_id, error = %e, "website lookup failed, skipping notification");
                return RunState::NotificationSkipped;
            }
        };

        let filters = match self.settings.filtering_prefs(&job.user_id).await {
            Ok(filters) => filters,
            Err(e) => {
                warn!(result_id = %job.result_id, error = %e, "filtering prefs lookup failed, skipping notification");
                return RunState::NotificationSkipped;
            }
        };

        // An email-config failure must not block the webhook channel;
        // fall back to "no verified address", which skips email silently.
        let email = match self.email_configs.email_config(&job.user_id).await {
            Ok(email) => email,
            Err(e) => {
                warn!(result_id = %job.result_id, error = %e, "email config lookup failed, email channel unavailable");
                EmailConfig::default()
            }
        };

        let payload = DispatchPayload {
            website_name: job.website_name.clone(),
            website_url: job.website_url.clone(),
            diff: job.diff.clone(),
            analysis: result,
            scrape: job.scrape.clone(),
        };

        let enqueued = self.router.dispatch(payload, &delivery, &filters, &email);
        if enqueued.is_empty() {
            debug!(result_id = %job.result_id, "no eligible notification channels");
            RunState::NotificationSkipped
        } else {
            info!(result_id = %job.result_id, channels = ?enqueued, "dispatch tasks enqueued");
            RunState::Notified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_as_str() {
        assert_eq!(RunState::Analyzed.as_str(), "analyzed");
        assert_eq!(RunState::AnalysisSkipped.as_str(), "analysis_skipped");
        assert_eq!(RunState::NotificationSkipped.to_string(), "notification_skipped");
    }

    #[test]
    fn test_job_deserializes_camel_case() {
        let json = r#"{
            "userId": "u1",
            "resultId": "r1",
            "websiteId": "w1",
            "websiteName": "Shop",
            "websiteUrl": "https://shop.example",
            "diff": {"text": "changed", "json": {"k": "v"}}
        }"#;
        let job: AnalysisJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.user_id, "u1");
        assert_eq!(job.result_id, "r1");
        assert_eq!(job.diff.text, "changed");
        assert!(job.scrape.title.is_none());
    }
}
