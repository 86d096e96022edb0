// src/store.rs
// Collaborator traits for the durable state this pipeline reads and writes
//
// Persistence lives outside this crate; failures at these seams are opaque
// external errors, not part of the pipeline's own taxonomy.

use async_trait::async_trait;

use crate::analysis::AnalysisResult;
use crate::config::AiSettings;
use crate::notify::{DeliverySettings, EmailConfig, FilteringPrefs};

/// Per-user settings lookup
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn ai_settings(&self, user_id: &str) -> anyhow::Result<AiSettings>;

    async fn filtering_prefs(&self, user_id: &str) -> anyhow::Result<FilteringPrefs>;
}

/// Analysis result persistence, keyed by diff result id.
/// Last-write-once per identifier: each diff produces its own result.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save_analysis(&self, result_id: &str, result: &AnalysisResult) -> anyhow::Result<()>;
}

/// Per-website delivery settings lookup
#[async_trait]
pub trait WebsiteStore: Send + Sync {
    async fn delivery_settings(
        &self,
        website_id: &str,
        user_id: &str,
    ) -> anyhow::Result<DeliverySettings>;
}

/// Per-user email configuration lookup
#[async_trait]
pub trait EmailConfigStore: Send + Sync {
    async fn email_config(&self, user_id: &str) -> anyhow::Result<EmailConfig>;
}
