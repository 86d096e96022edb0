// src/notify/mod.rs
// Notification channel eligibility and routing

pub mod queue;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::AnalysisResult;

pub use queue::{
    DispatchPayload, DispatchQueue, DispatchSender, DispatchTask, spawn_dispatch_worker,
};

/// Per-website setting selecting which channels are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPreference {
    None,
    Webhook,
    Email,
    Both,
}

impl NotificationPreference {
    pub fn includes_webhook(&self) -> bool {
        matches!(self, Self::Webhook | Self::Both)
    }

    pub fn includes_email(&self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }
}

impl fmt::Display for NotificationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Webhook => write!(f, "webhook"),
            Self::Email => write!(f, "email"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Per-user filtering rules, independent per channel
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringPrefs {
    #[serde(default)]
    pub webhook_only_if_meaningful: bool,
    #[serde(default)]
    pub email_only_if_meaningful: bool,
}

/// Delivery settings for one website
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySettings {
    pub preference: NotificationPreference,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Email configuration for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl EmailConfig {
    /// A verified address on file; absence is a silent skip, not an error
    pub fn deliverable(&self) -> bool {
        self.is_verified && self.email.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Webhook,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pure eligibility decision for one analysis result.
pub fn eligible_channels(
    result: &AnalysisResult,
    delivery: &DeliverySettings,
    filters: &FilteringPrefs,
    email: &EmailConfig,
) -> Vec<Channel> {
    let mut channels = Vec::new();

    if delivery.preference.includes_webhook()
        && delivery.webhook_url.is_some()
        && (!filters.webhook_only_if_meaningful || result.is_meaningful)
    {
        channels.push(Channel::Webhook);
    }

    if delivery.preference.includes_email()
        && (!filters.email_only_if_meaningful || result.is_meaningful)
    {
        if email.deliverable() {
            channels.push(Channel::Email);
        } else {
            debug!("no verified email address on file, skipping email channel");
        }
    }

    channels
}

/// Decides channel eligibility and enqueues one zero-delay dispatch task per
/// eligible channel. Returns as soon as enqueuing completes; delivery is the
/// external sender's responsibility.
pub struct NotificationRouter {
    queue: DispatchQueue,
}

impl NotificationRouter {
    pub fn new(queue: DispatchQueue) -> Self {
        Self { queue }
    }

    /// Enqueue tasks for all eligible channels. Enqueue failures are caught
    /// per channel so one channel cannot block the other. Returns the
    /// channels actually enqueued.
    pub fn dispatch(
        &self,
        payload: DispatchPayload,
        delivery: &DeliverySettings,
        filters: &FilteringPrefs,
        email: &EmailConfig,
    ) -> Vec<Channel> {
        let mut enqueued = Vec::new();

        for channel in eligible_channels(&payload.analysis, delivery, filters, email) {
            let task = DispatchTask {
                channel,
                payload: payload.clone(),
                delay: Duration::ZERO,
            };
            match self.queue.enqueue(task) {
                Ok(()) => enqueued.push(channel),
                Err(e) => {
                    warn!(%channel, error = %e, "failed to enqueue dispatch task");
                }
            }
        }

        enqueued
    }
}
