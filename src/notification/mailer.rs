//! Thin client for the transactional email provider

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;

use crate::config::MailConfig;

#[derive(Debug, Serialize, Clone)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Posts JSON messages to the provider's send endpoint
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn message(&self, to: &str, subject: &str, text: &str) -> EmailMessage {
        EmailMessage {
            from: self.config.from_address.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        }
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.client.post(&self.config.api_url).json(message);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("Email provider unreachable")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email provider returned {}: {}", status, body);
        }

        Ok(())
    }
}
