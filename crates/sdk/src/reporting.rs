// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery and open analytics.
//!
//! Reports are fire-and-forget: each one is posted from a detached task and
//! failures are only logged. Nothing here can block or fail the caller.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::registry::{decode_error, library_version, RegistryError, LIBRARY_HEADER};

/// Default reporting location for an instance.
pub fn default_reporting_url(instance_id: &str) -> String {
    format!("https://{instance_id}.pushnotifications.pusher.com/reporting_api/v2/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportEventType {
    Delivery,
    Open,
}

/// Something that happened to a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// The user opened the notification.
    Open {
        device_id: String,
        publish_id: String,
        timestamp_secs: i64,
    },
    /// The notification reached the device.
    Delivery {
        device_id: String,
        publish_id: String,
        timestamp_secs: i64,
        app_in_background: bool,
        has_displayable_content: bool,
        has_data: bool,
    },
}

impl ReportEvent {
    /// An open event stamped with the current time.
    pub fn open(device_id: impl Into<String>, publish_id: impl Into<String>) -> Self {
        ReportEvent::Open {
            device_id: device_id.into(),
            publish_id: publish_id.into(),
            timestamp_secs: Utc::now().timestamp(),
        }
    }

    /// A delivery event stamped with the current time.
    pub fn delivery(
        device_id: impl Into<String>,
        publish_id: impl Into<String>,
        app_in_background: bool,
        has_displayable_content: bool,
        has_data: bool,
    ) -> Self {
        ReportEvent::Delivery {
            device_id: device_id.into(),
            publish_id: publish_id.into(),
            timestamp_secs: Utc::now().timestamp(),
            app_in_background,
            has_displayable_content,
            has_data,
        }
    }

    pub fn event_type(&self) -> ReportEventType {
        match self {
            ReportEvent::Open { .. } => ReportEventType::Open,
            ReportEvent::Delivery { .. } => ReportEventType::Delivery,
        }
    }

    fn request(&self) -> ReportingRequest<'_> {
        match self {
            ReportEvent::Open {
                device_id,
                publish_id,
                timestamp_secs,
            } => ReportingRequest {
                event: ReportEventType::Open,
                publish_id,
                device_id,
                timestamp_secs: *timestamp_secs,
                app_in_background: None,
                has_displayable_content: None,
                has_data: None,
            },
            ReportEvent::Delivery {
                device_id,
                publish_id,
                timestamp_secs,
                app_in_background,
                has_displayable_content,
                has_data,
            } => ReportingRequest {
                event: ReportEventType::Delivery,
                publish_id,
                device_id,
                timestamp_secs: *timestamp_secs,
                app_in_background: Some(*app_in_background),
                has_displayable_content: Some(*has_displayable_content),
                has_data: Some(*has_data),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportingRequest<'a> {
    event: ReportEventType,
    publish_id: &'a str,
    device_id: &'a str,
    timestamp_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_in_background: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_displayable_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_data: Option<bool>,
}

/// Posts report events to the reporting API.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: Client,
    events_url: Url,
    runtime: Handle,
}

impl HttpReporter {
    /// Creates a reporter bound to the current tokio runtime.
    pub fn new(instance_id: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::Config("reporting requires a tokio runtime".to_string()))?;
        let raw = base_url.map_or_else(|| default_reporting_url(instance_id), str::to_string);
        let mut events_url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid reporting url '{raw}': {e}")))?;
        events_url
            .path_segments_mut()
            .map_err(|()| Error::Config(format!("invalid reporting url '{raw}'")))?
            .pop_if_empty()
            .extend(["instances", instance_id, "events"]);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(HttpReporter {
            client,
            events_url,
            runtime,
        })
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }

    /// Sends `event` in the background.
    ///
    /// The returned handle may be dropped; the report is sent regardless.
    pub fn report(&self, event: ReportEvent) -> JoinHandle<()> {
        let client = self.client.clone();
        let url = self.events_url.clone();
        self.runtime.spawn(async move {
            match submit(&client, url, &event).await {
                Ok(()) => tracing::debug!(event = ?event.event_type(), "reported event"),
                Err(e) => {
                    tracing::warn!(event = ?event.event_type(), "failed to report event: {}", e)
                }
            }
        })
    }
}

async fn submit(
    client: &Client,
    url: Url,
    event: &ReportEvent,
) -> std::result::Result<(), RegistryError> {
    let response = client
        .post(url)
        .header(LIBRARY_HEADER, library_version())
        .json(&event.request())
        .send()
        .await
        .map_err(|e| RegistryError::Transport(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(decode_error(status.as_u16(), &body))
    }
}

#[cfg(test)]
#[path = "reporting_tests.rs"]
mod tests;
