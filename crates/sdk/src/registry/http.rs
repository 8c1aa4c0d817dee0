// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of [`Registry`] using reqwest.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};

use ps_core::{DeviceMetadata, InterestSet};

use super::{RegisterDeviceResult, Registry, RegistryError, RegistryFuture, RegistryResult};
use crate::error::{Error, Result};

/// Header identifying the client library on every request.
pub const LIBRARY_HEADER: &str = "X-Pusher-Library";

const UNKNOWN_REASON: &str = "Unknown Service Error";
const UNKNOWN_DESCRIPTION: &str = "Something went wrong";

/// Default registry location for an instance.
pub fn default_base_url(instance_id: &str) -> String {
    format!("https://{instance_id}.pushnotifications.pusher.com/device_api/v1/")
}

pub(crate) fn library_version() -> String {
    format!("pushsync-rust {}", env!("CARGO_PKG_VERSION"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    token: &'a str,
    known_previous_client_ids: &'a [String],
    metadata: &'a DeviceMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    id: String,
    #[serde(default)]
    initial_interest_set: InterestSet,
}

#[derive(Serialize)]
struct SetSubscriptionsRequest<'a> {
    interests: &'a InterestSet,
}

#[derive(Serialize)]
struct RefreshTokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    description: String,
}

/// Decodes a non-2xx response into a rejection.
///
/// Bodies that are not the registry's `{error, description}` shape are
/// reported with a generic reason.
pub(crate) fn decode_error(status: u16, body: &str) -> RegistryError {
    let (reason, description) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (parsed.error, parsed.description),
        Err(e) => {
            tracing::warn!(status, "failed to parse error body `{}`: {}", body, e);
            (UNKNOWN_REASON.to_string(), UNKNOWN_DESCRIPTION.to_string())
        }
    };
    RegistryError::Rejected {
        status,
        reason,
        description,
    }
}

/// Registry client speaking the device API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: Client,
    base_url: Url,
    instance_id: String,
}

impl HttpRegistry {
    /// Creates a client for `instance_id`.
    ///
    /// `base_url` overrides the default registry location.
    pub fn new(instance_id: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let raw = base_url.map_or_else(|| default_base_url(instance_id), str::to_string);
        let base_url =
            Url::parse(&raw).map_err(|e| Error::Config(format!("invalid base url '{raw}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid base url '{raw}'")));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(HttpRegistry {
            client,
            base_url,
            instance_id: instance_id.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `instances/{instance}/devices/fcm/<segments...>`.
    ///
    /// Each segment is percent-encoded on its own, so interest names can
    /// never address a different path.
    pub(crate) fn devices_url(&self, segments: &[&str]) -> RegistryResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::Transport(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["instances", self.instance_id.as_str(), "devices", "fcm"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> RegistryResult<Response> {
        let response = request
            .header(LIBRARY_HEADER, library_version())
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(decode_error(status.as_u16(), &body))
    }

    async fn send_unit(&self, request: RequestBuilder) -> RegistryResult<()> {
        self.send(request).await.map(|_| ())
    }
}

impl Registry for HttpRegistry {
    fn register<'a>(
        &'a self,
        token: &'a str,
        known_previous_device_ids: &'a [String],
        metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, RegisterDeviceResult> {
        Box::pin(async move {
            let url = self.devices_url(&[])?;
            let body = RegisterRequest {
                token,
                known_previous_client_ids: known_previous_device_ids,
                metadata,
            };
            let response = self.send(self.client.post(url).json(&body)).await?;
            let parsed: RegisterResponse = response
                .json()
                .await
                .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
            Ok(RegisterDeviceResult {
                device_id: parsed.id,
                initial_interests: parsed.initial_interest_set,
            })
        })
    }

    fn subscribe<'a>(&'a self, device_id: &'a str, interest: &'a str) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "interests", interest])?;
            self.send_unit(self.client.post(url)).await
        })
    }

    fn unsubscribe<'a>(
        &'a self,
        device_id: &'a str,
        interest: &'a str,
    ) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "interests", interest])?;
            self.send_unit(self.client.delete(url)).await
        })
    }

    fn set_subscriptions<'a>(
        &'a self,
        device_id: &'a str,
        interests: &'a InterestSet,
    ) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "interests"])?;
            let body = SetSubscriptionsRequest { interests };
            self.send_unit(self.client.put(url).json(&body)).await
        })
    }

    fn refresh_token<'a>(&'a self, device_id: &'a str, token: &'a str) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "token"])?;
            let body = RefreshTokenRequest { token };
            self.send_unit(self.client.put(url).json(&body)).await
        })
    }

    fn set_metadata<'a>(
        &'a self,
        device_id: &'a str,
        metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "metadata"])?;
            self.send_unit(self.client.put(url).json(metadata)).await
        })
    }

    fn set_user_id<'a>(
        &'a self,
        device_id: &'a str,
        user_id: &'a str,
        bearer_token: &'a str,
    ) -> RegistryFuture<'a, ()> {
        Box::pin(async move {
            let url = self.devices_url(&[device_id, "user"])?;
            tracing::debug!(device_id, user_id, "associating device with user");
            self.send_unit(self.client.put(url).bearer_auth(bearer_token))
                .await
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
