// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use pushsync::registry::{RegisterDeviceResult, Registry, RegistryError, RegistryFuture};
use pushsync::{
    Backoff, DeviceMetadata, InterestSet, RetryPolicy, RetryStrategy, SyncCoordinator,
    SyncCoordinatorBuilder,
};

pub use tempfile::TempDir;

pub const INSTANCE: &str = "8f9a6e22-2483-49aa-8552-125f1a4c5781";

/// One request as seen by [`FakeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register {
        token: String,
        known_previous_device_ids: Vec<String>,
    },
    Subscribe {
        device_id: String,
        interest: String,
    },
    Unsubscribe {
        device_id: String,
        interest: String,
    },
    SetSubscriptions {
        device_id: String,
        interests: InterestSet,
    },
    RefreshToken {
        device_id: String,
        token: String,
    },
    SetMetadata {
        device_id: String,
    },
    SetUserId {
        device_id: String,
        user_id: String,
        bearer_token: String,
    },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Register { .. } => "register",
            Request::Subscribe { .. } => "subscribe",
            Request::Unsubscribe { .. } => "unsubscribe",
            Request::SetSubscriptions { .. } => "set_subscriptions",
            Request::RefreshToken { .. } => "refresh_token",
            Request::SetMetadata { .. } => "set_metadata",
            Request::SetUserId { .. } => "set_user_id",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub request: Request,
}

#[derive(Default)]
struct Server {
    calls: Vec<Call>,
    /// Scripted status and remaining count per request kind.
    failures: HashMap<&'static str, (u16, usize)>,
    devices: HashMap<String, InterestSet>,
    users: HashMap<String, String>,
    /// Device id handed out per (token, known previous ids).
    registrations: HashMap<(String, Vec<String>), String>,
    next_id: usize,
}

/// In-memory registry that records every request and can be scripted to
/// fail.
///
/// Registering the same token with the same known previous ids returns the
/// same device while the registry still knows it.
///
/// Device-scoped requests for unknown devices fail with 404, like the real
/// registry after it forgot a device.
#[derive(Default)]
pub struct FakeRegistry {
    server: Mutex<Server>,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeRegistry::default())
    }

    /// Fails the next `times` requests of `kind` with `status`.
    pub fn fail(&self, kind: &'static str, status: u16, times: usize) {
        self.server
            .lock()
            .unwrap()
            .failures
            .insert(kind, (status, times));
    }

    /// Drops every scripted failure.
    pub fn heal(&self) {
        self.server.lock().unwrap().failures.clear();
    }

    /// Forgets a device, as the registry does after an uninstall.
    pub fn forget(&self, device_id: &str) {
        self.server.lock().unwrap().devices.remove(device_id);
    }

    /// Adds a device the registry already knows.
    pub fn seed(&self, device_id: &str, interests: &[&str]) {
        let set = interests.iter().map(|i| i.to_string()).collect();
        self.server
            .lock()
            .unwrap()
            .devices
            .insert(device_id.to_string(), set);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.calls().into_iter().map(|c| c.request).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.request.kind() == kind)
            .count()
    }

    /// Interests the registry holds for `device_id`.
    pub fn interests(&self, device_id: &str) -> Option<InterestSet> {
        self.server.lock().unwrap().devices.get(device_id).cloned()
    }

    pub fn user(&self, device_id: &str) -> Option<String> {
        self.server.lock().unwrap().users.get(device_id).cloned()
    }

    fn handle<T>(
        &self,
        request: Request,
        apply: impl FnOnce(&mut Server) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut server = self.server.lock().unwrap();
        let kind = request.kind();
        server.calls.push(Call {
            at: Instant::now(),
            request,
        });
        if let Some((status, remaining)) = server.failures.get_mut(kind) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(rejected(*status));
            }
        }
        apply(&mut server)
    }

    fn device_op(
        &self,
        request: Request,
        device_id: &str,
        apply: impl FnOnce(&mut InterestSet),
    ) -> Result<(), RegistryError> {
        self.handle(request, |server| match server.devices.get_mut(device_id) {
            Some(interests) => {
                apply(interests);
                Ok(())
            }
            None => Err(rejected(404)),
        })
    }
}

fn rejected(status: u16) -> RegistryError {
    RegistryError::Rejected {
        status,
        reason: "Scripted".to_string(),
        description: format!("scripted failure {status}"),
    }
}

impl Registry for FakeRegistry {
    fn register<'a>(
        &'a self,
        token: &'a str,
        known_previous_device_ids: &'a [String],
        _metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, RegisterDeviceResult> {
        let request = Request::Register {
            token: token.to_string(),
            known_previous_device_ids: known_previous_device_ids.to_vec(),
        };
        let result = self.handle(request, |server| {
            let key = (token.to_string(), known_previous_device_ids.to_vec());
            if let Some(device_id) = server.registrations.get(&key).cloned() {
                if let Some(interests) = server.devices.get(&device_id) {
                    return Ok(RegisterDeviceResult {
                        initial_interests: interests.clone(),
                        device_id,
                    });
                }
            }

            let initial_interests = known_previous_device_ids
                .iter()
                .find_map(|id| server.devices.get(id).cloned())
                .unwrap_or_default();
            server.next_id += 1;
            let device_id = format!("device-{}", server.next_id);
            server
                .devices
                .insert(device_id.clone(), initial_interests.clone());
            server.registrations.insert(key, device_id.clone());
            Ok(RegisterDeviceResult {
                device_id,
                initial_interests,
            })
        });
        Box::pin(async move { result })
    }

    fn subscribe<'a>(&'a self, device_id: &'a str, interest: &'a str) -> RegistryFuture<'a, ()> {
        let request = Request::Subscribe {
            device_id: device_id.to_string(),
            interest: interest.to_string(),
        };
        let result = self.device_op(request, device_id, |set| {
            set.insert(interest.to_string());
        });
        Box::pin(async move { result })
    }

    fn unsubscribe<'a>(
        &'a self,
        device_id: &'a str,
        interest: &'a str,
    ) -> RegistryFuture<'a, ()> {
        let request = Request::Unsubscribe {
            device_id: device_id.to_string(),
            interest: interest.to_string(),
        };
        let result = self.device_op(request, device_id, |set| {
            set.remove(interest);
        });
        Box::pin(async move { result })
    }

    fn set_subscriptions<'a>(
        &'a self,
        device_id: &'a str,
        interests: &'a InterestSet,
    ) -> RegistryFuture<'a, ()> {
        let request = Request::SetSubscriptions {
            device_id: device_id.to_string(),
            interests: interests.clone(),
        };
        let result = self.device_op(request, device_id, |set| set.clone_from(interests));
        Box::pin(async move { result })
    }

    fn refresh_token<'a>(&'a self, device_id: &'a str, token: &'a str) -> RegistryFuture<'a, ()> {
        let request = Request::RefreshToken {
            device_id: device_id.to_string(),
            token: token.to_string(),
        };
        let result = self.device_op(request, device_id, |_| {});
        Box::pin(async move { result })
    }

    fn set_metadata<'a>(
        &'a self,
        device_id: &'a str,
        _metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, ()> {
        let request = Request::SetMetadata {
            device_id: device_id.to_string(),
        };
        let result = self.device_op(request, device_id, |_| {});
        Box::pin(async move { result })
    }

    fn set_user_id<'a>(
        &'a self,
        device_id: &'a str,
        user_id: &'a str,
        bearer_token: &'a str,
    ) -> RegistryFuture<'a, ()> {
        let request = Request::SetUserId {
            device_id: device_id.to_string(),
            user_id: user_id.to_string(),
            bearer_token: bearer_token.to_string(),
        };
        let result = self.handle(request, |server| {
            if !server.devices.contains_key(device_id) {
                return Err(rejected(404));
            }
            server
                .users
                .insert(device_id.to_string(), user_id.to_string());
            Ok(())
        });
        Box::pin(async move { result })
    }
}

/// Retry strategy with the default schedule.
pub fn strategy(policy: RetryPolicy) -> RetryStrategy {
    RetryStrategy::new(Backoff::default(), policy)
}

/// Builder for `dir` talking to `registry`.
pub fn builder(dir: &TempDir, registry: &Arc<FakeRegistry>) -> SyncCoordinatorBuilder {
    SyncCoordinator::builder(INSTANCE)
        .state_dir(dir.path())
        .registry(Arc::clone(registry) as Arc<dyn Registry>)
        .metadata(DeviceMetadata::new("0.0.0-test", "test"))
}

pub fn coordinator(dir: &TempDir, registry: &Arc<FakeRegistry>) -> SyncCoordinator {
    builder(dir, registry).build().unwrap()
}

pub fn set(items: &[&str]) -> InterestSet {
    items.iter().map(|i| i.to_string()).collect()
}
