// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide state shared by every handle of one instance.
//!
//! A scope is keyed by (state directory, instance id). It owns the device
//! state store, the operation queue and the instance lock, and runs the
//! single worker that drains the queue. Handles never keep a scope: they
//! look it up on every call, so a scope torn down by `shutdown` or `clear`
//! is transparently reopened by the next call.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ps_core::{DeviceStateStore, InstanceLock, InstancePaths, OpPayload, OperationQueue};

use crate::coordinator::Settings;
use crate::error::{Error, Result};
use crate::worker;

/// Progress of this installation's registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// Not registered yet, or a registration is waiting in the queue.
    Pending,
    Registered(String),
    /// The registry permanently refused the last registration.
    Failed(String),
}

/// Files owned by a live scope.
pub(crate) struct LocalState {
    pub(crate) store: DeviceStateStore,
    pub(crate) queue: OperationQueue,
    _lock: InstanceLock,
}

impl LocalState {
    fn open(paths: &InstancePaths) -> ps_core::Result<Self> {
        let lock = InstanceLock::acquire(paths)?;
        let store = DeviceStateStore::open(paths.clone())?;
        let queue = OperationQueue::open(&paths.queue())?;
        Ok(LocalState {
            store,
            queue,
            _lock: lock,
        })
    }

    /// Returns true if a registration is waiting in the queue.
    pub(crate) fn is_registering(&self) -> bool {
        self.queue.any(|op| matches!(op, OpPayload::Register { .. }))
    }

    /// Returns true once the device is registered or a registration is
    /// queued. Interest changes made before that are kept local only.
    pub(crate) fn is_started(&self) -> bool {
        self.store.device_id().is_some() || self.is_registering()
    }
}

pub(crate) struct Scope {
    paths: InstancePaths,
    local: Mutex<Option<LocalState>>,
    wake: Notify,
    registration: watch::Sender<RegistrationStatus>,
    pending: watch::Sender<usize>,
    cancel: CancellationToken,
    worker: OnceLock<JoinHandle<()>>,
}

type ScopeMap = HashMap<InstancePaths, Arc<Scope>>;

static SCOPES: LazyLock<Mutex<ScopeMap>> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn scopes() -> MutexGuard<'static, ScopeMap> {
    SCOPES.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scope {
    /// Returns the live scope for `settings`, opening it and spawning its
    /// worker on first use.
    pub(crate) fn acquire(settings: &Arc<Settings>) -> Result<Arc<Scope>> {
        let mut scopes = scopes();
        if let Some(scope) = scopes.get(&settings.paths) {
            if scope.is_alive() {
                return Ok(Arc::clone(scope));
            }
            // The runtime that ran the worker is gone.
            tracing::debug!(instance_id = settings.paths.instance_id(), "reopening instance");
            if let Some(stale) = scopes.remove(&settings.paths) {
                stale.close();
            }
        }

        let local = LocalState::open(&settings.paths)?;
        let status = match local.store.device_id() {
            Some(id) => RegistrationStatus::Registered(id.to_string()),
            None => RegistrationStatus::Pending,
        };
        let pending = local.queue.len();

        let scope = Arc::new(Scope {
            paths: settings.paths.clone(),
            local: Mutex::new(Some(local)),
            wake: Notify::new(),
            registration: watch::channel(status).0,
            pending: watch::channel(pending).0,
            cancel: CancellationToken::new(),
            worker: OnceLock::new(),
        });
        let handle = settings
            .runtime
            .spawn(worker::run(Arc::clone(&scope), Arc::clone(settings)));
        let _ = scope.worker.set(handle);
        scopes.insert(settings.paths.clone(), Arc::clone(&scope));

        tracing::debug!(
            instance_id = settings.paths.instance_id(),
            pending,
            "opened instance"
        );
        Ok(scope)
    }

    /// Stops the worker of the live scope at `paths` and releases its files.
    ///
    /// Returns false if no scope was live.
    pub(crate) fn release(paths: &InstancePaths) -> bool {
        let Some(scope) = scopes().remove(paths) else {
            return false;
        };
        scope.close();
        true
    }

    fn close(&self) {
        self.cancel.cancel();
        // Dropping the local state releases the instance lock right away,
        // even while the worker is still winding down.
        self.lock().take();
        tracing::debug!(instance_id = self.paths.instance_id(), "closed instance");
    }

    fn is_alive(&self) -> bool {
        !self.cancel.is_cancelled() && self.worker.get().is_some_and(|w| !w.is_finished())
    }

    pub(crate) fn instance_id(&self) -> &str {
        self.paths.instance_id()
    }

    fn lock(&self) -> MutexGuard<'_, Option<LocalState>> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the local state under the scope lock.
    ///
    /// Afterwards the queue length is published and the worker woken, still
    /// under the lock so observers never see counts out of order.
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut LocalState) -> Result<T>) -> Result<T> {
        let mut guard = self.lock();
        let local = guard.as_mut().ok_or(Error::Stopped)?;
        let result = f(local);
        let pending = local.queue.len();
        self.pending.send_replace(pending);
        if pending > 0 {
            self.wake.notify_one();
        }
        result
    }

    /// Like [`mutate`](Self::mutate), for caller-facing operations: if `f`
    /// fails, the operations it pushed are removed again, so an error means
    /// nothing reaches the registry.
    pub(crate) fn submit<T>(&self, f: impl FnOnce(&mut LocalState) -> Result<T>) -> Result<T> {
        self.mutate(|local| {
            let mark = local.queue.next_seq();
            let result = f(local);
            if result.is_err() {
                if let Err(e) = local.queue.discard_from(mark) {
                    tracing::error!(
                        instance_id = self.instance_id(),
                        "failed to withdraw rejected operations: {}",
                        e
                    );
                }
            }
            result
        })
    }

    /// Reads the local state under the scope lock.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&LocalState) -> T) -> Result<T> {
        let guard = self.lock();
        let local = guard.as_ref().ok_or(Error::Stopped)?;
        Ok(f(local))
    }

    pub(crate) fn set_registration(&self, status: RegistrationStatus) {
        self.registration.send_replace(status);
    }

    pub(crate) fn registration(&self) -> watch::Receiver<RegistrationStatus> {
        self.registration.subscribe()
    }

    pub(crate) fn pending(&self) -> watch::Receiver<usize> {
        self.pending.subscribe()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves when new work was queued since the last call.
    pub(crate) async fn woken(&self) {
        self.wake.notified().await;
    }
}
