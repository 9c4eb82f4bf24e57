//! Registry of shown notifications
//!
//! [`NotificationSession`] gates delivery on a validated identity, allocates
//! ids for shown notifications, wires their outcome callbacks to the caller's
//! handler and tracks them until they are hidden or cleared.

pub mod dispatch;
pub mod handler;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{InitError, ShowError};
use crate::identity::{Identity, IdentityValidator, ShortcutResult};
use crate::platform::{Platform, ToastHandle};
use crate::template::ToastDocument;

pub use dispatch::ToastCallbacks;
pub use handler::{
    parse_action_index, Activation, ChannelHandler, DismissalReason, ToastEvent, ToastHandler,
};

/// Identifier of a shown notification. Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(u64);

impl ToastId {
    /// Value reported instead of an id when a notification could not be shown
    pub const INVALID_RAW: i64 = -1;

    pub(crate) fn new(raw: u64) -> Self {
        Self(raw & i64::MAX as u64)
    }

    /// Fresh random id
    fn generate() -> Self {
        Self::new(Uuid::new_v4().as_u128() as u64)
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(Self)
    }

    pub fn raw(&self) -> i64 {
        self.0 as i64
    }
}

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer form of a `show` result: the id, or [`ToastId::INVALID_RAW`]
pub fn id_or_invalid(result: &Result<ToastId, ShowError>) -> i64 {
    result.as_ref().map_or(ToastId::INVALID_RAW, ToastId::raw)
}

struct ToastRecord {
    handle: ToastHandle,
    callbacks: ToastCallbacks,
}

pub struct NotificationSession {
    platform: Arc<dyn Platform>,
    /// Identity notifications are issued under, set once initialized
    aumi: Option<String>,
    /// Identity already attached to the process
    registered: Option<String>,
    registry: Mutex<HashMap<ToastId, ToastRecord>>,
}

impl NotificationSession {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            aumi: None,
            registered: None,
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn is_initialized(&self) -> bool {
        self.aumi.is_some()
    }

    pub fn aumi(&self) -> Option<&str> {
        self.aumi.as_deref()
    }

    /// Validate the identity shortcut and register the identity with the
    /// process. The session stays uninitialized on any failure.
    pub fn initialize(&mut self, identity: &Identity) -> Result<ShortcutResult, InitError> {
        self.aumi = None;

        let result = IdentityValidator::new(self.platform.as_ref()).validate(identity)?;
        if !result.is_success() {
            error!("Shortcut validation ended in {}", result);
            return Err(InitError::Shortcut(result));
        }

        if self.registered.as_deref() != Some(identity.aumi()) {
            self.platform
                .register_process_identity(identity.aumi())
                .map_err(|e| {
                    error!("Error while attaching {} to the current process: {}", identity.aumi(), e);
                    InitError::Registration(e)
                })?;
            self.registered = Some(identity.aumi().to_string());
        }

        self.aumi = Some(identity.aumi().to_string());
        info!("Notifications initialized for {} ({})", identity.app_name(), result);
        Ok(result)
    }

    /// Drop back to the uninitialized state. Tracked notifications are kept.
    pub fn reset(&mut self) {
        self.aumi = None;
    }

    /// Submit a compiled document
    ///
    /// Nothing is stored unless the transport accepted the notification. A
    /// notification rejected after rendering is withdrawn and its handler is
    /// released without being called.
    pub fn show(
        &self,
        document: &ToastDocument,
        expiration: Duration,
        handler: Arc<dyn ToastHandler>,
    ) -> Result<ToastId, ShowError> {
        let Some(aumi) = self.aumi.as_deref() else {
            error!("Error when launching the toast: notifier is not initialized");
            return Err(ShowError::NotInitialized);
        };

        let id = self.allocate_id();
        let handle = self
            .platform
            .render_document(aumi, document, expiration_timestamp(expiration))?;

        let callbacks = ToastCallbacks::new(id, handler);
        let shown = self
            .platform
            .attach_callbacks(handle, callbacks.clone())
            .and_then(|()| self.platform.show(handle));
        if let Err(e) = shown {
            callbacks.suppress();
            if let Err(hide_err) = self.platform.hide(handle) {
                warn!("Failed to withdraw toast {} after {}: {}", handle, e, hide_err);
            }
            error!("Error when launching the toast: {}", e);
            return Err(e.into());
        }

        self.registry.lock().insert(id, ToastRecord { handle, callbacks });
        debug!("Toast {} shown as {}", id, handle);
        Ok(id)
    }

    /// Hide one notification. Returns false if the id is not tracked.
    ///
    /// A pending outcome callback is suppressed; callers must not expect a
    /// dismissal after an explicit hide.
    pub fn hide(&self, id: ToastId) -> bool {
        let Some(record) = self.registry.lock().remove(&id) else {
            return false;
        };

        record.callbacks.suppress();
        if let Err(e) = self.platform.hide(record.handle) {
            warn!("Failed to hide toast {}: {}", id, e);
        }
        true
    }

    /// Hide and forget every tracked notification, best effort
    pub fn clear(&self) {
        let records: Vec<ToastRecord> = self.registry.lock().drain().map(|(_, r)| r).collect();
        if records.is_empty() {
            return;
        }

        for record in &records {
            record.callbacks.suppress();
        }
        let handles: Vec<ToastHandle> = records.iter().map(|r| r.handle).collect();
        for (handle, e) in self.platform.hide_all(&handles) {
            warn!("Failed to hide toast {} while clearing: {}", handle, e);
        }
        debug!("Cleared {} toast(s)", records.len());
    }

    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.registry.lock().contains_key(&id)
    }

    pub fn active_ids(&self) -> Vec<ToastId> {
        let mut ids: Vec<ToastId> = self.registry.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Transport handle of a tracked notification
    pub fn handle(&self, id: ToastId) -> Option<ToastHandle> {
        self.registry.lock().get(&id).map(|r| r.handle)
    }

    fn allocate_id(&self) -> ToastId {
        let registry = self.registry.lock();
        loop {
            let id = ToastId::generate();
            if !registry.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Absolute expiration for a relative offset; zero means none. An offset
/// past the representable range also yields none, with a warning.
pub fn expiration_timestamp(offset: Duration) -> Option<DateTime<Utc>> {
    if offset.is_zero() {
        return None;
    }
    let expires_at = chrono::Duration::from_std(offset)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta));
    if expires_at.is_none() {
        warn!("Expiration of {:?} is out of range, toast will not expire", offset);
    }
    expires_at
}
