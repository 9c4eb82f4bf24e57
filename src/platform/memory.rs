//! In-process notification transport
//!
//! Keeps rendered notifications in memory until they are hidden and lets the
//! host deliver their outcomes by hand, from any thread. Used where no native transport is
//! available and to drive the session in tests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

use super::{Platform, ShortcutStore, ToastHandle};
use crate::error::PlatformError;
use crate::session::{DismissalReason, ToastCallbacks};
use crate::template::ToastDocument;

/// Snapshot of a notification held by [`MemoryPlatform`]
#[derive(Debug, Clone)]
pub struct MemoryToast {
    pub aumi: String,
    pub xml: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub shown: bool,
}

struct Entry {
    toast: MemoryToast,
    callbacks: Option<ToastCallbacks>,
}

#[derive(Default)]
struct State {
    toasts: HashMap<ToastHandle, Entry>,
    registered: Vec<String>,
    failing_hides: HashSet<ToastHandle>,
}

pub struct MemoryPlatform {
    compatible: bool,
    modern_features: bool,
    store: Box<dyn ShortcutStore>,
    state: Mutex<State>,
    next_handle: AtomicU64,
    runtime_init_calls: AtomicUsize,
    fail_runtime_init: AtomicBool,
    fail_registration: AtomicBool,
    fail_render: AtomicBool,
    fail_show: AtomicBool,
}

impl MemoryPlatform {
    /// Compatible transport with modern features
    pub fn new(store: impl ShortcutStore + 'static) -> Self {
        Self {
            compatible: true,
            modern_features: true,
            store: Box::new(store),
            state: Mutex::new(State::default()),
            next_handle: AtomicU64::new(1),
            runtime_init_calls: AtomicUsize::new(0),
            fail_runtime_init: AtomicBool::new(false),
            fail_registration: AtomicBool::new(false),
            fail_render: AtomicBool::new(false),
            fail_show: AtomicBool::new(false),
        }
    }

    pub fn with_compatible(mut self, compatible: bool) -> Self {
        self.compatible = compatible;
        self
    }

    pub fn with_modern_features(mut self, modern_features: bool) -> Self {
        self.modern_features = modern_features;
        self
    }

    pub fn set_fail_runtime_init(&self, fail: bool) {
        self.fail_runtime_init.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_registration(&self, fail: bool) {
        self.fail_registration.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_render(&self, fail: bool) {
        self.fail_render.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_show(&self, fail: bool) {
        self.fail_show.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_hide(&self, handle: ToastHandle, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_hides.insert(handle);
        } else {
            state.failing_hides.remove(&handle);
        }
    }

    pub fn runtime_init_calls(&self) -> usize {
        self.runtime_init_calls.load(Ordering::SeqCst)
    }

    pub fn registered_identities(&self) -> Vec<String> {
        self.state.lock().registered.clone()
    }

    pub fn toast(&self, handle: ToastHandle) -> Option<MemoryToast> {
        self.state.lock().toasts.get(&handle).map(|e| e.toast.clone())
    }

    pub fn rendered_handles(&self) -> Vec<ToastHandle> {
        let mut handles: Vec<ToastHandle> = self.state.lock().toasts.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Deliver an activation with the raw argument string. Returns whether
    /// the handler received it.
    pub fn activate(&self, handle: ToastHandle, arguments: Option<&str>) -> bool {
        self.callbacks(handle)
            .is_some_and(|callbacks| callbacks.activated(arguments))
    }

    /// Deliver a dismissal with a transport reason code
    pub fn dismiss(&self, handle: ToastHandle, reason_code: i32) -> bool {
        self.callbacks(handle)
            .is_some_and(|callbacks| callbacks.dismissed(DismissalReason::from_code(reason_code)))
    }

    pub fn fail(&self, handle: ToastHandle) -> bool {
        self.callbacks(handle)
            .is_some_and(|callbacks| callbacks.failed())
    }

    // Taken out so handlers never run under the state lock. A delivered
    // notification keeps no reference to its callbacks.
    fn callbacks(&self, handle: ToastHandle) -> Option<ToastCallbacks> {
        self.state
            .lock()
            .toasts
            .get_mut(&handle)
            .and_then(|e| e.callbacks.take())
    }
}

impl Platform for MemoryPlatform {
    fn is_compatible(&self) -> bool {
        self.compatible
    }

    fn supports_modern_features(&self) -> bool {
        self.modern_features
    }

    fn init_component_runtime(&self) -> Result<(), PlatformError> {
        self.runtime_init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_runtime_init.load(Ordering::SeqCst) {
            return Err(PlatformError::transport("component runtime unavailable"));
        }
        Ok(())
    }

    fn register_process_identity(&self, aumi: &str) -> Result<(), PlatformError> {
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(PlatformError::transport("identity registration rejected"));
        }
        self.state.lock().registered.push(aumi.to_string());
        Ok(())
    }

    fn render_document(
        &self,
        aumi: &str,
        document: &ToastDocument,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ToastHandle, PlatformError> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(PlatformError::transport("document rejected"));
        }
        let handle = ToastHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let toast = MemoryToast {
            aumi: aumi.to_string(),
            xml: document.to_xml(),
            expires_at,
            shown: false,
        };
        self.state.lock().toasts.insert(
            handle,
            Entry {
                toast,
                callbacks: None,
            },
        );
        Ok(handle)
    }

    fn attach_callbacks(
        &self,
        handle: ToastHandle,
        callbacks: ToastCallbacks,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let entry = state
            .toasts
            .get_mut(&handle)
            .ok_or(PlatformError::UnknownHandle(handle.raw()))?;
        entry.callbacks = Some(callbacks);
        Ok(())
    }

    fn show(&self, handle: ToastHandle) -> Result<(), PlatformError> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(PlatformError::transport("notification rejected"));
        }
        let mut state = self.state.lock();
        let entry = state
            .toasts
            .get_mut(&handle)
            .ok_or(PlatformError::UnknownHandle(handle.raw()))?;
        entry.toast.shown = true;
        debug!("Memory transport showing {}", handle);
        Ok(())
    }

    fn hide(&self, handle: ToastHandle) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if state.failing_hides.contains(&handle) {
            return Err(PlatformError::transport(format!("cannot hide {}", handle)));
        }
        state
            .toasts
            .remove(&handle)
            .ok_or(PlatformError::UnknownHandle(handle.raw()))?;
        debug!("Memory transport hid {}", handle);
        Ok(())
    }

    fn shortcuts(&self) -> &dyn ShortcutStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FileShortcutStore;
    use crate::session::{ChannelHandler, ToastHandler, ToastId};
    use crate::template::{Layout, ToastDocument};
    use std::sync::Arc;

    #[test]
    fn test_render_show_hide() {
        let platform = MemoryPlatform::new(FileShortcutStore::new());
        let document = ToastDocument::skeleton(Layout::Text01);

        let handle = platform.render_document("Demo.ID", &document, None).unwrap();
        assert!(!platform.toast(handle).unwrap().shown);
        platform.show(handle).unwrap();
        assert!(platform.toast(handle).unwrap().shown);
        platform.hide(handle).unwrap();
        assert!(platform.toast(handle).is_none());
        assert!(matches!(
            platform.hide(handle),
            Err(PlatformError::UnknownHandle(_))
        ));
    }

    #[test]
    fn test_unknown_handle() {
        let platform = MemoryPlatform::new(FileShortcutStore::new());
        let missing = ToastHandle::new(99);
        assert!(matches!(
            platform.show(missing),
            Err(PlatformError::UnknownHandle(99))
        ));
        assert!(!platform.activate(missing, None));
    }

    #[test]
    fn test_hide_all_reports_failures() {
        let platform = MemoryPlatform::new(FileShortcutStore::new());
        let document = ToastDocument::skeleton(Layout::Text01);
        let handles: Vec<ToastHandle> = (0..3)
            .map(|_| platform.render_document("Demo.ID", &document, None).unwrap())
            .collect();
        platform.set_fail_hide(handles[0], true);

        let failures = platform.hide_all(&handles);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, handles[0]);
        assert_eq!(platform.rendered_handles(), vec![handles[0]]);
    }

    #[test]
    fn test_transport_releases_callbacks() {
        let platform = MemoryPlatform::new(FileShortcutStore::new());
        let document = ToastDocument::skeleton(Layout::Text01);
        let (handler, _rx) = ChannelHandler::channel();
        let handler: Arc<dyn ToastHandler> = Arc::new(handler);

        let delivered = platform.render_document("Demo.ID", &document, None).unwrap();
        platform
            .attach_callbacks(delivered, ToastCallbacks::new(ToastId::new(1), handler.clone()))
            .unwrap();
        let hidden = platform.render_document("Demo.ID", &document, None).unwrap();
        platform
            .attach_callbacks(hidden, ToastCallbacks::new(ToastId::new(2), handler.clone()))
            .unwrap();
        assert_eq!(Arc::strong_count(&handler), 3);

        assert!(platform.dismiss(delivered, 2));
        assert!(!platform.dismiss(delivered, 2));
        platform.hide(hidden).unwrap();
        assert_eq!(Arc::strong_count(&handler), 1);
        assert_eq!(platform.rendered_handles(), vec![delivered]);
    }

    #[test]
    fn test_fail_show() {
        let platform = MemoryPlatform::new(FileShortcutStore::new());
        let document = ToastDocument::skeleton(Layout::Text01);
        let handle = platform.render_document("Demo.ID", &document, None).unwrap();
        platform.set_fail_show(true);
        assert!(matches!(platform.show(handle), Err(PlatformError::Transport(_))));
        assert!(!platform.toast(handle).unwrap().shown);
    }

    #[test]
    fn test_capability_flags() {
        let platform = MemoryPlatform::new(FileShortcutStore::new())
            .with_compatible(false)
            .with_modern_features(false);
        assert!(!platform.is_compatible());
        assert!(!platform.supports_modern_features());
    }
}
