//! Once-only delivery of notification outcomes

use parking_lot::Mutex;
use std::sync::Arc;

use super::handler::{parse_action_index, Activation, DismissalReason, ToastHandler};
use super::ToastId;

/// The three outcome callbacks of one notification
///
/// Clones share the handler slot, so the transport and the session registry
/// can both hold them. The first of `activated`, `dismissed` or `failed` to
/// run takes the handler out of the slot and is delivered; every later call,
/// and every call after the session hid the notification, is dropped. Once
/// the slot is empty the caller's handler is no longer referenced.
#[derive(Clone)]
pub struct ToastCallbacks {
    id: ToastId,
    handler: Arc<Mutex<Option<Arc<dyn ToastHandler>>>>,
}

impl ToastCallbacks {
    pub(crate) fn new(id: ToastId, handler: Arc<dyn ToastHandler>) -> Self {
        Self {
            id,
            handler: Arc::new(Mutex::new(Some(handler))),
        }
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    /// Whether an outcome can still be delivered
    pub fn is_pending(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver an activation. `arguments` is the raw string the transport
    /// echoed back; anything but a non-negative integer counts as a body tap.
    pub fn activated(&self, arguments: Option<&str>) -> bool {
        let Some(handler) = self.claim() else {
            return false;
        };
        let activation = arguments
            .and_then(parse_action_index)
            .map_or(Activation::Body, Activation::Action);
        handler.activated(activation);
        true
    }

    pub fn dismissed(&self, reason: DismissalReason) -> bool {
        let Some(handler) = self.claim() else {
            return false;
        };
        handler.dismissed(reason);
        true
    }

    pub fn failed(&self) -> bool {
        let Some(handler) = self.claim() else {
            return false;
        };
        handler.failed();
        true
    }

    pub(crate) fn suppress(&self) {
        self.handler.lock().take();
    }

    // Taken under the lock, invoked outside it.
    fn claim(&self) -> Option<Arc<dyn ToastHandler>> {
        self.handler.lock().take()
    }
}

impl std::fmt::Debug for ToastCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastCallbacks")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::handler::{ChannelHandler, ToastEvent};

    fn callbacks() -> (ToastCallbacks, tokio::sync::mpsc::UnboundedReceiver<ToastEvent>) {
        let (handler, rx) = ChannelHandler::channel();
        (ToastCallbacks::new(ToastId::new(7), Arc::new(handler)), rx)
    }

    #[test]
    fn test_first_outcome_wins() {
        let (callbacks, mut rx) = callbacks();
        let transport_copy = callbacks.clone();

        assert!(transport_copy.dismissed(DismissalReason::UserCanceled));
        assert!(!callbacks.activated(Some("0")));
        assert!(!callbacks.failed());
        assert!(!callbacks.is_pending());

        assert_eq!(
            rx.try_recv().unwrap(),
            ToastEvent::Dismissed {
                reason: DismissalReason::UserCanceled
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_activation_arguments() {
        let (callbacks, mut rx) = callbacks();
        assert!(callbacks.activated(Some("2")));
        assert_eq!(
            rx.try_recv().unwrap(),
            ToastEvent::Activated {
                activation: Activation::Action(2)
            }
        );

        for raw in [None, Some(""), Some("reply"), Some("-3")] {
            let (callbacks, mut rx) = self::callbacks();
            assert!(callbacks.activated(raw));
            assert_eq!(
                rx.try_recv().unwrap(),
                ToastEvent::Activated {
                    activation: Activation::Body
                }
            );
        }
    }

    #[test]
    fn test_suppressed_callbacks_are_dropped() {
        let (callbacks, mut rx) = callbacks();
        callbacks.suppress();
        assert!(!callbacks.activated(None));
        assert!(!callbacks.failed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_suppress_after_delivery_keeps_delivery() {
        let (callbacks, mut rx) = callbacks();
        assert!(callbacks.failed());
        callbacks.suppress();
        assert_eq!(rx.try_recv().unwrap(), ToastEvent::Failed);
    }

    #[test]
    fn test_handler_released_after_outcome() {
        let (handler, _rx) = ChannelHandler::channel();
        let handler: Arc<dyn ToastHandler> = Arc::new(handler);

        let delivered = ToastCallbacks::new(ToastId::new(1), handler.clone());
        let transport_copy = delivered.clone();
        assert_eq!(Arc::strong_count(&handler), 2);
        assert!(transport_copy.activated(None));
        assert_eq!(Arc::strong_count(&handler), 1);

        let hidden = ToastCallbacks::new(ToastId::new(2), handler.clone());
        hidden.suppress();
        assert_eq!(Arc::strong_count(&handler), 1);
        assert!(!hidden.failed());
    }

    #[test]
    fn test_channel_closes_when_callbacks_settle() {
        let (callbacks, mut rx) = callbacks();
        let registry_copy = callbacks.clone();
        assert!(callbacks.dismissed(DismissalReason::TimedOut));
        assert!(rx.try_recv().is_ok());
        assert_eq!(
            rx.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        );
        drop(registry_copy);
    }

    #[test]
    fn test_concurrent_delivery_once() {
        let (callbacks, mut rx) = callbacks();
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let callbacks = callbacks.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        callbacks.activated(Some("1"))
                    } else {
                        callbacks.dismissed(DismissalReason::TimedOut)
                    }
                })
            })
            .collect();

        let delivered = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|delivered| *delivered)
            .count();
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
