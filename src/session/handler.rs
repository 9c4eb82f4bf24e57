//! Outcome handlers
//!
//! A shown notification ends in exactly one of three outcomes: the user
//! activated it, it was dismissed, or the transport failed to render it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// How the user activated a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Activation {
    /// Plain tap on the notification body
    Body,
    /// Button with this zero-based index
    Action(usize),
}

/// Why a notification was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalReason {
    UserCanceled,
    ApplicationHidden,
    TimedOut,
    /// Any reason code the transport reports that is not one of the above
    Unknown,
}

impl DismissalReason {
    /// Map a transport reason code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DismissalReason::UserCanceled,
            1 => DismissalReason::ApplicationHidden,
            2 => DismissalReason::TimedOut,
            _ => DismissalReason::Unknown,
        }
    }
}

impl std::fmt::Display for DismissalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DismissalReason::UserCanceled => "user_canceled",
            DismissalReason::ApplicationHidden => "application_hidden",
            DismissalReason::TimedOut => "timed_out",
            DismissalReason::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Parse the argument string a transport echoes back on activation.
///
/// Returns `None` unless the string is a non-negative decimal integer.
pub fn parse_action_index(arguments: &str) -> Option<usize> {
    let trimmed = arguments.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Receiver of notification outcomes
///
/// Called from the transport's delivery thread, after `show` has returned.
pub trait ToastHandler: Send + Sync {
    fn activated(&self, activation: Activation);
    fn dismissed(&self, reason: DismissalReason);
    fn failed(&self);
}

/// Outcome as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToastEvent {
    Activated { activation: Activation },
    Dismissed { reason: DismissalReason },
    Failed,
}

/// Handler forwarding outcomes into a tokio channel
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<ToastEvent>,
}

impl ChannelHandler {
    pub fn new(tx: mpsc::UnboundedSender<ToastEvent>) -> Self {
        Self { tx }
    }

    /// Create a handler together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ToastEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: ToastEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Outcome receiver dropped, discarding {:?}", e.0);
        }
    }
}

impl ToastHandler for ChannelHandler {
    fn activated(&self, activation: Activation) {
        self.send(ToastEvent::Activated { activation });
    }

    fn dismissed(&self, reason: DismissalReason) {
        self.send(ToastEvent::Dismissed { reason });
    }

    fn failed(&self) {
        self.send(ToastEvent::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_index() {
        assert_eq!(parse_action_index("0"), Some(0));
        assert_eq!(parse_action_index("12"), Some(12));
        assert_eq!(parse_action_index(" 3 "), Some(3));
        assert_eq!(parse_action_index(""), None);
        assert_eq!(parse_action_index("-1"), None);
        assert_eq!(parse_action_index("+1"), None);
        assert_eq!(parse_action_index("action=reply"), None);
        assert_eq!(parse_action_index("99999999999999999999999999"), None);
    }

    #[test]
    fn test_dismissal_reason_codes() {
        assert_eq!(DismissalReason::from_code(0), DismissalReason::UserCanceled);
        assert_eq!(DismissalReason::from_code(1), DismissalReason::ApplicationHidden);
        assert_eq!(DismissalReason::from_code(2), DismissalReason::TimedOut);
        assert_eq!(DismissalReason::from_code(3), DismissalReason::Unknown);
        assert_eq!(DismissalReason::from_code(-7), DismissalReason::Unknown);
    }

    #[test]
    fn test_channel_handler_forwards() {
        let (handler, mut rx) = ChannelHandler::channel();
        handler.activated(Activation::Action(1));
        handler.dismissed(DismissalReason::TimedOut);
        handler.failed();

        assert_eq!(
            rx.try_recv().unwrap(),
            ToastEvent::Activated {
                activation: Activation::Action(1)
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ToastEvent::Dismissed {
                reason: DismissalReason::TimedOut
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ToastEvent::Failed);
    }

    #[test]
    fn test_event_json() {
        let event = ToastEvent::Activated {
            activation: Activation::Action(2),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"activated\""));
        assert!(json.contains("\"kind\":\"action\""));
        assert!(json.contains("\"index\":2"));
    }
}
