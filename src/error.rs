//! Error types for the notification library.
//!
//! Each enum maps to one entry of the error taxonomy: configuration and
//! platform problems surface during initialization, persistence problems from
//! the shortcut store, compile problems from the template compiler and
//! delivery problems from `show`.

use std::path::PathBuf;

use thiserror::Error;

use crate::identity::ShortcutResult;
use crate::template::{Layout, TextField};

/// Failure reported by a platform transport or shortcut store.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted shortcut could not be decoded.
    #[error("Malformed shortcut {}: {message}", path.display())]
    MalformedShortcut { path: PathBuf, message: String },

    /// A persisted shortcut does not carry an identity property.
    #[error("Shortcut {} has no identity property", .0.display())]
    MissingIdentity(PathBuf),

    /// The transport rejected a request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The handle is not known to the transport.
    #[error("Unknown notification handle: {0}")]
    UnknownHandle(u64),
}

impl PlatformError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Contract violations while building a [`crate::template::TemplateModel`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("{layout} declares {count} text field(s), {field:?} is out of range")]
    FieldOutOfRange {
        layout: Layout,
        field: TextField,
        count: usize,
    },

    #[error("{0} has no image slot")]
    NoImageSlot(Layout),
}

/// Structured document construction failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("Document has no <{0}> element")]
    MissingElement(&'static str),

    #[error("Text placeholder {index} is missing from the {layout} skeleton")]
    MissingPlaceholder { layout: Layout, index: usize },
}

/// The identity validator could not bring an existing shortcut in line with
/// the configured identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to repair shortcut {}: {source}", path.display())]
    Repair {
        path: PathBuf,
        #[source]
        source: PlatformError,
    },
}

/// Initialization was aborted.
#[derive(Debug, Error)]
pub enum InitError {
    /// The validator ended in a terminal state that does not allow delivery.
    #[error("Shortcut validation failed: {0}")]
    Shortcut(ShortcutResult),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The identity could not be attached to the current process.
    #[error("Failed to register process identity: {0}")]
    Registration(#[source] PlatformError),
}

/// A notification could not be shown. Nothing is left in the registry.
#[derive(Debug, Error)]
pub enum ShowError {
    #[error("Notifier is not initialized")]
    NotInitialized,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Failed to deliver notification: {0}")]
    Platform(#[from] PlatformError),
}
