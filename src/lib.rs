pub mod app;
pub mod error;
pub mod identity;
pub mod platform;
pub mod service;
pub mod session;
pub mod template;

pub use error::{CompileError, IdentityError, InitError, PlatformError, ShowError, TemplateError};
pub use identity::{Identity, IdentityValidator, ShortcutResult};
pub use platform::{Platform, ShortcutStore, ToastHandle};
pub use service::NotificationService;
pub use session::{
    Activation, ChannelHandler, DismissalReason, NotificationSession, ToastEvent, ToastHandler,
    ToastId,
};
pub use template::{AudioOption, Layout, TemplateCompiler, TemplateModel, TextField, ToastDocument};
