//! Notification service facade
//!
//! Owns the configured identity, the template compiler and the session.
//! Callers construct one per process and pass it around explicitly.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::app::Config;
use crate::error::{CompileError, IdentityError, InitError, ShowError};
use crate::identity::{Identity, IdentityValidator, ShortcutResult};
use crate::platform::Platform;
use crate::session::{NotificationSession, ToastHandler, ToastId};
use crate::template::{TemplateCompiler, TemplateModel, ToastDocument};

pub struct NotificationService {
    identity: Identity,
    compiler: TemplateCompiler,
    session: NotificationSession,
}

impl NotificationService {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let compiler = TemplateCompiler::new(platform.supports_modern_features());
        if !platform.is_compatible() {
            info!("Platform is not compatible with toast notifications");
        }
        Self {
            identity: Identity::new("", ""),
            compiler,
            session: NotificationSession::new(platform),
        }
    }

    /// Service configured from the persisted settings
    pub fn from_config(platform: Arc<dyn Platform>, config: &Config) -> Self {
        let mut service = Self::new(platform);
        service.configure(config.app_name.clone(), config.aumi.clone());
        if let Some(dir) = &config.shortcut_dir {
            service.set_shortcut_dir(dir.clone());
        }
        service
    }

    /// Set the identity. A changed identity has to be initialized again.
    pub fn configure(&mut self, app_name: impl Into<String>, aumi: impl Into<String>) {
        let identity =
            Identity::new(app_name, aumi).with_shortcut_dir(self.identity.shortcut_dir());
        if identity != self.identity {
            debug!("Identity configured: {} ({})", identity.app_name(), identity.aumi());
            self.session.reset();
        }
        self.identity = identity;
    }

    pub fn set_shortcut_dir(&mut self, dir: impl Into<PathBuf>) {
        self.identity = self.identity.clone().with_shortcut_dir(dir);
        self.session.reset();
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_compatible(&self) -> bool {
        self.session.platform().is_compatible()
    }

    pub fn supports_modern_features(&self) -> bool {
        self.compiler.modern_features()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_initialized()
    }

    /// Validate the shortcut and register the identity; required before `show`
    pub fn initialize(&mut self) -> Result<ShortcutResult, InitError> {
        self.session.initialize(&self.identity)
    }

    /// Run shortcut validation on its own, without touching initialization
    pub fn create_or_repair_shortcut(&self) -> Result<ShortcutResult, IdentityError> {
        IdentityValidator::new(self.session.platform().as_ref()).validate(&self.identity)
    }

    pub fn compile(&self, model: &TemplateModel) -> Result<ToastDocument, CompileError> {
        self.compiler.compile(model)
    }

    /// Compile and show a notification
    pub fn show(
        &self,
        model: &TemplateModel,
        handler: Arc<dyn ToastHandler>,
    ) -> Result<ToastId, ShowError> {
        if !self.session.is_initialized() {
            return Err(ShowError::NotInitialized);
        }
        let document = self.compiler.compile(model)?;
        self.session.show(&document, model.expiration(), handler)
    }

    pub fn hide(&self, id: ToastId) -> bool {
        self.session.hide(id)
    }

    pub fn clear_all(&self) {
        self.session.clear();
    }

    pub fn session(&self) -> &NotificationSession {
        &self.session
    }
}
