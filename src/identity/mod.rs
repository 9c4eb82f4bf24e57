//! Application identity and its registration shortcut
//!
//! The platform only attributes notifications to an identity that a
//! persisted shortcut registers. [`IdentityValidator`] checks that shortcut
//! against the configured identity and creates or repairs it as needed.

pub mod shortcut;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::IdentityError;
use crate::platform::Platform;

pub use shortcut::{compose_aumi, default_shortcut_dir, shortcut_path, MAX_AUMI_LEN};

/// Name and application user model id notifications are issued under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    app_name: String,
    aumi: String,
    shortcut_dir: PathBuf,
}

impl Identity {
    /// Identity whose shortcut lives in the default per-platform directory
    pub fn new(app_name: impl Into<String>, aumi: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            aumi: aumi.into(),
            shortcut_dir: default_shortcut_dir(),
        }
    }

    pub fn with_shortcut_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shortcut_dir = dir.into();
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn aumi(&self) -> &str {
        &self.aumi
    }

    pub fn shortcut_dir(&self) -> &Path {
        &self.shortcut_dir
    }

    /// Both the application name and the id are set
    pub fn is_complete(&self) -> bool {
        !self.app_name.is_empty() && !self.aumi.is_empty()
    }

    pub fn shortcut_path(&self) -> PathBuf {
        shortcut_path(&self.shortcut_dir, &self.app_name)
    }
}

/// Terminal state of shortcut validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutResult {
    /// Shortcut present with the configured identity
    Unchanged,
    /// Shortcut present, identity property rewritten
    Changed,
    /// Shortcut did not exist and was created
    Created,
    /// Application name or id is empty
    MissingParameters,
    IncompatiblePlatform,
    /// The platform component runtime could not be initialized
    ComInitFailure,
    CreateFailed,
}

impl ShortcutResult {
    /// Numeric code; negative codes abort initialization
    pub fn code(&self) -> i32 {
        match self {
            ShortcutResult::Unchanged => 0,
            ShortcutResult::Changed => 1,
            ShortcutResult::Created => 2,
            ShortcutResult::MissingParameters => -1,
            ShortcutResult::IncompatiblePlatform => -2,
            ShortcutResult::ComInitFailure => -3,
            ShortcutResult::CreateFailed => -4,
        }
    }

    /// Whether notifications may be issued after this outcome
    pub fn is_success(&self) -> bool {
        self.code() >= 0
    }
}

impl std::fmt::Display for ShortcutResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShortcutResult::Unchanged => "unchanged",
            ShortcutResult::Changed => "changed",
            ShortcutResult::Created => "created",
            ShortcutResult::MissingParameters => "missing parameters",
            ShortcutResult::IncompatiblePlatform => "incompatible platform",
            ShortcutResult::ComInitFailure => "component runtime initialization failure",
            ShortcutResult::CreateFailed => "create failed",
        };
        write!(f, "{}", s)
    }
}

/// Shortcut validation state machine
pub struct IdentityValidator<'a> {
    platform: &'a dyn Platform,
}

impl<'a> IdentityValidator<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    /// Check, create or repair the shortcut for `identity`
    ///
    /// Returns `Err` only when an existing shortcut could not be repaired.
    pub fn validate(&self, identity: &Identity) -> Result<ShortcutResult, IdentityError> {
        if !identity.is_complete() {
            error!("App user model id or app name is empty");
            return Ok(ShortcutResult::MissingParameters);
        }

        if !self.platform.is_compatible() {
            error!("Platform is not compatible with toast notifications");
            return Ok(ShortcutResult::IncompatiblePlatform);
        }

        if let Err(e) = self.platform.init_component_runtime() {
            error!("Error on component runtime initialization: {}", e);
            return Ok(ShortcutResult::ComInitFailure);
        }

        let path = identity.shortcut_path();
        let store = self.platform.shortcuts();

        if !store.exists(&path) {
            info!("Shortcut not found, attempting to create one at {}", path.display());
            return Ok(self.create(identity, &path));
        }
        info!("Shortcut found at {}", path.display());

        match store.read_identity(&path) {
            Ok(found) if found == identity.aumi() => Ok(ShortcutResult::Unchanged),
            found => {
                match found {
                    Ok(found) => warn!(
                        "Shortcut identity {} does not match {}, updating",
                        found,
                        identity.aumi()
                    ),
                    Err(e) => warn!("Shortcut identity unreadable ({}), updating", e),
                }
                store
                    .write_identity(&path, identity.aumi())
                    .map_err(|source| IdentityError::Repair {
                        path: path.clone(),
                        source,
                    })?;
                info!("Shortcut identity updated to {}", identity.aumi());
                Ok(ShortcutResult::Changed)
            }
        }
    }

    fn create(&self, identity: &Identity, path: &Path) -> ShortcutResult {
        let target = match std::env::current_exe() {
            Ok(target) => target,
            Err(e) => {
                error!("Failed to resolve the current executable: {}", e);
                return ShortcutResult::CreateFailed;
            }
        };
        let working_dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        match self
            .platform
            .shortcuts()
            .create(path, &target, &working_dir, identity.aumi())
        {
            Ok(()) => {
                info!("Shortcut created at {}", path.display());
                ShortcutResult::Created
            }
            Err(e) => {
                error!("Failed to create shortcut at {}: {}", path.display(), e);
                ShortcutResult::CreateFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FileShortcutStore, MemoryPlatform, ShortcutFile, ShortcutStore};
    use tempfile::tempdir;

    fn platform() -> MemoryPlatform {
        MemoryPlatform::new(FileShortcutStore::new())
    }

    #[test]
    fn test_missing_parameters_no_io() {
        let dir = tempdir().unwrap();
        let shortcut_dir = dir.path().join("Programs");
        let platform = platform();
        let validator = IdentityValidator::new(&platform);

        for identity in [Identity::new("", "Demo.ID"), Identity::new("Demo", "")] {
            let identity = identity.with_shortcut_dir(&shortcut_dir);
            assert_eq!(
                validator.validate(&identity).unwrap(),
                ShortcutResult::MissingParameters
            );
        }
        assert!(!shortcut_dir.exists());
        assert_eq!(platform.runtime_init_calls(), 0);
    }

    #[test]
    fn test_incompatible_platform() {
        let dir = tempdir().unwrap();
        let platform = platform().with_compatible(false);
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());
        assert_eq!(
            IdentityValidator::new(&platform).validate(&identity).unwrap(),
            ShortcutResult::IncompatiblePlatform
        );
        assert!(!identity.shortcut_path().exists());
    }

    #[test]
    fn test_runtime_init_failure() {
        let dir = tempdir().unwrap();
        let platform = platform();
        platform.set_fail_runtime_init(true);
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());
        assert_eq!(
            IdentityValidator::new(&platform).validate(&identity).unwrap(),
            ShortcutResult::ComInitFailure
        );
        assert!(!identity.shortcut_path().exists());
    }

    #[test]
    fn test_created_then_unchanged() {
        let dir = tempdir().unwrap();
        let platform = platform();
        let validator = IdentityValidator::new(&platform);
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());

        assert_eq!(validator.validate(&identity).unwrap(), ShortcutResult::Created);
        assert_eq!(validator.validate(&identity).unwrap(), ShortcutResult::Unchanged);

        let file = ShortcutFile::load(&identity.shortcut_path()).unwrap();
        assert_eq!(file.app_user_model_id.as_deref(), Some("Demo.ID"));
        assert_eq!(file.target, std::env::current_exe().unwrap());
    }

    #[test]
    fn test_mismatch_repaired() {
        let dir = tempdir().unwrap();
        let platform = platform();
        let validator = IdentityValidator::new(&platform);
        let path = dir.path().join("Demo.lnk");
        FileShortcutStore::new()
            .create(&path, Path::new("/bin/demo"), Path::new("/bin"), "Old.ID")
            .unwrap();

        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());
        assert_eq!(validator.validate(&identity).unwrap(), ShortcutResult::Changed);
        assert_eq!(validator.validate(&identity).unwrap(), ShortcutResult::Unchanged);

        let file = ShortcutFile::load(&path).unwrap();
        assert_eq!(file.target, PathBuf::from("/bin/demo"));
    }

    #[test]
    fn test_unreadable_identity_repaired() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Demo.lnk");
        std::fs::write(&path, "target = \"/bin/demo\"\nworking_dir = \"/bin\"\n").unwrap();

        let platform = platform();
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());
        assert_eq!(
            IdentityValidator::new(&platform).validate(&identity).unwrap(),
            ShortcutResult::Changed
        );
    }

    #[test]
    fn test_repair_failure_propagates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Demo.lnk");
        std::fs::write(&path, "garbage [[").unwrap();

        let platform = platform();
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(dir.path());
        let err = IdentityValidator::new(&platform)
            .validate(&identity)
            .unwrap_err();
        let IdentityError::Repair { path: failed, .. } = err;
        assert_eq!(failed, path);
    }

    #[test]
    fn test_create_failed() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let platform = platform();
        let identity = Identity::new("Demo", "Demo.ID").with_shortcut_dir(blocker.join("Programs"));
        assert_eq!(
            IdentityValidator::new(&platform).validate(&identity).unwrap(),
            ShortcutResult::CreateFailed
        );
    }

    #[test]
    fn test_result_codes() {
        assert!(ShortcutResult::Unchanged.is_success());
        assert!(ShortcutResult::Changed.is_success());
        assert!(ShortcutResult::Created.is_success());
        assert!(!ShortcutResult::MissingParameters.is_success());
        assert!(!ShortcutResult::IncompatiblePlatform.is_success());
        assert!(!ShortcutResult::ComInitFailure.is_success());
        assert_eq!(ShortcutResult::CreateFailed.code(), -4);
    }
}
