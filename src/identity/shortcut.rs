use std::path::{Path, PathBuf};
use tracing::warn;

/// Longest application user model id the platform accepts
pub const MAX_AUMI_LEN: usize = 128;

const START_MENU_PROGRAMS: [&str; 4] = ["Microsoft", "Windows", "Start Menu", "Programs"];
const LINK_EXTENSION: &str = "lnk";

/// Directory registration shortcuts are written to
///
/// `%APPDATA%\Microsoft\Windows\Start Menu\Programs` when `APPDATA` is set,
/// otherwise the `applications` folder of the user data directory.
pub fn default_shortcut_dir() -> PathBuf {
    if let Some(appdata) = std::env::var_os("APPDATA").filter(|v| !v.is_empty()) {
        return START_MENU_PROGRAMS
            .iter()
            .fold(PathBuf::from(appdata), |dir, part| dir.join(part));
    }
    directories::BaseDirs::new()
        .map(|d| d.data_dir().join("applications"))
        .unwrap_or_else(|| std::env::temp_dir().join("toast-notifier").join("applications"))
}

/// `<dir>/<app_name>.lnk`
pub fn shortcut_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.{}", app_name, LINK_EXTENSION))
}

/// Build an id of the form `company.product[.sub_product[.version]]`
///
/// The version is only used together with a sub-product.
pub fn compose_aumi(company: &str, product: &str, sub_product: &str, version: &str) -> String {
    let mut aumi = format!("{}.{}", company, product);
    if !sub_product.is_empty() {
        aumi.push('.');
        aumi.push_str(sub_product);
        if !version.is_empty() {
            aumi.push('.');
            aumi.push_str(version);
        }
    }

    if aumi.chars().count() > MAX_AUMI_LEN {
        warn!("App user model id exceeds {} characters: {}", MAX_AUMI_LEN, aumi);
    }
    aumi
}
