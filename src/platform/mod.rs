pub mod link;
pub mod memory;

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::PlatformError;
use crate::session::ToastCallbacks;
use crate::template::ToastDocument;

pub use link::{FileShortcutStore, ShortcutFile};
pub use memory::{MemoryPlatform, MemoryToast};

/// トランスポート内の通知を指す不透明なハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastHandle(u64);

impl ToastHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ToastHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// アプリ識別用ショートカットの保存先
///
/// リンクのファイル形式は実装側に任せる。検証側が使うのは
/// 存在確認・埋め込まれたAUMIの読み書き・新規作成のみ。
pub trait ShortcutStore: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// ショートカットに埋め込まれたAUMIを読む
    fn read_identity(&self, path: &Path) -> Result<String, PlatformError>;

    /// AUMIを書き換えて保存
    fn write_identity(&self, path: &Path, aumi: &str) -> Result<(), PlatformError>;

    fn create(
        &self,
        path: &Path,
        target: &Path,
        working_dir: &Path,
        aumi: &str,
    ) -> Result<(), PlatformError>;
}

/// 通知トランスポートの共通インターフェース
///
/// 対応可否の判定、プロセスへのAUMI登録、ドキュメントの送信と
/// 結果コールバック、非表示をまとめて扱うための trait。
pub trait Platform: Send + Sync {
    /// 通知機能が利用可能か
    fn is_compatible(&self) -> bool;

    /// 帰属テキスト・アクション・音声指定に対応しているか
    fn supports_modern_features(&self) -> bool;

    /// コンポーネントランタイムの初期化（ショートカット操作の前に呼ばれる）
    fn init_component_runtime(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// 現在のプロセスにAUMIを関連付ける
    fn register_process_identity(&self, aumi: &str) -> Result<(), PlatformError>;

    /// ドキュメントから通知を生成（まだ表示しない）
    fn render_document(
        &self,
        aumi: &str,
        document: &ToastDocument,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ToastHandle, PlatformError>;

    /// 結果コールバックを登録。配信されるのは最大1回
    fn attach_callbacks(
        &self,
        handle: ToastHandle,
        callbacks: ToastCallbacks,
    ) -> Result<(), PlatformError>;

    /// 生成済みの通知を表示
    fn show(&self, handle: ToastHandle) -> Result<(), PlatformError>;

    fn hide(&self, handle: ToastHandle) -> Result<(), PlatformError>;

    /// すべて非表示にし、失敗したハンドルを返す
    fn hide_all(&self, handles: &[ToastHandle]) -> Vec<(ToastHandle, PlatformError)> {
        handles
            .iter()
            .filter_map(|handle| self.hide(*handle).err().map(|e| (*handle, e)))
            .collect()
    }

    fn shortcuts(&self) -> &dyn ShortcutStore;
}
