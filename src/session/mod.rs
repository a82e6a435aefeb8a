//! 会话数据存储
//!
//! 进程级单槽位存储：任意时刻最多持有一份 [`DatasetPreview`]。
//! 槽位只做整体替换，读侧要么看到空，要么看到一份完整的预览，
//! 不存在半写状态。并发上传按最后写入者获胜处理，不做版本化。

use crate::models::{DataStatusResponse, DatasetPreview};
use parking_lot::RwLock;
use std::sync::Arc;

/// 数据集槽位
///
/// 克隆后的实例共享同一份底层槽位，可直接放入 `AppState`。
#[derive(Clone, Default)]
pub struct DatasetStore {
    slot: Arc<RwLock<Option<Arc<DatasetPreview>>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原子安装一份新的预览，丢弃旧值
    pub fn replace(&self, preview: DatasetPreview) {
        let preview = Arc::new(preview);
        *self.slot.write() = Some(preview.clone());
        tracing::info!("[STORE] Dataset replaced: {}", preview.shape());
    }

    /// 清空槽位，幂等
    pub fn clear(&self) {
        let had_data = self.slot.write().take().is_some();
        if had_data {
            tracing::info!("[STORE] Dataset cleared");
        }
    }

    /// 读取当前预览，不阻塞
    pub fn read(&self) -> Option<Arc<DatasetPreview>> {
        self.slot.read().clone()
    }

    /// 供 `/data-status` 使用的状态快照
    pub fn status(&self) -> DataStatusResponse {
        match self.read() {
            Some(preview) => DataStatusResponse {
                has_data: true,
                filename: Some(preview.filename.clone()),
                rows: preview.total_rows,
                columns: preview.total_columns,
            },
            None => DataStatusResponse {
                has_data: false,
                filename: None,
                rows: 0,
                columns: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, PreviewRow};

    fn sample_preview(name: &str, rows: usize) -> DatasetPreview {
        let preview_rows = (0..rows.min(100))
            .map(|i| {
                let mut row = PreviewRow::new();
                row.insert("id".to_string(), CellValue::Number(i as f64));
                row
            })
            .collect();
        DatasetPreview {
            filename: name.to_string(),
            total_rows: rows,
            total_columns: 1,
            column_names: vec!["id".to_string()],
            preview_rows,
        }
    }

    #[test]
    fn test_replace_then_read_returns_installed_preview() {
        let store = DatasetStore::new();
        store.replace(sample_preview("a.xlsx", 3));
        let read = store.read().expect("slot should hold a preview");
        assert_eq!(read.filename, "a.xlsx");
        assert_eq!(read.total_rows, 3);
    }

    #[test]
    fn test_replace_discards_prior_state() {
        let store = DatasetStore::new();
        store.replace(sample_preview("first.xlsx", 5));
        store.replace(sample_preview("second.xlsx", 7));
        let read = store.read().expect("slot should hold a preview");
        assert_eq!(read.filename, "second.xlsx");
        assert_eq!(read.total_rows, 7);
    }

    #[test]
    fn test_clear_empties_slot_and_is_idempotent() {
        let store = DatasetStore::new();
        store.replace(sample_preview("a.xlsx", 1));
        store.clear();
        assert!(store.read().is_none());
        store.clear();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_status_reflects_slot() {
        let store = DatasetStore::new();
        let empty = store.status();
        assert!(!empty.has_data);
        assert_eq!(empty.rows, 0);

        store.replace(sample_preview("sales.csv", 150));
        let status = store.status();
        assert!(status.has_data);
        assert_eq!(status.filename.as_deref(), Some("sales.csv"));
        assert_eq!(status.rows, 150);
        assert_eq!(status.columns, 1);
    }

    #[test]
    fn test_clones_share_the_same_slot() {
        let store = DatasetStore::new();
        let other = store.clone();
        store.replace(sample_preview("shared.xlsx", 2));
        assert!(other.read().is_some());
        other.clear();
        assert!(store.read().is_none());
    }
}
