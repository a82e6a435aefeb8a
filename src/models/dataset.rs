//! 数据集预览模型
//!
//! 上传的表格文件被归一化为一个大小受限的 `DatasetPreview`，
//! 供提示词构建和 `/data-status` 查询使用。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 预览中最多保留的行数
pub const PREVIEW_ROW_LIMIT: usize = 100;

/// 单元格标量值
///
/// 刻意收敛为 string | number | null 三种形态，
/// 保证序列化结果跨语言确定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// 缺失值，序列化为 JSON null
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// 一行预览数据：列名 -> 标量值
pub type PreviewRow = BTreeMap<String, CellValue>;

/// 上传表格的归一化预览
///
/// `total_rows` / `total_columns` 反映完整表格，
/// `preview_rows` 截断到前 [`PREVIEW_ROW_LIMIT`] 行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPreview {
    pub filename: String,
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_names: Vec<String>,
    pub preview_rows: Vec<PreviewRow>,
}

impl DatasetPreview {
    /// 供日志使用的紧凑描述
    pub fn shape(&self) -> String {
        format!(
            "{} ({} rows x {} cols)",
            self.filename, self.total_rows, self.total_columns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_serialization() {
        assert_eq!(serde_json::to_string(&CellValue::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&CellValue::Number(42.5)).unwrap(),
            "42.5"
        );
        assert_eq!(
            serde_json::to_string(&CellValue::Text("abc".to_string())).unwrap(),
            "\"abc\""
        );
    }

    #[test]
    fn test_cell_value_deserialization() {
        let v: CellValue = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
        let v: CellValue = serde_json::from_str("3.25").unwrap();
        assert_eq!(v, CellValue::Number(3.25));
        let v: CellValue = serde_json::from_str("\"2024-01-05\"").unwrap();
        assert_eq!(v, CellValue::Text("2024-01-05".to_string()));
    }

    #[test]
    fn test_preview_row_keys_serialize_in_order() {
        let mut row = PreviewRow::new();
        row.insert("b".to_string(), CellValue::Number(1.0));
        row.insert("a".to_string(), CellValue::Null);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, "{\"a\":null,\"b\":1.0}");
    }
}
