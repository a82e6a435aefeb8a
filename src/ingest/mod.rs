//! 文件摄取模块
//!
//! 将 Base64 编码的表格文件解码、解析并归一化为 [`DatasetPreview`]。
//! 摄取是纯转换：成功与否都不直接触碰会话存储，
//! 是否提交由外层 handler 决定。
//!
//! 支持的格式：xlsx / xls / xlsb / ods (calamine) 与 csv。
//! 日期列统一重写为 `YYYY-MM-DD` 字符串；缺失值归一化为 null。

use crate::error::IngestError;
use crate::models::{CellValue, DatasetPreview, PreviewRow, PREVIEW_ROW_LIMIT};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// calamine 能处理的扩展名
const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsb", "ods"];

/// 摄取一次上传
///
/// 扩展名检查在任何解码之前完成；不支持的扩展名直接拒绝。
pub fn ingest_upload(filename: &str, base64_data: &str) -> Result<DatasetPreview, IngestError> {
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| !ext.eq_ignore_ascii_case(filename))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if extension != "csv" && !EXCEL_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IngestError::UnsupportedFormat(if extension.is_empty() {
            filename.to_string()
        } else {
            extension
        }));
    }

    let bytes = BASE64
        .decode(base64_data.trim())
        .map_err(|e| IngestError::MalformedFile(format!("invalid base64 payload: {e}")))?;

    let preview = if extension == "csv" {
        parse_csv(filename, &bytes)?
    } else {
        parse_excel(filename, bytes)?
    };

    tracing::info!("[INGEST] Parsed {}", preview.shape());
    Ok(preview)
}

/// 归一化表头
///
/// 空表头补为 `Column N`，重复表头追加 ` (2)`、` (3)` 等序号，
/// 保证列名在序列内唯一。
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.into_iter().enumerate() {
        let trimmed = header.trim();
        let base = if trimmed.is_empty() {
            format!("Column {}", i + 1)
        } else {
            trimmed.to_string()
        };
        let mut name = base.clone();
        let mut n = 2;
        while names.contains(&name) {
            name = format!("{base} ({n})");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn parse_excel(filename: &str, bytes: Vec<u8>) -> Result<DatasetPreview, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::MalformedFile(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::MalformedFile("workbook contains no sheets".to_string()))?
        .map_err(|e| IngestError::MalformedFile(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DatasetPreview {
            filename: filename.to_string(),
            total_rows: 0,
            total_columns: 0,
            column_names: Vec::new(),
            preview_rows: Vec::new(),
        });
    };

    let column_names = normalize_headers(
        header_row
            .iter()
            .map(|cell| match cell {
                Data::String(s) => s.clone(),
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect(),
    );

    let data_rows: Vec<&[Data]> = rows.collect();
    let date_columns = detect_date_columns(&data_rows, column_names.len());

    let preview_rows = data_rows
        .iter()
        .take(PREVIEW_ROW_LIMIT)
        .map(|row| {
            let mut record = PreviewRow::new();
            for (col, name) in column_names.iter().enumerate() {
                let cell = row.get(col).unwrap_or(&Data::Empty);
                record.insert(name.clone(), convert_cell(cell, date_columns[col]));
            }
            record
        })
        .collect();

    Ok(DatasetPreview {
        filename: filename.to_string(),
        total_rows: data_rows.len(),
        total_columns: column_names.len(),
        column_names,
        preview_rows,
    })
}

/// 判定日期列：某列所有非空单元格均为日期/时间类型
///
/// 混合类型或纯空列不算日期列，保持原始标量。
fn detect_date_columns(data_rows: &[&[Data]], column_count: usize) -> Vec<bool> {
    (0..column_count)
        .map(|col| {
            let mut saw_date = false;
            for row in data_rows {
                match row.get(col).unwrap_or(&Data::Empty) {
                    Data::Empty => {}
                    Data::DateTime(_) | Data::DateTimeIso(_) => saw_date = true,
                    _ => return false,
                }
            }
            saw_date
        })
        .collect()
}

fn convert_cell(cell: &Data, in_date_column: bool) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        Data::DateTime(dt) => {
            if in_date_column {
                match dt.as_datetime() {
                    Some(naive) => CellValue::Text(naive.format("%Y-%m-%d").to_string()),
                    // 序列值超出 chrono 可表示范围时退回原始数值
                    None => CellValue::Number(dt.as_f64()),
                }
            } else {
                CellValue::Number(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) => {
            if in_date_column {
                CellValue::Text(s.split('T').next().unwrap_or(s).to_string())
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_csv(filename: &str, bytes: &[u8]) -> Result<DatasetPreview, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let column_names = normalize_headers(
        reader
            .headers()
            .map_err(|e| IngestError::MalformedFile(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );

    let mut total_rows = 0usize;
    let mut preview_rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| IngestError::MalformedFile(e.to_string()))?;
        if total_rows < PREVIEW_ROW_LIMIT {
            let mut row = PreviewRow::new();
            for (col, name) in column_names.iter().enumerate() {
                row.insert(name.clone(), convert_csv_field(record.get(col).unwrap_or("")));
            }
            preview_rows.push(row);
        }
        total_rows += 1;
    }

    Ok(DatasetPreview {
        filename: filename.to_string(),
        total_rows,
        total_columns: column_names.len(),
        column_names,
        preview_rows,
    })
}

fn convert_csv_field(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(trimmed.to_string()),
    }
}
