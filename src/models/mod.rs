pub mod chat;
pub mod dataset;

pub use chat::{
    ChatRequest, ChatResponse, DataStatusResponse, FileUploadRequest, UploadResponse,
    UploadSummary,
};
pub use dataset::{CellValue, DatasetPreview, PreviewRow, PREVIEW_ROW_LIMIT};
