use clap::ValueEnum;
use polars::error::PolarsError;
use serde::Deserialize;
use thiserror::Error;

/// Reserved configuration key (and column name) for the index role.
pub const INDEX_IDENTIFIER: &str = "index";
/// Prefix of configuration keys addressing a column by position, e.g. `_pos:0`.
pub const COLUMN_POSITION_PREFIX: &str = "_pos:";
pub const EDITABLE_ICON: &str = "editable";

#[derive(Debug, Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Loading failed: {0}")]
    LoadingFailed(String),
    #[error("File not found")]
    FileNotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Unknown file type")]
    UnknownFileType,
    #[error("Column name \"{0}\" is reserved for the index")]
    ReservedColumnName(String),
    #[error("Unknown index column \"{0}\"")]
    UnknownIndexColumn(String),
    #[error("Column \"{0}\" is not editable")]
    NotEditable(String),
    #[error("Column \"{column}\" requires a value")]
    MissingValue { column: String },
    #[error("Invalid input for column \"{column}\": {reason}")]
    InvalidInput { column: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    #[default]
    ReadOnly,
    Fixed,
    Dynamic,
}

/// Widget level policy applied to every column of a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridPolicy {
    pub use_container_width: bool,
    pub width: Option<u32>,
    pub editing_mode: EditingMode,
    pub disabled: bool,
    pub column_order: Option<Vec<String>>,
}

impl GridPolicy {
    pub fn stretch_columns(&self) -> bool {
        self.use_container_width || self.width.is_some_and(|w| w > 0)
    }

    pub fn is_read_only(&self) -> bool {
        self.editing_mode == EditingMode::ReadOnly
    }
}

#[derive(Debug)]
pub struct PreviewConfig {
    pub event_poll_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    Resize(u16, u16),
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveLeft,
    MoveRight,
}
