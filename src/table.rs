use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, info};

use crate::column::ColumnDescriptor;
use crate::domain::{GridError, INDEX_IDENTIFIER};

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Loaded data plus the columns that act as the row index.
///
/// Without index columns the table has a single unnamed range index level.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
    index_columns: Vec<String>,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        frame: DataFrame,
        index_columns: &[String],
    ) -> Result<Self, GridError> {
        for column in index_columns {
            if frame.column(column).is_err() {
                return Err(GridError::UnknownIndexColumn(column.clone()));
            }
        }
        if frame
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == INDEX_IDENTIFIER && !index_columns.iter().any(|i| i == c.as_str()))
        {
            return Err(GridError::ReservedColumnName(INDEX_IDENTIFIER.to_string()));
        }

        Ok(Self {
            name: name.into(),
            frame,
            index_columns: index_columns.to_vec(),
        })
    }

    pub fn from_frame(frame: DataFrame) -> Result<Self, GridError> {
        Self::new("", frame, &[])
    }

    pub fn load(
        path: PathBuf,
        index_columns: &[String],
        max_rows: Option<usize>,
    ) -> Result<Self, GridError> {
        let file_info = Table::get_file_info(path)?;
        let start_time = Instant::now();
        let frame = match file_info.file_type {
            FileType::CSV => Table::load_csv(&file_info.path)?,
            FileType::PARQUET => Table::load_parquet(&file_info.path)?,
            FileType::ARROW => Table::load_arrow(&file_info.path)?,
        };
        let frame = match max_rows {
            Some(rows) => frame.limit(rows as IdxSize),
            None => frame,
        }
        .collect()?;

        info!(
            "Loaded {} rows ({} bytes on disk) in {}ms ...",
            frame.height(),
            file_info.file_size,
            start_time.elapsed().as_millis()
        );

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Table::new(name, frame, index_columns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    fn has_range_index(&self) -> bool {
        self.index_columns.is_empty()
    }

    fn index_levels(&self) -> usize {
        self.index_columns.len().max(1)
    }

    fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.frame
            .get_columns()
            .iter()
            .filter(|c| !self.index_columns.iter().any(|i| i == c.name().as_str()))
    }

    /// Schema dtype of the column at `position`, `Null` when out of range.
    pub fn native_type(&self, position: usize) -> DataType {
        if position < self.index_levels() {
            if self.has_range_index() {
                return IDX_DTYPE;
            }
            return self
                .frame
                .column(&self.index_columns[position])
                .map(|c| c.dtype().clone())
                .unwrap_or(DataType::Null);
        }
        self.data_columns()
            .nth(position - self.index_levels())
            .map(|c| c.dtype().clone())
            .unwrap_or(DataType::Null)
    }

    /// One base descriptor per index level followed by one per data column.
    pub fn extract_all_columns(&self) -> Vec<ColumnDescriptor> {
        let mut columns = Vec::with_capacity(self.index_levels() + self.frame.width());

        if self.has_range_index() {
            columns.push(ColumnDescriptor::index("", 0, IDX_DTYPE));
        } else {
            for name in self.index_columns.iter() {
                let position = columns.len();
                columns.push(ColumnDescriptor::index(
                    name.clone(),
                    position,
                    self.native_type(position),
                ));
            }
        }
        for column in self.data_columns() {
            let position = columns.len();
            columns.push(ColumnDescriptor::data(
                column.name().as_str(),
                position,
                column.dtype().clone(),
            ));
        }
        debug!("Extracted {} columns from {}", columns.len(), self.name);
        columns
    }

    /// Cell value for a resolved column. Index columns without backing data
    /// show the row number.
    pub fn value(&self, column: &ColumnDescriptor, row: usize) -> AnyValue<'_> {
        if column.is_index && !self.index_columns.contains(&column.name) {
            return AnyValue::UInt64(row as u64);
        }
        self.frame
            .column(&column.name)
            .and_then(|c| c.get(row))
            .unwrap_or(AnyValue::Null)
    }

    fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(GridError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, GridError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GridError::FileNotFound,
            ErrorKind::PermissionDenied => GridError::PermissionDenied,
            _ => GridError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(GridError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Table::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}
