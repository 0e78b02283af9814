use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file {} does not exist", .path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} CSV error: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table} is missing required column '{column}'")]
    Schema {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} line {line} column '{column}': {message}")]
    Parse {
        table: &'static str,
        line: usize,
        column: String,
        message: String,
    },

    #[error("{table} file did not contain any data rows")]
    EmptyData { table: &'static str },
}

impl LoadError {
    pub(crate) fn parse(
        table: &'static str,
        line: usize,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        LoadError::Parse {
            table,
            line,
            column: column.to_string(),
            message: message.into(),
        }
    }

    /// True for errors raised by a cell that could not be read as its column's type.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, LoadError::Parse { .. })
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, LoadError::Schema { .. })
    }
}
