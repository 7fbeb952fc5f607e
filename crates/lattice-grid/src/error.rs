//! Error types for the grid core.

use crate::source::Position;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the grid core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cell id could not be parsed back into a position.
    #[error("Invalid position id '{id}': expected \"row:column\"")]
    InvalidPositionId { id: String },

    /// A column was assigned to a second data grid.
    #[error("Column is already attached to a different data grid")]
    DataGridAlreadySet,

    /// The factory has no column collection.
    #[error("No columns have been configured")]
    NoColumns,

    /// A cell refers to a column index that does not exist.
    #[error("No column at index {index}")]
    NoSuchColumn { index: i64 },

    /// A widget creation hook was not provided.
    #[error("{operation} is not implemented by {type_name}")]
    Unimplemented {
        operation: &'static str,
        type_name: &'static str,
    },

    /// The widget is not (or no longer) held by the pool it was disposed from.
    #[error("Widget for cell {position} is not pooled by this factory")]
    WidgetNotPooled { position: Position },

    /// The widget carries no binding data: it was never pooled or was already disposed.
    #[error("Widget carries no binding data; it was never pooled or has already been disposed")]
    MissingBindingData,

    /// Loading the model for a position failed.
    #[error("Failed to load model at {position}: {message}")]
    Fetch { position: Position, message: String },

    /// A model attribute path could not be resolved or written.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// The model has been disposed and no longer accepts writes.
    #[error("Model at {position} has been disposed")]
    ModelDisposed { position: Position },

    /// A grid configuration failed validation.
    #[error("Invalid grid configuration: {0}")]
    Config(String),

    /// TOML configuration could not be parsed.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configuration could not be written as TOML.
    #[error("Failed to write TOML configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration could not be parsed or written.
    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(position: Position, message: impl Into<String>) -> Self {
        Self::Fetch {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unimplemented-hook error for the given implementor.
    pub fn unimplemented<T: ?Sized>(operation: &'static str) -> Self {
        Self::Unimplemented {
            operation,
            type_name: std::any::type_name::<T>(),
        }
    }
}
