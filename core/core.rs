pub mod aggregate;
pub mod config;
pub mod error;
pub mod language;
pub mod select;

pub use aggregate::{AggregateStats, FENCE, aggregate, aggregate_with, write_bundle, write_entry};
pub use config::{Config, DEFAULT_CONFIG_FILENAME, SelectConfig, SelectOverrides};
pub use error::{AppError, Result};
pub use language::{
    ExtensionTable, FALLBACK_LANGUAGE, LanguageClassifier, detect_language, detect_language_with,
};
pub use select::{FileFilter, SelectedFiles, file_extension, select_files, validate_root};
