//! Where project files live and how their bytes become model types.
//!
//! A document's format is fixed by its extension. A directory may hold at
//! most one document per base name.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {file}.json, {file}.ron or {file}.toml in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file} is not a .json, .ron or .toml document")]
    UnsupportedFormat { file: PathBuf },

    /// `model.json` next to `model.toml`, say.
    #[error("ambiguous project file: both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The model parsed but does not describe a valid line.
    #[error("invalid model in {file}: {source}")]
    Topology {
        file: PathBuf,
        source: dtwin_core::topology::TopologyError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Ron,
    Toml,
}

impl Format {
    /// Search order when looking for a document by base name.
    pub const ALL: [Format; 3] = [Format::Json, Format::Ron, Format::Toml];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Ron => "ron",
            Format::Toml => "toml",
        }
    }
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// Locating documents
// ===========================================================================

/// The single `{base_name}.{json,ron,toml}` in `dir`, if any.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|p| p.is_file());

    let first = present.next();
    match (first, present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (first, _) => Ok(first),
    }
}

pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_owned(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Parsing
// ===========================================================================

pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    debug!(file = %path.display(), ?format, bytes = text.len(), "reading data file");
    deserialize_str(&text, format).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Parse an in-memory document. The error is the parser's message.
pub fn deserialize_str<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Ron => ron::from_str(text).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
