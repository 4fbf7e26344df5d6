//! JSON model loading.
//!
//! Feature-gated behind `data-loader`. Parses the configuration document
//! into a [`ModelSpec`] and, optionally, straight into a [`Topology`].

use crate::model::ModelSpec;
use crate::sim::RunConfig;
use crate::topology::{Topology, TopologyError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a model document.
pub fn load_model_json(json: &str) -> Result<ModelSpec, ModelLoadError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a model document from raw bytes.
pub fn load_model_json_bytes(bytes: &[u8]) -> Result<ModelSpec, ModelLoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Parse a model document and build its topology.
pub fn load_topology_json(json: &str, config: &RunConfig) -> Result<Topology, ModelLoadError> {
    let spec = load_model_json(json)?;
    Ok(Topology::from_spec(&spec, config)?)
}
