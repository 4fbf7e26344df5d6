//! File loading for dtwin models and run configurations.
//!
//! A project directory holds a required `model.{json,ron,toml}` and an
//! optional `run.{json,ron,toml}`. Each file's format is picked from its
//! extension; mixing formats across files is fine, two formats for the same
//! base name is not.

pub mod loader;

pub use loader::{DataLoadError, Format, deserialize_file, detect_format};

use dtwin_core::engine::SimulationEngine;
use dtwin_core::model::ModelSpec;
use dtwin_core::sim::RunConfig;
use dtwin_core::topology::Topology;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load a model document from any supported format.
pub fn load_model_file(path: &Path) -> Result<ModelSpec, DataLoadError> {
    deserialize_file(path)
}

/// Load a run configuration. Omitted keys take their defaults.
pub fn load_run_config_file(path: &Path) -> Result<RunConfig, DataLoadError> {
    deserialize_file(path)
}

/// A model plus the configuration it should run under.
#[derive(Debug, Clone)]
pub struct Project {
    pub model: ModelSpec,
    pub config: RunConfig,
    /// File the model was read from.
    pub model_path: PathBuf,
}

impl Project {
    /// Build the frozen topology for this project.
    pub fn topology(&self) -> Result<Topology, DataLoadError> {
        Topology::from_spec(&self.model, &self.config).map_err(|source| DataLoadError::Topology {
            file: self.model_path.clone(),
            source,
        })
    }

    /// Build a ready-to-run engine recording into an in-memory log.
    pub fn engine(&self) -> Result<SimulationEngine, DataLoadError> {
        Ok(SimulationEngine::new(self.topology()?, self.config.clone()))
    }
}

/// Load `model.*` and, if present, `run.*` from `dir`.
pub fn load_project(dir: &Path) -> Result<Project, DataLoadError> {
    let model_path = loader::require_data_file(dir, "model")?;
    let model = load_model_file(&model_path)?;
    let config = match loader::find_data_file(dir, "run")? {
        Some(path) => load_run_config_file(&path)?,
        None => RunConfig::default(),
    };
    info!(
        dir = %dir.display(),
        nodes = model.nodes.len(),
        arcs = model.arcs.len(),
        "project loaded"
    );
    Ok(Project {
        model,
        config,
        model_path,
    })
}
