//! Shared fixtures for the cross-crate tests.

use dtwin_core::model::{ArcSpec, ModelSpec, NodeSpec};
use dtwin_core::test_utils::t;
use std::path::{Path, PathBuf};

/// A five-station closed cell:
///
/// ```text
///         +-> M2 (2 lanes) -+
///   M1 ---+                 +--> M4 --> M5 --+
///    ^    +-> M3 ----------+                 |
///    +---------------------------------------+
/// ```
///
/// Six pallets start in the queue in front of M1.
pub fn cell_line() -> ModelSpec {
    ModelSpec {
        nodes: vec![
            NodeSpec::new(1, 1, t(1)),
            NodeSpec::new(2, 2, t(4)),
            NodeSpec::new(3, 1, t(4)),
            NodeSpec::new(4, 1, t(2)),
            NodeSpec::new(5, 1, t(1)),
        ],
        arcs: vec![
            ArcSpec::new(1, 2, 3, t(1)),
            ArcSpec::new(1, 3, 3, t(1)),
            ArcSpec::new(2, 4, 2, t(2)),
            ArcSpec::new(3, 4, 2, t(2)),
            ArcSpec::new(4, 5, 2, t(1)),
            ArcSpec::new(5, 1, 6, t(1)),
        ],
        initial: vec![0, 0, 0, 0, 0, 6],
    }
}

/// Fresh, empty scratch directory unique to this process.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dtwin_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Write `model.json` and, when given, `run.json` into `dir`.
pub fn write_project(dir: &Path, model: &ModelSpec, run: Option<&str>) {
    let json = serde_json::to_string_pretty(model).expect("model serializes");
    std::fs::write(dir.join("model.json"), json).expect("write model");
    if let Some(run) = run {
        std::fs::write(dir.join("run.json"), run).expect("write run config");
    }
}
