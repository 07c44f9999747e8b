//! Test doubles for the dispatch engine's collaborators, plus fixture
//! loading shared by the workspace's integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

mod audit;
pub mod fixtures;
mod scheduler;
mod sender;
mod store;

pub use audit::MemoryAuditLogger;
pub use scheduler::CountingScheduler;
pub use sender::{RecordingSender, SendCall};
pub use store::ScriptedStore;

pub fn workspace_root() -> PathBuf {
    // libs/testutil -> workspace root
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Path of a file under the workspace `fixtures/` directory.
pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    workspace_root().join("fixtures").join(relative)
}

/// Loads a JSON or YAML fixture as a JSON value.
pub fn load_fixture_value(relative: impl AsRef<Path>) -> Result<Value> {
    let path = fixture_path(relative);
    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse json {}", path.display())),
        "yaml" | "yml" => {
            let yaml: serde_yaml_bw::Value = serde_yaml_bw::from_str(&content)
                .with_context(|| format!("failed to parse yaml {}", path.display()))?;
            serde_json::to_value(yaml)
                .with_context(|| format!("failed to convert yaml {}", path.display()))
        }
        other => Err(anyhow!("unsupported fixture extension: {other}")),
    }
}

#[macro_export]
macro_rules! load_fixture {
    ($path:expr $(,)?) => {{
        $crate::load_fixture_value($path)
            .unwrap_or_else(|err| panic!("failed to load fixture {}: {}", $path, err))
    }};
}
