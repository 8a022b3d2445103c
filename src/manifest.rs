use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

/// File looked up next to the target script. A double-clicked launcher has no
/// command line to carry overrides, so they live on disk instead.
pub const MANIFEST_FILE: &str = "streamlit-desktop.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppManifest {
    pub open_as_app: Option<bool>,
    pub browser: Option<String>,
    pub close_opened_window: Option<bool>,
    pub print_command: Option<bool>,
    /// Streamlit option overrides, keyed like caller keys (`server_port`).
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

/// Loads the manifest sitting beside `script`, if any. A missing file is not
/// an error; an unreadable or unparsable one is.
pub fn load_manifest(script: &Path) -> Result<Option<AppManifest>, String> {
    let directory = script.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = directory.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&manifest_path).map_err(|error| {
        format!(
            "Failed to read app manifest {}: {}",
            manifest_path.display(),
            error
        )
    })?;
    let manifest: AppManifest = serde_json::from_str(&raw).map_err(|error| {
        format!(
            "Failed to parse app manifest {}: {}",
            manifest_path.display(),
            error
        )
    })?;
    Ok(Some(manifest))
}
