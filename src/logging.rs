use std::{
    env,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Overrides the launcher state root, normally `~/.streamlit-desktop`.
pub const HOME_ENV: &str = "STREAMLIT_DESKTOP_HOME";
pub const LAUNCHER_LOG_FILE: &str = "launcher.log";

pub fn launcher_root() -> Option<PathBuf> {
    if let Ok(root) = env::var(HOME_ENV) {
        let path = PathBuf::from(root.trim());
        if !path.as_os_str().is_empty() {
            return Some(path);
        }
    }
    home::home_dir().map(|home| home.join(".streamlit-desktop"))
}

pub fn resolve_log_path(root: Option<PathBuf>, file_name: &str) -> PathBuf {
    root.unwrap_or_else(env::temp_dir)
        .join("logs")
        .join(file_name)
}

fn append_to(log_path: &Path, message: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "[{timestamp}] {message}")
}

/// Best-effort append to the launcher log; logging never interferes with a
/// launch, so failures are swallowed.
pub fn append_launcher_log(message: &str) {
    let log_path = resolve_log_path(launcher_root(), LAUNCHER_LOG_FILE);
    let _ = append_to(&log_path, message);
}

/// User-facing warning: stderr for the person at the terminal, log file for
/// later diagnosis.
pub fn warn(message: &str) {
    eprintln!("streamlit-desktop: warning: {message}");
    append_launcher_log(&format!("warning: {message}"));
}
