//! Desktop launcher shell for Streamlit scripts: resolves the option
//! environment, opens a chromium app window pointed at the local server, runs
//! the Streamlit CLI, and exits the host process.

pub mod config;
pub mod launch_plan;
pub mod logging;
pub mod manifest;
pub mod options;
pub mod runner;
pub mod window_actions;

pub use config::{LaunchConfig, LaunchOverrides};
pub use runner::run;
pub use window_actions::close_app;
