use std::{
    collections::BTreeMap,
    env,
    path::Path,
    process::{Command, Stdio},
};

use crate::config::{self, LaunchConfig, LaunchOverrides};
use crate::launch_plan::{self, LaunchPlan};
use crate::logging::{append_launcher_log, warn};
use crate::manifest;
use crate::window_actions;

fn env_snapshot() -> BTreeMap<String, String> {
    env::vars().collect()
}

fn script_stem(script: &Path) -> String {
    script
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The environment applied to the spawned subprocess: every resolved
/// Streamlit option as its string form, plus the child marker that keeps a
/// re-entrant `run` call inside the served script from launching again.
pub fn subprocess_env(config: &LaunchConfig) -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = config
        .options
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    vars.push((config::CHILD_ENV.to_string(), "1".to_string()));
    vars
}

fn spawn_detached(plan: &LaunchPlan) -> Result<(), String> {
    Command::new(&plan.cmd)
        .args(&plan.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run '{}': {}", plan.cmd, error))
}

fn run_blocking(plan: &LaunchPlan, vars: &[(String, String)]) -> Result<String, String> {
    Command::new(&plan.cmd)
        .args(&plan.args)
        .envs(vars.iter().map(|(key, value)| (key, value)))
        .status()
        .map(|status| status.to_string())
        .map_err(|error| format!("Failed to run '{}': {}", plan.cmd, error))
}

#[cfg(unix)]
fn ignore_interrupts() {
    // Ctrl-C reaches the whole foreground process group; the server owns its
    // own shutdown and the launcher exits cleanly once the wait returns.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
    }
}

#[cfg(not(unix))]
fn ignore_interrupts() {}

/// Launches `script` as a desktop app and exits the process. Returns
/// normally only on the guard path (already inside the app, or a debug
/// session) and for configuration errors surfaced before any side effect.
pub fn run(script: &Path, forwarded: &[String], overrides: &LaunchOverrides) -> Result<(), String> {
    let env = env_snapshot();
    if config::launch_guard_active(&env, overrides.debug) {
        append_launcher_log("launch skipped: already inside the app or a debug session");
        return Ok(());
    }

    let manifest = manifest::load_manifest(script)?;
    let config = config::resolve_config(&env, manifest.as_ref(), overrides, warn)?;

    if config.close_opened_window {
        window_actions::close_stale_windows(&script_stem(script), append_launcher_log);
    }

    let cli = launch_plan::resolve_streamlit_cli(&env)?;
    let server_plan = launch_plan::build_server_plan(&cli, &config, script, forwarded);

    ignore_interrupts();

    if config.open_as_app {
        let url = launch_plan::app_url(config.server_port())?;
        let browser_plan = launch_plan::build_browser_plan(&config.browser, &url);
        if config.print_command {
            println!("{}", browser_plan.render());
        }
        if let Err(error) = spawn_detached(&browser_plan) {
            warn(&format!("failed to open the app window: {error}"));
        }
    }

    if config.print_command {
        println!("{}", server_plan.render());
    }
    append_launcher_log(&format!("launching: {}", server_plan.render()));

    match run_blocking(&server_plan, &subprocess_env(&config)) {
        Ok(status) => append_launcher_log(&format!("streamlit exited with {status}")),
        Err(error) => warn(&format!("failed to launch streamlit: {error}")),
    }

    // The launcher's job ends with the server; interrupted or not, the exit
    // is the normal path.
    std::process::exit(0)
}
