use std::{collections::BTreeMap, path::Path};

use url::Url;

use crate::config::LaunchConfig;
use crate::options::OptionValue;

/// Overrides the Streamlit CLI executable, e.g. `python -m streamlit`.
/// Split shell-style before use.
pub const STREAMLIT_CMD_ENV: &str = "STREAMLIT_DESKTOP_STREAMLIT_CMD";

#[derive(Debug)]
pub struct LaunchPlan {
    pub cmd: String,
    pub args: Vec<String>,
}

impl LaunchPlan {
    /// The command line as echoed to the user before execution.
    pub fn render(&self) -> String {
        let mut parts = vec![self.cmd.clone()];
        parts.extend(self.args.clone());
        parts.join(" ")
    }
}

/// The Streamlit CLI invocation, as pieces: program first, leading arguments
/// after. Defaults to the `streamlit` entry point on PATH.
pub fn resolve_streamlit_cli(env: &BTreeMap<String, String>) -> Result<Vec<String>, String> {
    let Some(custom_cmd) = env
        .get(STREAMLIT_CMD_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    else {
        return Ok(vec!["streamlit".to_string()]);
    };

    let pieces = shlex::split(&custom_cmd)
        .ok_or_else(|| format!("Invalid {STREAMLIT_CMD_ENV}: {custom_cmd}"))?;
    if pieces.is_empty() {
        return Err(format!("{STREAMLIT_CMD_ENV} is empty."));
    }
    Ok(pieces)
}

/// Builds `<cli> run --server.headless <Bool> --server.port <int> <script>
/// -- <argv…>`, the fixed shape the Streamlit CLI accepts.
pub fn build_server_plan(
    cli: &[String],
    config: &LaunchConfig,
    script: &Path,
    forwarded: &[String],
) -> LaunchPlan {
    let mut args: Vec<String> = cli[1..].to_vec();
    args.push("run".to_string());
    args.push("--server.headless".to_string());
    args.push(OptionValue::Bool(config.server_headless()).to_string());
    args.push("--server.port".to_string());
    args.push(config.server_port().to_string());
    args.push(script.to_string_lossy().to_string());
    args.push("--".to_string());
    args.extend(forwarded.iter().cloned());

    LaunchPlan {
        cmd: cli[0].clone(),
        args,
    }
}

/// The local URL the app window points at. The server binds locally; only
/// the port varies.
pub fn app_url(port: u16) -> Result<Url, String> {
    Url::parse(&format!("http://localhost:{port}/"))
        .map_err(|error| format!("Failed to build app URL for port {port}: {error}"))
}

#[cfg(target_os = "windows")]
pub fn build_browser_plan(browser: &str, url: &Url) -> LaunchPlan {
    // `start` resolves registered app names like msedge without a full path.
    LaunchPlan {
        cmd: "cmd".to_string(),
        args: vec![
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            browser.to_string(),
            format!("--app={url}"),
        ],
    }
}

#[cfg(not(target_os = "windows"))]
pub fn build_browser_plan(browser: &str, url: &Url) -> LaunchPlan {
    LaunchPlan {
        cmd: browser_binary(browser).to_string(),
        args: vec![format!("--app={url}")],
    }
}

/// Outside Windows the chromium browsers install under their long names.
#[cfg(not(target_os = "windows"))]
fn browser_binary(browser: &str) -> &str {
    match browser {
        "chrome" => "google-chrome",
        "msedge" => "microsoft-edge",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{resolve_config, LaunchOverrides};

    fn default_config() -> LaunchConfig {
        resolve_config(&BTreeMap::new(), None, &LaunchOverrides::default(), |_| {}).unwrap()
    }

    #[test]
    fn server_plan_matches_the_streamlit_cli_contract() {
        let cli = resolve_streamlit_cli(&BTreeMap::new()).unwrap();
        let plan = build_server_plan(
            &cli,
            &default_config(),
            &PathBuf::from("app.py"),
            &["--flag".to_string(), "value".to_string()],
        );

        assert_eq!(
            plan.render(),
            "streamlit run --server.headless True --server.port 8501 app.py -- --flag value"
        );
    }

    #[test]
    fn server_plan_renders_false_when_windowed() {
        let overrides = LaunchOverrides {
            open_as_app: Some(false),
            ..LaunchOverrides::default()
        };
        let config = resolve_config(&BTreeMap::new(), None, &overrides, |_| {}).unwrap();
        let cli = resolve_streamlit_cli(&BTreeMap::new()).unwrap();
        let plan = build_server_plan(&cli, &config, &PathBuf::from("app.py"), &[]);

        assert_eq!(
            plan.render(),
            "streamlit run --server.headless False --server.port 8501 app.py --"
        );
    }

    #[test]
    fn streamlit_cli_can_be_overridden_shell_style() {
        let env = BTreeMap::from([(
            STREAMLIT_CMD_ENV.to_string(),
            "python -m streamlit".to_string(),
        )]);
        let cli = resolve_streamlit_cli(&env).unwrap();
        assert_eq!(cli, vec!["python", "-m", "streamlit"]);

        let plan = build_server_plan(&cli, &default_config(), &PathBuf::from("app.py"), &[]);
        assert_eq!(plan.cmd, "python");
        assert_eq!(plan.args[0], "-m");
        assert_eq!(plan.args[1], "streamlit");
        assert_eq!(plan.args[2], "run");
    }

    #[test]
    fn blank_streamlit_cli_override_falls_back_to_default() {
        let env = BTreeMap::from([(STREAMLIT_CMD_ENV.to_string(), "   ".to_string())]);
        assert_eq!(resolve_streamlit_cli(&env).unwrap(), vec!["streamlit"]);
    }

    #[test]
    fn app_url_points_at_the_resolved_port() {
        assert_eq!(app_url(8501).unwrap().as_str(), "http://localhost:8501/");
        assert_eq!(app_url(8600).unwrap().as_str(), "http://localhost:8600/");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn browser_plan_uses_the_app_flag() {
        let url = app_url(8501).unwrap();
        let plan = build_browser_plan("chrome", &url);
        assert_eq!(plan.cmd, "google-chrome");
        assert_eq!(plan.args, vec!["--app=http://localhost:8501/"]);

        let plan = build_browser_plan("msedge", &url);
        assert_eq!(plan.cmd, "microsoft-edge");
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn browser_plan_goes_through_start() {
        let url = app_url(8501).unwrap();
        let plan = build_browser_plan("msedge", &url);
        assert_eq!(plan.cmd, "cmd");
        assert!(plan.args.contains(&"start".to_string()));
        assert!(plan.args.contains(&"--app=http://localhost:8501/".to_string()));
    }
}
