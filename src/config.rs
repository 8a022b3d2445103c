use std::collections::BTreeMap;

use crate::manifest::AppManifest;
use crate::options::{self, OptionKind, OptionValue};

/// Set on the spawned Streamlit subprocess. When the served script invokes
/// the launcher again, its presence turns `run` into a no-op.
pub const CHILD_ENV: &str = "STREAMLIT_DESKTOP_CHILD";
/// Marks an interactive/debug session; `run` short-circuits when truthy.
pub const DEBUG_ENV: &str = "STREAMLIT_DESKTOP_DEBUG";

pub const DEFAULT_BROWSER: &str = "msedge";
pub const DEFAULT_SERVER_PORT: u16 = 8501;

const SERVER_HEADLESS_KEY: &str = "STREAMLIT_SERVER_HEADLESS";
const SERVER_PORT_KEY: &str = "STREAMLIT_SERVER_PORT";

/// Caller-supplied overrides, the highest-precedence configuration layer.
/// Streamlit option keys are given without the namespace prefix
/// (`server_port`, not `STREAMLIT_SERVER_PORT`) with raw string values.
#[derive(Debug, Clone, Default)]
pub struct LaunchOverrides {
    pub open_as_app: Option<bool>,
    pub browser: Option<String>,
    pub close_opened_window: Option<bool>,
    pub print_command: Option<bool>,
    pub debug: bool,
    pub options: Vec<(String, String)>,
}

/// The resolved, immutable configuration for one launch. Built once by
/// `resolve_config` and passed by value; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub open_as_app: bool,
    pub browser: String,
    pub close_opened_window: bool,
    pub print_command: bool,
    /// Canonical env key → resolved value, for every Streamlit option that
    /// ended up set. The spawned subprocess receives each as its string form.
    pub options: BTreeMap<&'static str, OptionValue>,
}

impl LaunchConfig {
    pub fn server_port(&self) -> u16 {
        match self.options.get(SERVER_PORT_KEY) {
            Some(OptionValue::Int(port)) => *port as u16,
            _ => DEFAULT_SERVER_PORT,
        }
    }

    pub fn server_headless(&self) -> bool {
        matches!(
            self.options.get(SERVER_HEADLESS_KEY),
            Some(OptionValue::Bool(true))
        )
    }
}

/// App mode relies on the chromium `--app=` flag; only chromium browsers
/// qualify.
pub fn browser_supports_app_mode(name: &str) -> bool {
    matches!(name, "chrome" | "msedge")
}

fn streamlit_defaults() -> BTreeMap<&'static str, OptionValue> {
    BTreeMap::from([
        (
            "STREAMLIT_CLIENT_TOOLBAR_MODE",
            OptionValue::Str("minimal".to_string()),
        ),
        ("STREAMLIT_SERVER_RUN_ON_SAVE", OptionValue::Bool(true)),
        (
            SERVER_PORT_KEY,
            OptionValue::Int(i64::from(DEFAULT_SERVER_PORT)),
        ),
        ("STREAMLIT_THEME_BASE", OptionValue::Str("light".to_string())),
    ])
}

fn env_flag_active(env: &BTreeMap<String, String>, key: &str) -> bool {
    match env.get(key) {
        Some(value) => {
            let trimmed = value.trim();
            !trimmed.is_empty() && trimmed != "0" && !trimmed.eq_ignore_ascii_case("false")
        }
        None => false,
    }
}

/// True when the calling process is the spawned subprocess itself, or when a
/// debug session opted out of launching.
pub fn launch_guard_active(env: &BTreeMap<String, String>, debug_override: bool) -> bool {
    debug_override || env_flag_active(env, CHILD_ENV) || env_flag_active(env, DEBUG_ENV)
}

fn option_value_from_json(
    spec: &'static options::OptionSpec,
    key: &str,
    value: &serde_json::Value,
) -> Result<OptionValue, String> {
    match (spec.kind, value) {
        (OptionKind::Bool, serde_json::Value::Bool(flag)) => Ok(OptionValue::Bool(*flag)),
        (OptionKind::Int, serde_json::Value::Number(number)) => number
            .as_i64()
            .map(OptionValue::Int)
            .ok_or_else(|| format!("Invalid integer for manifest option '{key}'.")),
        (OptionKind::Float, serde_json::Value::Number(number)) => number
            .as_f64()
            .map(OptionValue::Float)
            .ok_or_else(|| format!("Invalid number for manifest option '{key}'.")),
        (_, serde_json::Value::String(raw)) => options::parse_value(spec, raw),
        _ => Err(format!(
            "Manifest option '{key}' has the wrong type for {}.",
            spec.env_key
        )),
    }
}

fn lookup_spec(key: &str) -> Result<&'static options::OptionSpec, String> {
    let env_key = options::canonical_env_key(key);
    options::find_option(&env_key)
        .ok_or_else(|| format!("Unknown Streamlit option '{key}' (resolved to {env_key})."))
}

/// Pure configuration merge: built-in defaults, then the environment
/// snapshot, then the manifest, then caller overrides. Warnings (unparsable
/// environment values, unsupported browser) go through `warn`; bad caller or
/// manifest input is a hard error.
pub fn resolve_config<F>(
    env: &BTreeMap<String, String>,
    manifest: Option<&AppManifest>,
    overrides: &LaunchOverrides,
    warn: F,
) -> Result<LaunchConfig, String>
where
    F: Fn(&str),
{
    let mut resolved = streamlit_defaults();

    for spec in options::OPTION_TABLE {
        let Some(raw) = env.get(spec.env_key) else {
            continue;
        };
        match options::parse_value(spec, raw) {
            Ok(value) => {
                resolved.insert(spec.env_key, value);
            }
            Err(error) => warn(&format!("ignoring environment value: {error}")),
        }
    }

    if let Some(manifest) = manifest {
        for (key, value) in &manifest.options {
            let spec = lookup_spec(key)?;
            resolved.insert(spec.env_key, option_value_from_json(spec, key, value)?);
        }
    }

    for (key, raw) in &overrides.options {
        let spec = lookup_spec(key)?;
        resolved.insert(spec.env_key, options::parse_value(spec, raw)?);
    }

    let manifest_or = |field: fn(&AppManifest) -> Option<bool>| manifest.and_then(field);
    let mut open_as_app = overrides
        .open_as_app
        .or(manifest_or(|m| m.open_as_app))
        .unwrap_or(true);
    let browser = overrides
        .browser
        .clone()
        .or_else(|| manifest.and_then(|m| m.browser.clone()))
        .unwrap_or_else(|| DEFAULT_BROWSER.to_string());
    let close_opened_window = overrides
        .close_opened_window
        .or(manifest_or(|m| m.close_opened_window))
        .unwrap_or(true);
    let print_command = overrides
        .print_command
        .or(manifest_or(|m| m.print_command))
        .unwrap_or(true);

    if open_as_app && !browser_supports_app_mode(&browser) {
        warn(&format!(
            "app mode is only supported for chromium browsers (chrome, msedge), not '{browser}'; \
             opening disabled for this run"
        ));
        open_as_app = false;
    }

    // Headless only derives when no layer supplied it: a visible window comes
    // from the browser in app mode, from Streamlit itself otherwise.
    if !resolved.contains_key(SERVER_HEADLESS_KEY) {
        resolved.insert(SERVER_HEADLESS_KEY, OptionValue::Bool(open_as_app));
    }

    match resolved.get(SERVER_PORT_KEY) {
        Some(OptionValue::Int(port)) if (1..=i64::from(u16::MAX)).contains(port) => {}
        Some(other) => {
            return Err(format!("Invalid server port '{other}'; expected 1-65535."));
        }
        None => {}
    }

    Ok(LaunchConfig {
        open_as_app,
        browser,
        close_opened_window,
        print_command,
        options: resolved,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn no_warnings(message: &str) {
        panic!("unexpected warning: {message}");
    }

    fn env_of(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn overrides_of(pairs: &[(&str, &str)]) -> LaunchOverrides {
        LaunchOverrides {
            options: pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            ..LaunchOverrides::default()
        }
    }

    #[test]
    fn resolve_config_applies_builtin_defaults() {
        let config =
            resolve_config(&BTreeMap::new(), None, &LaunchOverrides::default(), no_warnings)
                .unwrap();

        assert!(config.open_as_app);
        assert_eq!(config.browser, "msedge");
        assert!(config.close_opened_window);
        assert!(config.print_command);
        assert_eq!(config.server_port(), 8501);
        assert_eq!(
            config.options.get("STREAMLIT_CLIENT_TOOLBAR_MODE"),
            Some(&OptionValue::Str("minimal".to_string()))
        );
        assert_eq!(
            config.options.get("STREAMLIT_THEME_BASE"),
            Some(&OptionValue::Str("light".to_string()))
        );
    }

    #[test]
    fn caller_keys_resolve_to_prefixed_env_keys() {
        let overrides = overrides_of(&[("client_caching", "true"), ("server_address", "0.0.0.0")]);
        let config = resolve_config(&BTreeMap::new(), None, &overrides, no_warnings).unwrap();

        assert_eq!(
            config.options.get("STREAMLIT_CLIENT_CACHING"),
            Some(&OptionValue::Bool(true))
        );
        assert_eq!(
            config.options.get("STREAMLIT_SERVER_ADDRESS"),
            Some(&OptionValue::Str("0.0.0.0".to_string()))
        );
    }

    #[test]
    fn environment_beats_defaults_and_overrides_beat_environment() {
        let env = env_of(&[("STREAMLIT_SERVER_PORT", "8600")]);
        let config =
            resolve_config(&env, None, &LaunchOverrides::default(), no_warnings).unwrap();
        assert_eq!(config.server_port(), 8600);

        let overrides = overrides_of(&[("server_port", "8700")]);
        let config = resolve_config(&env, None, &overrides, no_warnings).unwrap();
        assert_eq!(config.server_port(), 8700);
    }

    #[test]
    fn manifest_beats_environment_and_loses_to_overrides() {
        let env = env_of(&[("STREAMLIT_SERVER_PORT", "8600")]);
        let manifest = AppManifest {
            browser: Some("chrome".to_string()),
            options: BTreeMap::from([(
                "server_port".to_string(),
                serde_json::json!(8700),
            )]),
            ..AppManifest::default()
        };

        let config =
            resolve_config(&env, Some(&manifest), &LaunchOverrides::default(), no_warnings)
                .unwrap();
        assert_eq!(config.server_port(), 8700);
        assert_eq!(config.browser, "chrome");

        let overrides = LaunchOverrides {
            browser: Some("msedge".to_string()),
            options: vec![("server_port".to_string(), "8800".to_string())],
            ..LaunchOverrides::default()
        };
        let config =
            resolve_config(&env, Some(&manifest), &overrides, no_warnings).unwrap();
        assert_eq!(config.server_port(), 8800);
        assert_eq!(config.browser, "msedge");
    }

    #[test]
    fn unparsable_environment_values_warn_and_are_skipped() {
        let env = env_of(&[("STREAMLIT_SERVER_PORT", "lots")]);
        let warnings = RefCell::new(Vec::new());

        let config = resolve_config(&env, None, &LaunchOverrides::default(), |message| {
            warnings.borrow_mut().push(message.to_string())
        })
        .unwrap();

        assert_eq!(config.server_port(), 8501);
        assert_eq!(warnings.borrow().len(), 1);
        assert!(warnings.borrow()[0].contains("STREAMLIT_SERVER_PORT"));
    }

    #[test]
    fn headless_derives_from_open_as_app_when_unset() {
        let config =
            resolve_config(&BTreeMap::new(), None, &LaunchOverrides::default(), no_warnings)
                .unwrap();
        assert!(config.server_headless());

        let overrides = LaunchOverrides {
            open_as_app: Some(false),
            ..LaunchOverrides::default()
        };
        let config =
            resolve_config(&BTreeMap::new(), None, &overrides, no_warnings).unwrap();
        assert!(!config.server_headless());
    }

    #[test]
    fn explicit_headless_is_never_overridden() {
        let env = env_of(&[("STREAMLIT_SERVER_HEADLESS", "False")]);
        let config =
            resolve_config(&env, None, &LaunchOverrides::default(), no_warnings).unwrap();

        assert!(config.open_as_app);
        assert!(!config.server_headless());
    }

    #[test]
    fn unsupported_browser_warns_and_disables_app_mode() {
        let overrides = LaunchOverrides {
            browser: Some("firefox".to_string()),
            ..LaunchOverrides::default()
        };
        let warnings = RefCell::new(Vec::new());

        let config = resolve_config(&BTreeMap::new(), None, &overrides, |message| {
            warnings.borrow_mut().push(message.to_string())
        })
        .unwrap();

        assert!(!config.open_as_app);
        // App mode was disabled before the headless derivation ran.
        assert!(!config.server_headless());
        assert_eq!(warnings.borrow().len(), 1);
        assert!(warnings.borrow()[0].contains("firefox"));
    }

    #[test]
    fn unknown_override_keys_are_rejected() {
        let overrides = overrides_of(&[("server_turbo_mode", "true")]);
        let error =
            resolve_config(&BTreeMap::new(), None, &overrides, no_warnings).unwrap_err();
        assert!(error.contains("server_turbo_mode"));
    }

    #[test]
    fn ill_typed_manifest_options_are_rejected() {
        let manifest = AppManifest {
            options: BTreeMap::from([(
                "server_port".to_string(),
                serde_json::json!(true),
            )]),
            ..AppManifest::default()
        };
        let error = resolve_config(
            &BTreeMap::new(),
            Some(&manifest),
            &LaunchOverrides::default(),
            no_warnings,
        )
        .unwrap_err();
        assert!(error.contains("server_port"));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let overrides = overrides_of(&[("server_port", "70000")]);
        assert!(resolve_config(&BTreeMap::new(), None, &overrides, no_warnings).is_err());
    }

    #[test]
    fn launch_guard_reads_child_and_debug_markers() {
        assert!(!launch_guard_active(&BTreeMap::new(), false));
        assert!(launch_guard_active(&BTreeMap::new(), true));
        assert!(launch_guard_active(&env_of(&[(CHILD_ENV, "1")]), false));
        assert!(launch_guard_active(&env_of(&[(DEBUG_ENV, "true")]), false));
        assert!(!launch_guard_active(&env_of(&[(DEBUG_ENV, "0")]), false));
        assert!(!launch_guard_active(&env_of(&[(CHILD_ENV, "false")]), false));
    }
}
