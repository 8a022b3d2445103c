use std::fmt;

/// Namespace prefix shared by every Streamlit configuration variable.
pub const ENV_PREFIX: &str = "STREAMLIT_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Int,
    Float,
    Str,
    /// Constrained string; only the listed values are accepted.
    Enum(&'static [&'static str]),
}

/// A resolved option value. Stringification follows the forms the Streamlit
/// CLI accepts on the command line and in the environment, so booleans render
/// as `True`/`False`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => write!(f, "True"),
            OptionValue::Bool(false) => write!(f, "False"),
            OptionValue::Int(value) => write!(f, "{value}"),
            OptionValue::Float(value) => write!(f, "{value}"),
            OptionValue::Str(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub env_key: &'static str,
    pub kind: OptionKind,
}

const LOG_LEVELS: &[&str] = &["error", "warning", "info", "debug"];

/// Every Streamlit option the launcher recognizes. Keys supplied by callers
/// are matched against this table after canonicalization; anything else is
/// rejected at the boundary.
pub const OPTION_TABLE: &[OptionSpec] = &[
    OptionSpec { env_key: "STREAMLIT_GLOBAL_DISABLE_WATCHDOG_WARNING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_DISABLE_WIDGET_STATE_DUPLICATION_WARNING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_SHOW_WARNING_ON_DIRECT_EXECUTION", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_DEVELOPMENT_MODE", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_LOG_LEVEL", kind: OptionKind::Enum(LOG_LEVELS) },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_UNIT_TEST", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_APP_TEST", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_SUPPRESS_DEPRECATION_WARNINGS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_MIN_CACHED_MESSAGE_SIZE", kind: OptionKind::Float },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_MAX_CACHED_MESSAGE_AGE", kind: OptionKind::Int },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_STORE_CACHED_FORWARD_MESSAGES_IN_MEMORY", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_GLOBAL_DATA_FRAME_SERIALIZATION", kind: OptionKind::Enum(&["legacy", "arrow"]) },
    OptionSpec { env_key: "STREAMLIT_LOGGER_LEVEL", kind: OptionKind::Enum(LOG_LEVELS) },
    OptionSpec { env_key: "STREAMLIT_LOGGER_MESSAGE_FORMAT", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_LOGGER_ENABLE_RICH", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_CLIENT_CACHING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_CLIENT_DISPLAY_ENABLED", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_CLIENT_SHOW_ERROR_DETAILS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_CLIENT_TOOLBAR_MODE", kind: OptionKind::Enum(&["auto", "developer", "viewer", "minimal"]) },
    OptionSpec { env_key: "STREAMLIT_CLIENT_SHOW_SIDEBAR_NAVIGATION", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_MAGIC_ENABLED", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_INSTALL_TRACER", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_FIX_MATPLOTLIB", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_POST_SCRIPT_GC", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_FAST_RERUNS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_ENFORCE_SERIALIZABLE_SESSION_STATE", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_RUNNER_ENUM_COERCION", kind: OptionKind::Enum(&["off", "nameOnly", "nameAndValue"]) },
    OptionSpec { env_key: "STREAMLIT_SERVER_FOLDER_WATCH_BLACKLIST", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_SERVER_FILE_WATCHER_TYPE", kind: OptionKind::Enum(&["auto", "watchdog", "poll", "none"]) },
    OptionSpec { env_key: "STREAMLIT_SERVER_HEADLESS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_RUN_ON_SAVE", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_ALLOW_RUN_ON_SAVE", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_ADDRESS", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_SERVER_PORT", kind: OptionKind::Int },
    OptionSpec { env_key: "STREAMLIT_SERVER_SCRIPT_HEALTH_CHECK_ENABLED", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_BASE_URL_PATH", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_SERVER_ENABLE_CORS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_ENABLE_XSRF_PROTECTION", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_MAX_UPLOAD_SIZE", kind: OptionKind::Int },
    OptionSpec { env_key: "STREAMLIT_SERVER_MAX_MESSAGE_SIZE", kind: OptionKind::Int },
    OptionSpec { env_key: "STREAMLIT_SERVER_ENABLE_ARROW_TRUNCATION", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_ENABLE_WEBSOCKET_COMPRESSION", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_SERVER_ENABLE_STATIC_SERVING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_BROWSER_SERVER_ADDRESS", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_BROWSER_GATHER_USAGE_STATS", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_BROWSER_SERVER_PORT", kind: OptionKind::Int },
    OptionSpec { env_key: "STREAMLIT_SERVER_SSL_CERT_FILE", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_SERVER_SSL_KEY_FILE", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_UI_HIDE_TOP_BAR", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_UI_HIDE_SIDEBAR_NAV", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_MAGIC_DISPLAY_ROOT_DOC_STRING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_MAGIC_DISPLAY_LAST_EXPR_IF_NO_SEMICOLON", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_DEPRECATION_SHOWFILE_UPLOADER_ENCODING", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_DEPRECATION_SHOW_IMAGE_FORMAT", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_DEPRECATION_SHOW_PYPLOT_GLOBAL_USE", kind: OptionKind::Bool },
    OptionSpec { env_key: "STREAMLIT_THEME_BASE", kind: OptionKind::Enum(&["dark", "light"]) },
    OptionSpec { env_key: "STREAMLIT_THEME_PRIMARY_COLOR", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_THEME_BACKGROUND_COLOR", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_THEME_SECONDARY_BACKGROUND_COLOR", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_THEME_TEXT_COLOR", kind: OptionKind::Str },
    OptionSpec { env_key: "STREAMLIT_THEME_FONT", kind: OptionKind::Enum(&["sans serif", "serif", "monospace"]) },
];

/// Maps a caller-supplied key to its canonical environment key: uppercased
/// and prefixed with the Streamlit namespace unless already carrying it.
pub fn canonical_env_key(key: &str) -> String {
    let upper = key.to_ascii_uppercase();
    if upper.starts_with(ENV_PREFIX) {
        upper
    } else {
        format!("{ENV_PREFIX}{upper}")
    }
}

pub fn find_option(env_key: &str) -> Option<&'static OptionSpec> {
    OPTION_TABLE.iter().find(|spec| spec.env_key == env_key)
}

/// Parses a raw string into the value shape the option declares.
pub fn parse_value(spec: &OptionSpec, raw: &str) -> Result<OptionValue, String> {
    let trimmed = raw.trim();
    match spec.kind {
        OptionKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(OptionValue::Bool(true)),
            "false" | "0" => Ok(OptionValue::Bool(false)),
            _ => Err(format!(
                "Invalid boolean '{trimmed}' for {}.",
                spec.env_key
            )),
        },
        OptionKind::Int => trimmed
            .parse::<i64>()
            .map(OptionValue::Int)
            .map_err(|error| format!("Invalid integer '{trimmed}' for {}: {error}", spec.env_key)),
        OptionKind::Float => trimmed
            .parse::<f64>()
            .map(OptionValue::Float)
            .map_err(|error| format!("Invalid number '{trimmed}' for {}: {error}", spec.env_key)),
        OptionKind::Str => Ok(OptionValue::Str(trimmed.to_string())),
        OptionKind::Enum(allowed) => {
            if allowed.contains(&trimmed) {
                Ok(OptionValue::Str(trimmed.to_string()))
            } else {
                Err(format!(
                    "Invalid value '{trimmed}' for {}; expected one of {}.",
                    spec.env_key,
                    allowed.join(", ")
                ))
            }
        }
    }
}
