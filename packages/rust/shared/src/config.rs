//! Application configuration for stackpost.
//!
//! User config lives at `~/.stackpost/stackpost.toml`.
//! A missing file means built-in defaults. `--config` (or `STACKPOST_CONFIG`)
//! points at a different file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StackpostError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "stackpost.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".stackpost";

/// Largest accepted search window, roughly a century.
const MAX_WINDOW_DAYS: u32 = 36_500;

// ---------------------------------------------------------------------------
// Config structs (matching stackpost.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Question search settings.
    #[serde(default)]
    pub questions: QuestionsConfig,

    /// Completion API settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Output document settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[questions]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsConfig {
    /// Stack Exchange API root.
    #[serde(default = "default_questions_api_base")]
    pub api_base: String,

    /// Stack Exchange site parameter.
    #[serde(default = "default_site")]
    pub site: String,

    /// Tags to pick from, one chosen uniformly per run.
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Number of questions requested per search.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Only questions created within this many days are considered.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Name of the env var holding an optional Stack Exchange app key.
    #[serde(default = "default_questions_key_env")]
    pub key_env: String,

    /// HTTP timeout for search requests.
    #[serde(default = "default_questions_timeout")]
    pub timeout_secs: u64,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            api_base: default_questions_api_base(),
            site: default_site(),
            tags: default_tags(),
            page_size: default_page_size(),
            window_days: default_window_days(),
            key_env: default_questions_key_env(),
            timeout_secs: default_questions_timeout(),
        }
    }
}

fn default_questions_api_base() -> String {
    "https://api.stackexchange.com/2.3".into()
}
fn default_site() -> String {
    "stackoverflow".into()
}
fn default_tags() -> Vec<String> {
    [
        "javascript",
        "typescript",
        "reactjs",
        "html",
        "css",
        "nestjs",
        "nodejs",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_page_size() -> u32 {
    20
}
fn default_window_days() -> u32 {
    365
}
fn default_questions_key_env() -> String {
    "STACKEXCHANGE_KEY".into()
}
fn default_questions_timeout() -> u64 {
    30
}

/// `[completion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API root; `/completions` is appended.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Engine/model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    #[serde(default)]
    pub presence_penalty: f32,

    /// HTTP timeout for a single completion request.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo-instruct".into()
}
fn default_api_key_env() -> String {
    "OPEN_API_KEY".into()
}
fn default_top_p() -> f32 {
    1.0
}
fn default_completion_timeout() -> u64 {
    120
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory posts are written into. Must already exist.
    #[serde(default = "default_posts_dir")]
    pub posts_dir: String,

    /// Front matter `layout` value.
    #[serde(default = "default_layout")]
    pub layout: String,

    /// Markdown image placed between the front matter and the body.
    #[serde(default = "default_banner_image")]
    pub banner_image: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            posts_dir: default_posts_dir(),
            layout: default_layout(),
            banner_image: default_banner_image(),
        }
    }
}

fn default_posts_dir() -> String {
    "_posts".into()
}
fn default_layout() -> String {
    "post".into()
}
fn default_banner_image() -> String {
    "![Image of a Cat](http://source.unsplash.com/1600x900/?cat)".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.stackpost/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StackpostError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.stackpost/stackpost.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StackpostError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        StackpostError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| StackpostError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| StackpostError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StackpostError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject configs that cannot produce a run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.questions.tags.iter().all(|t| t.trim().is_empty()) {
        return Err(StackpostError::config("[questions] tags must not be empty"));
    }
    if config.questions.page_size == 0 || config.questions.page_size > 100 {
        return Err(StackpostError::config(format!(
            "[questions] page_size must be between 1 and 100, got {}",
            config.questions.page_size
        )));
    }
    if !(1..=MAX_WINDOW_DAYS).contains(&config.questions.window_days) {
        return Err(StackpostError::config(format!(
            "[questions] window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
            config.questions.window_days
        )));
    }
    for (key, value) in [
        ("questions.api_base", &config.questions.api_base),
        ("completion.base_url", &config.completion.base_url),
    ] {
        Url::parse(value)
            .map_err(|e| StackpostError::config(format!("{key} '{value}' is not a URL: {e}")))?;
    }
    Ok(())
}

/// Read the completion API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.completion.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(StackpostError::config(format!(
            "completion API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Read the optional Stack Exchange app key. Unset or empty means anonymous quota.
pub fn resolve_questions_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.questions.key_env)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("posts_dir"));
        assert!(toml_str.contains("OPEN_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.questions.page_size, 20);
        assert_eq!(parsed.questions.window_days, 365);
        assert_eq!(parsed.questions.tags.len(), 7);
        assert_eq!(parsed.completion.api_key_env, "OPEN_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[questions]
tags = ["rust"]

[output]
posts_dir = "/tmp/blog/_posts"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.questions.tags, vec!["rust".to_string()]);
        assert_eq!(config.questions.site, "stackoverflow");
        assert_eq!(config.output.posts_dir, "/tmp/blog/_posts");
        assert_eq!(config.output.layout, "post");
        assert!((config.completion.top_p - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stackpost.toml");
        std::fs::write(&path, "[completion]\nmodel = \"my-model\"\n").expect("write");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.completion.model, "my-model");
    }

    #[test]
    fn load_config_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stackpost.toml");
        std::fs::write(&path, "this is = = not toml").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn empty_tags_rejected() {
        let mut config = AppConfig::default();
        config.questions.tags.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tags must not be empty"));
    }

    #[test]
    fn oversized_page_rejected() {
        let mut config = AppConfig::default();
        config.questions.page_size = 500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn window_days_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.questions.window_days = 200_000_000;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("window_days"));

        config.questions.window_days = 0;
        assert!(validate_config(&config).is_err());

        config.questions.window_days = 36_500;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn load_config_rejects_huge_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stackpost.toml");
        std::fs::write(&path, "[questions]\nwindow_days = 200000000\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.completion.api_key_env = "SP_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn questions_key_is_optional() {
        let mut config = AppConfig::default();
        config.questions.key_env = "SP_TEST_NONEXISTENT_SE_KEY_12345".into();
        assert!(resolve_questions_key(&config).is_none());
    }
}
