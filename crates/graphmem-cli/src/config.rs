//! Configuration Vault – reads/writes `~/.graphmem/config.toml`.

use graphmem_memory::{MemoryConfig, RankerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which [`Generator`][graphmem_runtime::Generator] answers chat turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Lift answers straight from retrieved facts; works offline.
    #[default]
    Heuristic,
    /// Forward prompts to an OpenAI-compatible server.
    Llm,
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorKind::Heuristic => write!(f, "heuristic"),
            GeneratorKind::Llm => write!(f, "llm"),
        }
    }
}

/// Persisted user configuration stored in `~/.graphmem/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Facts retrieved as context for each chat turn and `/recall`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates ranked by `/ask`.
    #[serde(default = "default_answer_k")]
    pub answer_k: usize,

    #[serde(default)]
    pub generator: GeneratorKind,

    /// Base URL of the OpenAI-compatible model server.
    #[serde(default = "default_llm_url")]
    pub llm_url: String,

    /// Model name sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token for hosted endpoints (stored as plain text; the file is
    /// written owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// FAQ JSON loaded at startup when no path is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq_path: Option<PathBuf>,

    /// Fact store parameters (`dimension`, `tau`, `neighbor_k`, `alpha`).
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Hybrid ranker weights and thresholds used by `/ask`.
    #[serde(default)]
    pub ranker: RankerConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("memory", &self.memory)
            .field("ranker", &self.ranker)
            .field("top_k", &self.top_k)
            .field("answer_k", &self.answer_k)
            .field("generator", &self.generator)
            .field("llm_url", &self.llm_url)
            .field("model", &self.model)
            .field(
                "api_key",
                if self.api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("faq_path", &self.faq_path)
            .finish()
    }
}

fn default_top_k() -> usize {
    6
}
fn default_answer_k() -> usize {
    5
}
fn default_llm_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            ranker: RankerConfig::default(),
            top_k: default_top_k(),
            answer_k: default_answer_k(),
            generator: GeneratorKind::default(),
            llm_url: default_llm_url(),
            model: default_model(),
            api_key: String::new(),
            faq_path: None,
        }
    }
}

/// Return the path to `~/.graphmem/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".graphmem").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    Ok(load_from(&config_path())?.map(|mut cfg| {
        apply_env_overrides(&mut cfg);
        cfg
    }))
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply `GRAPHMEM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `GRAPHMEM_LLM_URL` | `llm_url` |
/// | `GRAPHMEM_MODEL` | `model` |
/// | `GRAPHMEM_TAU` | `memory.tau` |
/// | `GRAPHMEM_ALPHA` | `memory.alpha` and `ranker.alpha` |
/// | `GRAPHMEM_FAQ_PATH` | `faq_path` |
///
/// Values that do not parse as numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("GRAPHMEM_LLM_URL") {
        cfg.llm_url = v;
    }
    if let Ok(v) = std::env::var("GRAPHMEM_MODEL") {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("GRAPHMEM_TAU")
        && let Ok(tau) = v.parse::<f32>()
    {
        cfg.memory.tau = tau;
    }
    if let Ok(v) = std::env::var("GRAPHMEM_ALPHA")
        && let Ok(alpha) = v.parse::<f64>()
    {
        cfg.memory.alpha = alpha;
        cfg.ranker.alpha = alpha;
    }
    if let Ok(v) = std::env::var("GRAPHMEM_FAQ_PATH") {
        cfg.faq_path = Some(PathBuf::from(v));
    }
}

/// Save the config to disk, creating `~/.graphmem/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_redacts_api_key() {
        let cfg = Config {
            api_key: "sk-super-secret".to_string(),
            ..Config::default()
        };
        let debug_str = format!("{:?}", cfg);
        assert!(!debug_str.contains("sk-super-secret"));
        assert!(debug_str.contains("<redacted>"));
    }

    #[test]
    fn config_debug_shows_not_set_for_empty_key() {
        let debug_str = format!("{:?}", Config::default());
        assert!(debug_str.contains("<not set>"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);

        let dir_meta = std::fs::metadata(path.parent().unwrap()).expect("dir metadata");
        assert_eq!(dir_meta.permissions().mode() & 0o777, 0o700);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.memory, MemoryConfig::default());
        assert_eq!(loaded.ranker.guard_keywords, RankerConfig::default().guard_keywords);
        assert_eq!(loaded.top_k, 6);
        assert_eq!(loaded.generator, GeneratorKind::Heuristic);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "generator = \"llm\"\n\n[memory]\nneighbor_k = 3\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.generator, GeneratorKind::Llm);
        assert_eq!(loaded.memory.neighbor_k, 3);
        assert_eq!(loaded.memory.dimension, 256);
        assert_eq!(loaded.answer_k, 5);
        assert_eq!(loaded.ranker.lex_weight, 0.4);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "top_k = \"six\"").unwrap();
        assert!(load_from(&path).unwrap_err().contains("Failed to parse config"));
    }

    #[test]
    fn config_path_points_to_graphmem_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".graphmem"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // ── environment overrides ────────────────────────────────────────────────
    // Each test owns a distinct variable so parallel tests do not race.

    #[test]
    fn apply_env_overrides_changes_llm_url() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("GRAPHMEM_LLM_URL", "http://gpu-box:11434") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.llm_url, "http://gpu-box:11434");
        unsafe { std::env::remove_var("GRAPHMEM_LLM_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_model() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("GRAPHMEM_MODEL", "mistral") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.model, "mistral");
        unsafe { std::env::remove_var("GRAPHMEM_MODEL") };
    }

    #[test]
    fn apply_env_overrides_parses_tau_and_ignores_garbage() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("GRAPHMEM_TAU", "0.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.memory.tau, 0.5);

        unsafe { std::env::set_var("GRAPHMEM_TAU", "high") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.memory.tau, MemoryConfig::default().tau);
        unsafe { std::env::remove_var("GRAPHMEM_TAU") };
    }

    #[test]
    fn apply_env_overrides_sets_both_alphas() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("GRAPHMEM_ALPHA", "0.9") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.memory.alpha, 0.9);
        assert_eq!(cfg.ranker.alpha, 0.9);
        unsafe { std::env::remove_var("GRAPHMEM_ALPHA") };
    }

    #[test]
    fn apply_env_overrides_sets_faq_path() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("GRAPHMEM_FAQ_PATH", "/data/faq.json") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.faq_path, Some(PathBuf::from("/data/faq.json")));
        unsafe { std::env::remove_var("GRAPHMEM_FAQ_PATH") };
    }
}
