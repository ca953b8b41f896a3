use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let user_data_dir = discover_user_data_dir();
        let log_dir = user_data_dir.join("logs");
        let db_path = user_data_dir.join("paperbase.db");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            user_data_dir,
            log_dir,
            db_path,
        }
    }
}

fn discover_user_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("PAPERBASE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Paperbase");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Paperbase");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("paperbase")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Wall-clock limit per request, enforced at the transport layer.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            cors_allowed_origins: Vec::new(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Overlap must leave the window advancing, otherwise chunking never
    /// terminates. Checked once at startup, never at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunking.chunk_size must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved for a normal question.
    pub top_k: usize,
    /// Chunks retrieved when deep search is requested.
    pub top_k_deep: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            top_k_deep: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub groq_model: String,
    pub gemini_model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            groq_model: "llama3-8b-8192".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
}

impl AppConfig {
    /// Loads `config.yml` from the data dir when present, otherwise returns
    /// defaults. `PAPERBASE_CONFIG_PATH` overrides the location.
    pub fn load(paths: &AppPaths) -> anyhow::Result<Self> {
        let config_path = config_path(paths);

        let config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&raw)?
        } else {
            AppConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.chunking.validate()?;
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be greater than zero");
        }
        if self.retrieval.top_k == 0 || self.retrieval.top_k_deep == 0 {
            anyhow::bail!("retrieval.top_k and retrieval.top_k_deep must be at least 1");
        }
        Ok(())
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("PAPERBASE_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    paths.user_data_dir.join("config.yml")
}

/// API keys live in the environment only; they are never written to disk and
/// never echoed back through the API.
#[derive(Debug, Clone, Default)]
pub struct ProviderSecrets {
    pub groq_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl ProviderSecrets {
    pub fn from_env() -> Self {
        Self {
            groq_api_key: non_empty_env("GROQ_API_KEY"),
            google_api_key: non_empty_env("GOOGLE_API_KEY"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.top_k_deep, 10);
        assert_eq!(config.embedding.dimension, 768);
    }

    #[test]
    fn overlap_at_or_above_chunk_size_is_rejected() {
        let equal = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(equal.validate().is_err());

        let above = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 150,
        };
        assert!(above.validate().is_err());

        let ok = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 99,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let raw = "chunking:\n  chunk_size: 400\n";
        let config: AppConfig = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.server.port, 8787);
    }
}
