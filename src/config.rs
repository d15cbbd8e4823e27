//! Configuration loaded from `scripture.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "scripture.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub quran_path: PathBuf,
    pub hadith_path: PathBuf,
    /// SQLite embedding cache; `None` embeds the corpora on every start
    pub cache_path: Option<PathBuf>,
    /// Results per corpus when the caller gives no limit
    pub top_k: usize,
    /// Upper bound for caller-supplied limits
    pub max_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quran_path: PathBuf::from("data/quran.csv"),
            hadith_path: PathBuf::from("data/hadith.csv"),
            cache_path: Some(PathBuf::from(".scripture/embeddings.db")),
            top_k: 5,
            max_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `scripture.yaml` in `cwd` is
    /// used when present, otherwise the defaults. Relative paths are resolved
    /// against the directory holding the config file (or `cwd`).
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let (config, base) = match explicit {
            Some(path) => {
                let path = absolutize(cwd, path);
                if !path.exists() {
                    return Err(SearchError::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
                (Self::from_file(&path)?, base)
            }
            None => {
                let implicit = cwd.join(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    (Self::from_file(&implicit)?, cwd.to_path_buf())
                } else {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    (Self::default(), cwd.to_path_buf())
                }
            }
        };

        let config = config.resolve(&base);
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; paths are left as written
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SearchError::config(e.to_string()))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn resolve(mut self, base: &Path) -> Self {
        self.quran_path = absolutize(base, &self.quran_path);
        self.hadith_path = absolutize(base, &self.hadith_path);
        self.cache_path = self.cache_path.map(|p| absolutize(base, &p));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(SearchError::config("top_k must be at least 1"));
        }
        if self.max_limit == 0 {
            return Err(SearchError::config("max_limit must be at least 1"));
        }
        Ok(())
    }

    /// Caller limit, falling back to `top_k`, clamped to `max_limit`
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.top_k).min(self.max_limit)
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.quran_path, dir.path().join("data/quran.csv"));
        assert_eq!(config.top_k, 5);
        assert_eq!(
            config.cache_path,
            Some(dir.path().join(".scripture/embeddings.db"))
        );
    }

    #[test]
    fn test_implicit_file_and_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "quran_path: corpora/q.csv\ntop_k: 3\ncache_path: null\n",
        )
        .unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.quran_path, dir.path().join("corpora/q.csv"));
        assert_eq!(config.hadith_path, dir.path().join("data/hadith.csv"));
        assert_eq!(config.cache_path, None);
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn test_explicit_file_resolves_relative_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("conf");
        std::fs::create_dir_all(&conf_dir).unwrap();
        let path = conf_dir.join("custom.yaml");
        std::fs::write(&path, "hadith_path: h.csv\n").unwrap();

        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(config.hadith_path, conf_dir.join("h.csv"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.yaml")), dir.path()).unwrap_err();
        assert!(matches!(err, SearchError::Config { .. }));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_yaml("top_k: 0").unwrap().validate(),
            Err(SearchError::Config { .. })
        ));
        assert!(matches!(
            Config::from_yaml("unknown_field: 1"),
            Err(SearchError::Config { .. })
        ));
    }

    #[test]
    fn test_clamp_limit() {
        let config = Config::default();
        assert_eq!(config.clamp_limit(None), 5);
        assert_eq!(config.clamp_limit(Some(20)), 20);
        assert_eq!(config.clamp_limit(Some(1000)), 100);
        assert_eq!(config.clamp_limit(Some(0)), 0);
    }
}
