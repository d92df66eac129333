use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::status::DEFAULT_REMOTE;

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_trunk_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_env_prefixes() -> Vec<String> {
    vec![".env".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_trunk_branches")]
    pub trunk_branches: Vec<String>,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_env_prefixes")]
    pub env_prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub delete_branch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_branch: default_base_branch(),
            trunk_branches: default_trunk_branches(),
            remote: default_remote(),
            env_prefixes: default_env_prefixes(),
            worktree_dir: None,
            delete_branch: true,
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml_ng::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }
}

pub struct Paths {
    pub config_path: PathBuf,
}

impl Paths {
    /// Resolve paths from environment (XDG_CONFIG_HOME / HOME). Called once at startup.
    pub fn resolve() -> Result<Paths> {
        let dir = config_dir()?;
        Ok(Paths {
            config_path: dir.join("config.yaml"),
        })
    }
}

/// Resolves the wtm config directory. Accepts injectable overrides for testing.
pub fn config_dir_with(xdg_config_home: Option<&str>, home: Option<&Path>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(xdg).join("wtm"));
    }
    let home = home.context("cannot determine home directory")?;
    Ok(home.join(".config").join("wtm"))
}

fn config_dir() -> Result<PathBuf> {
    config_dir_with(
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        dirs::home_dir().as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_xdg_set() {
        let dir = config_dir_with(Some("/custom/config"), None).unwrap();
        assert_eq!(dir, PathBuf::from("/custom/config/wtm"));
    }

    #[test]
    fn test_config_dir_xdg_empty_falls_back_to_home() {
        let dir = config_dir_with(Some(""), Some(Path::new("/home/user"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.config/wtm"));
    }

    #[test]
    fn test_config_dir_no_home_errors() {
        assert!(config_dir_with(None, None).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&tmp.path().join("config.yaml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.trunk_branches, vec!["main", "master"]);
        assert_eq!(cfg.remote, "origin");
        assert!(cfg.delete_branch);
    }

    #[test]
    fn test_load_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(
            &path,
            "base_branch: develop\ntrunk_branches: [develop, main]\nworktree_dir: /trees\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.base_branch, "develop");
        assert_eq!(cfg.trunk_branches, vec!["develop", "main"]);
        assert_eq!(cfg.worktree_dir, Some(PathBuf::from("/trees")));
        assert_eq!(cfg.remote, "origin");
        assert_eq!(cfg.env_prefixes, vec![".env"]);
        assert!(cfg.delete_branch);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "trunk_branches: {not: [a list\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
