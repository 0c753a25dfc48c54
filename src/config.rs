//! Demo configuration for the `prover` / `verifier` binaries
//!
//! Sources, later wins:
//!   built-in defaults → JSON file named by `--config` → `GKR_*` environment
//!   variables → CLI flags.
//!
//! | field        | default       | env         | flag       |
//! |--------------|---------------|-------------|------------|
//! | `lanes`      | `1024`        | `GKR_LANES` | `--lanes`  |
//! | `hash`       | `"blake3"`    | `GKR_HASH`  | `--hash`   |
//! | `nonce`      | `134234`      | `GKR_NONCE` | `--nonce`  |
//! | `seed`       | `0`           | `GKR_SEED`  | `--seed`   |
//! | `proof_path` | `"proof.gkr"` | `GKR_PROOF` | `--proof`  |

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`DemoConfig`].
    #[error("parse config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// An env var or flag did not parse.
    #[error("invalid value `{value}` for {key}")]
    InvalidValue {
        /// Env var or flag name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// The merged configuration is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Parameters of the demo pairwise-add run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Number of lanes in the demo circuit.
    pub lanes: usize,
    /// Registered hash name.
    pub hash: String,
    /// Transcript nonce.
    pub nonce: u64,
    /// Seed for the demo inputs.
    pub seed: u64,
    /// Proof file location.
    pub proof_path: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            lanes: 1024,
            hash: crate::hash::BLAKE3.to_string(),
            nonce: 134234,
            seed: 0,
            proof_path: PathBuf::from("proof.gkr"),
        }
    }
}

/// Value following `key` in `args`, if present.
pub fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn parse_num<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value })
}

impl DemoConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Merge every source. `env` is consulted for the `GKR_*` names.
    pub fn from_sources<E>(args: &[String], env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut cfg = match parse_flag(args, "--config") {
            Some(p) => Self::from_file(Path::new(&p))?,
            None => Self::default(),
        };

        if let Some(v) = env("GKR_LANES") {
            cfg.lanes = parse_num("GKR_LANES", v)?;
        }
        if let Some(v) = env("GKR_HASH") {
            cfg.hash = v;
        }
        if let Some(v) = env("GKR_NONCE") {
            cfg.nonce = parse_num("GKR_NONCE", v)?;
        }
        if let Some(v) = env("GKR_SEED") {
            cfg.seed = parse_num("GKR_SEED", v)?;
        }
        if let Some(v) = env("GKR_PROOF") {
            cfg.proof_path = PathBuf::from(v);
        }

        if let Some(v) = parse_flag(args, "--lanes") {
            cfg.lanes = parse_num("--lanes", v)?;
        }
        if let Some(v) = parse_flag(args, "--hash") {
            cfg.hash = v;
        }
        if let Some(v) = parse_flag(args, "--nonce") {
            cfg.nonce = parse_num("--nonce", v)?;
        }
        if let Some(v) = parse_flag(args, "--seed") {
            cfg.seed = parse_num("--seed", v)?;
        }
        if let Some(v) = parse_flag(args, "--proof") {
            cfg.proof_path = PathBuf::from(v);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// [`from_sources`](Self::from_sources) over the process environment.
    pub fn load(args: &[String]) -> Result<Self, ConfigError> {
        Self::from_sources(args, |k| std::env::var(k).ok())
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == 0 {
            return Err(ConfigError::Invalid("lanes must be positive"));
        }
        if self.hash.is_empty() {
            return Err(ConfigError::Invalid("hash name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let cfg = DemoConfig::from_sources(&[], env_of(&[])).unwrap();
        assert_eq!(cfg, DemoConfig::default());
        assert_eq!(cfg.nonce, 134234);
    }

    #[test]
    fn later_sources_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, r#"{ "lanes": 8, "hash": "sha256", "seed": 3 }"#).unwrap();
        let p = path.to_string_lossy().to_string();

        let file_only = DemoConfig::from_sources(&args(&["--config", &p]), env_of(&[])).unwrap();
        assert_eq!((file_only.lanes, file_only.hash.as_str(), file_only.seed), (8, "sha256", 3));
        assert_eq!(file_only.nonce, 134234);

        let env = env_of(&[("GKR_LANES", "16"), ("GKR_NONCE", "5")]);
        let with_env = DemoConfig::from_sources(&args(&["--config", &p]), env).unwrap();
        assert_eq!((with_env.lanes, with_env.nonce, with_env.seed), (16, 5, 3));

        let env = env_of(&[("GKR_LANES", "16")]);
        let with_flag = DemoConfig::from_sources(&args(&["--config", &p, "--lanes", "32", "--proof", "x.gkr"]), env)
            .unwrap();
        assert_eq!(with_flag.lanes, 32);
        assert_eq!(with_flag.proof_path, PathBuf::from("x.gkr"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = DemoConfig::from_sources(&args(&["--lanes", "many"]), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "--lanes"));

        let err = DemoConfig::from_sources(&[], env_of(&[("GKR_LANES", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unreadable_or_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json").to_string_lossy().to_string();
        assert!(matches!(
            DemoConfig::from_sources(&args(&["--config", &missing]), env_of(&[])),
            Err(ConfigError::Io { .. })
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "lanes": "eight" }"#).unwrap();
        let p = path.to_string_lossy().to_string();
        assert!(matches!(
            DemoConfig::from_sources(&args(&["--config", &p]), env_of(&[])),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn flag_parsing_takes_following_token() {
        let a = args(&["prover", "--hash", "sha256", "--seed"]);
        assert_eq!(parse_flag(&a, "--hash").as_deref(), Some("sha256"));
        assert_eq!(parse_flag(&a, "--seed"), None);
        assert_eq!(parse_flag(&a, "--nonce"), None);
    }
}
