//! Server configuration: defaults, an optional JSON file, env overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sketchy_game::GameConfig;

use crate::ServerError;

/// Path of a JSON config file to load before applying overrides.
pub const CONFIG_VAR: &str = "SKETCHY_CONFIG";
/// Overrides [`ServerConfig::bind`].
pub const BIND_VAR: &str = "SKETCHY_BIND";
/// Overrides [`ServerConfig::words`].
pub const WORDS_VAR: &str = "SKETCHY_WORDS";
/// Overrides [`GameConfig::max_rounds`].
pub const MAX_ROUNDS_VAR: &str = "SKETCHY_MAX_ROUNDS";

/// Everything needed to start a server.
///
/// ```json
/// {
///   "bind": "0.0.0.0:9000",
///   "words": "words.json",
///   "game": { "draw": 90000 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// JSON array of words. The built-in list is used when unset.
    pub words: Option<PathBuf>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            words: None,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Builds the config from the process environment.
    ///
    /// # Errors
    /// Fails if the file named by `SKETCHY_CONFIG` can't be read or parsed,
    /// or if an override doesn't parse.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let mut config = match var(CONFIG_VAR) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(var)?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(json)?)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ServerError> {
        if let Some(bind) = var(BIND_VAR) {
            self.bind = bind;
        }
        if let Some(words) = var(WORDS_VAR) {
            self.words = Some(PathBuf::from(words));
        }
        if let Some(value) = var(MAX_ROUNDS_VAR) {
            self.game.max_rounds = match value.trim().parse() {
                Ok(rounds) if rounds > 0 => rounds,
                _ => {
                    return Err(ServerError::InvalidEnv {
                        var: MAX_ROUNDS_VAR,
                        value,
                    });
                }
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_binds_localhost() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert!(config.words.is_none());
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_from_json_keeps_missing_fields() {
        let config =
            ServerConfig::from_json(r#"{"bind":"0.0.0.0:9000","game":{"draw":90000}}"#).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.game.draw, Duration::from_secs(90));
        assert_eq!(config.game.max_rounds, GameConfig::default().max_rounds);
        assert!(config.words.is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ServerConfig::from_json("{bind").unwrap_err();
        assert!(matches!(err, ServerError::ConfigParse(_)));
    }

    #[test]
    fn test_from_vars_without_anything_is_default() {
        let config = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_from_vars_applies_overrides() {
        let config = ServerConfig::from_vars(vars(&[
            (BIND_VAR, "0.0.0.0:1234"),
            (WORDS_VAR, "/tmp/words.json"),
            (MAX_ROUNDS_VAR, " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:1234");
        assert_eq!(config.words, Some(PathBuf::from("/tmp/words.json")));
        assert_eq!(config.game.max_rounds, 5);
    }

    #[test]
    fn test_from_vars_rejects_bad_max_rounds() {
        for bad in ["many", "0", "-1"] {
            let err = ServerConfig::from_vars(vars(&[(MAX_ROUNDS_VAR, bad)])).unwrap_err();
            assert!(
                matches!(err, ServerError::InvalidEnv { var: MAX_ROUNDS_VAR, .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_vars_missing_config_file() {
        let err =
            ServerConfig::from_vars(vars(&[(CONFIG_VAR, "/definitely/not/here.json")])).unwrap_err();
        assert!(matches!(err, ServerError::ConfigRead { .. }));
    }

    #[test]
    fn test_load_then_override() {
        let path = std::env::temp_dir().join(format!("sketchy-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"bind":"0.0.0.0:7000","game":{"max_rounds":2}}"#).unwrap();

        let file = path.to_string_lossy().into_owned();
        let config =
            ServerConfig::from_vars(vars(&[(CONFIG_VAR, &file), (MAX_ROUNDS_VAR, "4")])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bind, "0.0.0.0:7000");
        assert_eq!(config.game.max_rounds, 4);
    }
}
