use std::fs::File;
use std::io::{Write, BufRead, BufReader};
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use tracing::{debug, info};

pub const DEFAULT_DB_PATH: &str = "walltag.db";
pub const ENV_FILE: &str = ".env";

const DB_PATH_KEY: &str = "WALLTAG_DB_PATH";
const VERIFY_KEY: &str = "WALLTAG_VERIFY_ON_READ";

/// Settings for one invocation, built once and handed to `TagStore::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    /// Re-hash the file on `read_wp` and reject content that no longer matches.
    /// Only `read_wp` checks; `get` and `lookup` always trust the stored hash.
    pub verify_on_read: bool,
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Self {
        Self {
            db_path: db_path.into(),
            verify_on_read: true,
        }
    }

    /// Resolves settings: an explicit `db_path` wins, then the env file, then defaults.
    pub fn resolve(db_path: Option<PathBuf>, env_path: &Path) -> Result<Self> {
        let mut config = if env_path.exists() {
            let loaded = load_from_env(env_path)
                .with_context(|| format!("Failed to read {:?}", env_path))?;
            info!("Loaded settings from {:?}", env_path);
            loaded
        } else {
            debug!("No settings file at {:?}, using defaults", env_path);
            Self::default()
        };

        if let Some(path) = db_path {
            config.db_path = path;
        }
        Ok(config)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

fn load_from_env(path: &Path) -> Result<StoreConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config = StoreConfig::default();

    for line in reader.lines() {
        let line = line?;
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                DB_PATH_KEY => config.db_path = PathBuf::from(value.trim()),
                VERIFY_KEY => config.verify_on_read = parse_bool(value.trim())?,
                _ => {}
            }
        }
    }

    Ok(config)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Expected a boolean for {}, got '{}'", VERIFY_KEY, other)),
    }
}

pub fn save_to_env(path: &Path, config: &StoreConfig) -> Result<()> {
    let mut file = File::create(path).context("Failed to create .env file")?;
    writeln!(file, "{}={}", DB_PATH_KEY, config.db_path.display())?;
    writeln!(file, "{}={}", VERIFY_KEY, config.verify_on_read)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_save_and_load_env() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".env");
        let config = StoreConfig {
            db_path: PathBuf::from("/tmp/walls.db"),
            verify_on_read: false,
        };

        save_to_env(&path, &config)?;

        let content = fs::read_to_string(&path)?;
        assert!(content.contains("WALLTAG_DB_PATH=/tmp/walls.db"));
        assert!(content.contains("WALLTAG_VERIFY_ON_READ=false"));

        let loaded = load_from_env(&path)?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[test]
    fn test_resolve_precedence() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let env_path = dir.path().join(".env");

        let defaults = StoreConfig::resolve(None, &env_path)?;
        assert_eq!(defaults, StoreConfig::default());

        fs::write(&env_path, "WALLTAG_DB_PATH=from_env.db\nUNRELATED=1\n")?;
        let from_env = StoreConfig::resolve(None, &env_path)?;
        assert_eq!(from_env.db_path, PathBuf::from("from_env.db"));
        assert!(from_env.verify_on_read);

        let overridden = StoreConfig::resolve(Some(PathBuf::from("cli.db")), &env_path)?;
        assert_eq!(overridden.db_path, PathBuf::from("cli.db"));
        Ok(())
    }

    #[test]
    fn test_bad_boolean_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "WALLTAG_VERIFY_ON_READ=maybe\n")?;
        assert!(StoreConfig::resolve(None, &env_path).is_err());
        Ok(())
    }
}
