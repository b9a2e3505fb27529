//! Configuration for the token signer.
//!
//! Settings are read from a YAML file (`config.yaml` in the directory named by
//! `CONFIG_FILE_PATH`) and then overridden by `JWT_*` environment variables.
//! The resulting value is passed explicitly to [`crate::KeyStore::new`].

use crate::error::TokenError;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up inside the base path.
pub const FILE_NAME: &str = "config.yaml";

/// Environment variable naming the directory holding [`FILE_NAME`].
pub const BASE_PATH: &str = "CONFIG_FILE_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Key material settings
    #[serde(default)]
    pub jwt: JwtConfig,
}

/// Key material settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct JwtConfig {
    /// Directory holding the key files
    pub keys_directory: PathBuf,
    /// File name of the PEM-encoded PKCS1 private key
    pub private_key: String,
    /// File name of the PEM-encoded X.509 certificate
    pub public_key: String,
    /// Generate an in-memory key pair instead of reading files
    pub generate_keys: bool,
    /// Root used to resolve `keys_directory` when it does not exist as given.
    /// Defaults to the directory of the running executable.
    pub install_root: Option<PathBuf>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            keys_directory: PathBuf::from("keys"),
            private_key: "private.pem".to_string(),
            public_key: "public.crt".to_string(),
            generate_keys: false,
            install_root: None,
        }
    }
}

impl JwtConfig {
    /// Config pointing at key files in `dir`.
    pub fn new(
        dir: impl Into<PathBuf>,
        private_key: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            keys_directory: dir.into(),
            private_key: private_key.into(),
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    /// Config that generates an ephemeral key pair.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            generate_keys: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = Some(root.into());
        self
    }

    fn validate(&self) -> Result<(), TokenError> {
        if self.generate_keys {
            return Ok(());
        }
        if self.private_key.trim().is_empty() {
            return Err(TokenError::config("private-key must not be empty"));
        }
        if self.public_key.trim().is_empty() {
            return Err(TokenError::config("public-key must not be empty"));
        }
        if self.keys_directory.as_os_str().is_empty() {
            return Err(TokenError::config("keys-directory must not be empty"));
        }
        Ok(())
    }
}

impl Config {
    /// Load `config.yaml` from `CONFIG_FILE_PATH` (or the working directory)
    /// if present, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a variable is invalid.
    pub fn load() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let base = match env::var(BASE_PATH) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => {
                tracing::debug!("{BASE_PATH} not set, using working directory");
                PathBuf::from(".")
            }
        };
        let path = base.join(FILE_NAME);

        let mut config = if path.is_file() {
            Self::read_file(&path)?
        } else {
            tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
            Self::default()
        };
        config.apply_env()?;
        config.jwt.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed, or invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let mut config = Self::read_file(path.as_ref())?;
        config.apply_env()?;
        config.jwt.validate()?;
        Ok(config)
    }

    /// Configuration built from defaults and environment variables only.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        config.apply_env()?;
        config.jwt.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, TokenError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .build()
            .map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "configuration file retrieval failed");
                TokenError::from(e)
            })?;

        Ok(settings.try_deserialize()?)
    }

    fn apply_env(&mut self) -> Result<(), TokenError> {
        let jwt = &mut self.jwt;
        if let Ok(dir) = env::var("JWT_KEYS_DIRECTORY") {
            jwt.keys_directory = PathBuf::from(dir);
        }
        if let Ok(name) = env::var("JWT_PRIVATE_KEY") {
            jwt.private_key = name;
        }
        if let Ok(name) = env::var("JWT_PUBLIC_KEY") {
            jwt.public_key = name;
        }
        jwt.generate_keys = parse_env("JWT_GENERATE_KEYS", jwt.generate_keys)?;
        if let Ok(root) = env::var("JWT_INSTALL_ROOT") {
            jwt.install_root = Some(PathBuf::from(root));
        }
        Ok(())
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const JWT_VARS: [&str; 5] = [
        "JWT_KEYS_DIRECTORY",
        "JWT_PRIVATE_KEY",
        "JWT_PUBLIC_KEY",
        "JWT_GENERATE_KEYS",
        "JWT_INSTALL_ROOT",
    ];

    fn clear_env() {
        for var in JWT_VARS {
            env::remove_var(var);
        }
        env::remove_var(BASE_PATH);
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(FILE_NAME);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_from_file_reads_kebab_case_keys() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "jwt:\n  keys-directory: /keys\n  private-key: id.pem\n  public-key: id.crt\n",
        );

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.jwt.keys_directory, PathBuf::from("/keys"));
        assert_eq!(config.jwt.private_key, "id.pem");
        assert_eq!(config.jwt.public_key, "id.crt");
        assert!(!config.jwt.generate_keys);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "jwt:\n  keys-directory: /keys\n  private-key: id.pem\n  public-key: id.crt\n",
        );
        env::set_var("JWT_PRIVATE_KEY", "other.pem");
        env::set_var("JWT_GENERATE_KEYS", "true");

        let config = Config::from_file(&path).unwrap();
        clear_env();

        assert_eq!(config.jwt.private_key, "other.pem");
        assert!(config.jwt.generate_keys);
    }

    #[test]
    #[serial]
    fn test_invalid_bool_rejected() {
        clear_env();
        env::set_var("JWT_GENERATE_KEYS", "sometimes");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(TokenError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_uses_base_path() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "jwt:\n  generate-keys: true\n");
        env::set_var(BASE_PATH, dir.path());

        let config = Config::load().unwrap();
        clear_env();

        assert!(config.jwt.generate_keys);
        assert_eq!(config.jwt.keys_directory, PathBuf::from("keys"));
    }

    #[test]
    #[serial]
    fn test_missing_file_is_an_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let result = Config::from_file(dir.path().join("absent.yaml"));

        assert!(matches!(result, Err(TokenError::Config(_))));
    }

    #[test]
    fn test_empty_private_key_rejected_unless_generating() {
        let mut jwt = JwtConfig::new("/keys", "", "id.crt");
        assert!(jwt.validate().is_err());

        jwt.generate_keys = true;
        assert!(jwt.validate().is_ok());
    }
}
