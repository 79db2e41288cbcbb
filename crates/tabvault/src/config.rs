//! Layered configuration: defaults, then `tabvault.toml`, then `TABVAULT_*`
//! environment variables (`__` separates nested keys).

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tabvault_admin::{DEFAULT_EXPIRES_IN, DEFAULT_GROUP_CLAIM, DEFAULT_MAX_UPLOAD_BYTES, SigningKeys};
use tabvault_extract::{DEFAULT_PREFIX, DEFAULT_TARGET_FOLDER, ExtractSettings};

pub const DEFAULT_CONFIG_FILE: &str = "tabvault.toml";
const ENV_PREFIX: &str = "TABVAULT_";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub buckets: BucketConfig,
    pub extract: ExtractConfig,
    pub access: AccessConfig,
    pub signing: SigningConfig,
    pub log: LogConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Fs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the `fs` backend.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            root: PathBuf::from(".tabvault"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Where archive uploads land.
    pub archive: String,
    /// Where extracted objects and direct uploads live.
    pub extracted: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            archive: "tabvault-archives".into(),
            extracted: "tabvault-extracted".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub prefix: String,
    pub default_folder: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            default_folder: DEFAULT_TARGET_FOLDER.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub admin_group: String,
    pub group_claim: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_group: "admins".into(),
            group_claim: DEFAULT_GROUP_CLAIM.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub endpoint: Option<String>,
    pub expires_in: u32,
    pub max_upload_bytes: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            endpoint: None,
            expires_in: DEFAULT_EXPIRES_IN,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "tabvault=info".into(),
            json: false,
        }
    }
}

impl Config {
    /// Load from `path`, or from `tabvault.toml` in the working directory
    /// when no path is given. A missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        if let Some(path) = path
            && !path.is_file()
        {
            return Err(format!("config file {} not found", path.display()).into());
        }
        Self::figment(path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE))).extract()
    }

    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn extract_settings(&self) -> ExtractSettings {
        ExtractSettings::new(&self.buckets.extracted)
            .prefix(&self.extract.prefix)
            .default_target_folder(&self.extract.default_folder)
    }

    pub fn signing_keys(&self) -> SigningKeys {
        SigningKeys {
            region: self.signing.region.clone(),
            access_key_id: self.signing.access_key_id.clone(),
            secret_access_key: self.signing.secret_access_key.clone(),
            session_token: self.signing.session_token.clone(),
            endpoint: self.signing.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_sources() {
        Jail::expect_with(|_| {
            let config = Config::load(None)?;
            assert_eq!(config, Config::default());
            assert_eq!(config.extract.prefix, "tabs");
            assert_eq!(config.extract.default_folder, "default");
            assert_eq!(config.access.group_claim, "cognito:groups");
            assert_eq!(config.signing.expires_in, 3600);
            assert_eq!(config.signing.max_upload_bytes, 268_435_456);
            assert_eq!(config.storage.backend, StorageBackend::Fs);
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [storage]
                backend = "memory"

                [buckets]
                archive = "zips"
                extracted = "files"

                [signing]
                region = "eu-west-1"
                "#,
            )?;
            jail.set_env("TABVAULT_BUCKETS__EXTRACTED", "from-env");
            jail.set_env("TABVAULT_LOG__JSON", "true");

            let config = Config::load(None)?;
            assert_eq!(config.storage.backend, StorageBackend::Memory);
            assert_eq!(config.buckets.archive, "zips");
            assert_eq!(config.buckets.extracted, "from-env");
            assert_eq!(config.signing.region, "eu-west-1");
            assert!(config.log.json);
            assert_eq!(config.extract_settings().destination_bucket, "from-env");
            Ok(())
        });
    }

    #[test]
    fn explicit_path_must_exist() {
        Jail::expect_with(|_| {
            assert!(Config::load(Some(Path::new("missing.toml"))).is_err());
            Ok(())
        });
    }
}
