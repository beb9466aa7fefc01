//! Profile management
//!
//! A profile is a named endpoint with its credentials. Profiles are stored
//! in a TOML file in the user's config directory so the CLI can address
//! remote paths as `profile/bucket/key`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ApiPrefixes, ClientConfig, DEFAULT_SIGNATURE_TTL_SECS, TransferConfig};
use crate::error::{Error, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "HB_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_FORMAT_VERSION: u32 = 1;

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_ttl() -> u64 {
    DEFAULT_SIGNATURE_TTL_SECS
}

/// A named service endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_ttl")]
    pub signature_ttl_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<ApiPrefixes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferConfig>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            api_version: default_api_version(),
            signature_ttl_secs: default_ttl(),
            timeout_secs: None,
            prefixes: None,
            transfer: None,
        }
    }

    /// Build the immutable client configuration for this profile
    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.endpoint, &self.access_key, &self.secret_key)
            .with_api_version(&self.api_version)
            .with_signature_ttl(self.signature_ttl_secs)
            .with_prefixes(self.prefixes.clone().unwrap_or_default())
            .with_transfer(self.transfer.unwrap_or_default());
        config.timeout_secs = self.timeout_secs;
        config
    }
}

/// On-disk layout of the profile file
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Reads and writes the profile file
#[derive(Debug, Clone)]
pub struct ProfileManager {
    path: PathBuf,
}

impl ProfileManager {
    /// Use the default config location (`$HB_CONFIG_DIR` or the platform config dir)
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?
                .join("harbor"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    /// Use an explicit profile file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        let mut profiles = self.load()?.profiles;
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    pub fn get(&self, name: &str) -> Result<Profile> {
        self.load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add a profile, replacing any existing one with the same name
    pub fn set(&self, profile: Profile) -> Result<()> {
        profile.to_client_config().validate()?;

        let mut file = self.load()?;
        file.profiles.retain(|p| p.name != profile.name);
        file.profiles.push(profile);
        self.save(&file)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut file = self.load()?;
        let before = file.profiles.len();
        file.profiles.retain(|p| p.name != name);
        if file.profiles.len() == before {
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        self.save(&file)
    }

    fn load(&self) -> Result<ProfileFile> {
        if !self.path.exists() {
            return Ok(ProfileFile::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let file: ProfileFile = toml::from_str(&content)?;
        Ok(file)
    }

    fn save(&self, file: &ProfileFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let out = ProfileFile {
            version: CONFIG_FORMAT_VERSION,
            profiles: file.profiles.clone(),
        };
        let content = toml::to_string_pretty(&out)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "Saved profiles");
        Ok(())
    }
}
