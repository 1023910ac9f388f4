//! Per-user configuration.
//!
//! Everything lives in one directory, by default `<platform config dir>/ddbcli`
//! (overridable with `DDBCLI_CONFIG_DIR`):
//!
//! - `config.json`: client defaults and the key-schema cache
//! - `error.log`: append-only log of failed invocations
//!
//! ```json
//! {
//!   "region": "eu-west-1",
//!   "endpoint_url": "http://localhost:8000",
//!   "key_schema": {
//!     "users": [{"AttributeName": "id", "KeyType": "HASH", "AttributeType": "S"}]
//!   }
//! }
//! ```

use crate::{Error, Result, schema};

use serde::{Deserialize, Serialize};
use std::{collections, env, fs, io::Write, path};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "DDBCLI_CONFIG_DIR";

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

const APP_NAME: &str = "ddbcli";

/// Resolve the configuration directory.
pub fn config_dir() -> Result<path::PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(path::PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| Error::Config("could not determine the user configuration directory".into()))
}

/// Contents of `config.json`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct UserConfig {
    /// Default AWS region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Default endpoint URL, e.g. a local DynamoDB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Default named profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Cached key schemas by table name.
    #[serde(default)]
    pub key_schema: collections::BTreeMap<String, schema::KeySchema>,
}

/// `config.json` together with the path it was loaded from.
#[derive(Clone, Debug)]
pub struct ConfigFile {
    path: path::PathBuf,
    /// Parsed contents.
    pub config: UserConfig,
}

impl ConfigFile {
    /// Load the configuration file inside `dir`, or defaults if it does not exist.
    pub fn load(dir: &path::Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let config = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                Error::Config(format!("failed to parse {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => UserConfig::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, config })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// Write the configuration back, creating the directory if needed.
    ///
    /// The new contents are written to a temporary file next to `config.json`
    /// and renamed over it, so the file is either the old or the new version.
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| path::Path::new("."));
        fs::create_dir_all(dir)?;
        let contents = serde_json::to_vec_pretty(&self.config)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| Error::Io(err.error))?;
        Ok(())
    }
}

/// Settings used to build the DynamoDB client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientSettings {
    /// AWS region.
    pub region: Option<String>,
    /// Endpoint URL override.
    pub endpoint_url: Option<String>,
    /// Named profile.
    pub profile: Option<String>,
}

impl ClientSettings {
    /// Fill every setting not given explicitly from the configuration file.
    pub fn or_config(self, config: &UserConfig) -> Self {
        Self {
            region: self.region.or_else(|| config.region.clone()),
            endpoint_url: self.endpoint_url.or_else(|| config.endpoint_url.clone()),
            profile: self.profile.or_else(|| config.profile.clone()),
        }
    }

    /// Load the AWS SDK configuration, falling back to the default provider chain.
    pub async fn load(&self) -> Result<aws_config::SdkConfig> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        if sdk_config.region().is_none() {
            return Err(Error::NoRegion);
        }
        Ok(sdk_config)
    }
}
