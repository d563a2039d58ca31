use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "MobiLauncher";
const CONFIG_FILE: &str = "config.json";
const LAUNCH_COMMAND_FILE: &str = "launch_command.txt";

pub const DEFAULT_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";
pub const DEFAULT_AUTH_URL: &str = "https://authserver.mojang.com/authenticate";
pub const DEFAULT_PROFILE_URL: &str = "https://api.mojang.com/users/profiles/minecraft";

/// Values remembered between runs for the front-end. The password is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub username: String,
    pub api_url: String,
    pub version: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_url: DEFAULT_AUTH_URL.into(),
            version: "1.16.5".into(),
        }
    }
}

/// Launcher settings persisted as `config.json` inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub data_dir: PathBuf,
    pub manifest_url: String,
    /// Player profile lookup endpoint; the username is appended as a path segment.
    pub profile_url: String,
    /// Connection idle limit while reading a response, and the total deadline
    /// for catalog documents. Artifact bodies may stream for longer.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub download_concurrency: usize,
    /// Re-check SHA-1 of present artifacts when the catalog supplies one.
    /// Off by default: a present file is trusted as-is.
    pub verify_checksums: bool,
    pub auto_install_runtime: bool,
    /// Directory holding the Java installers; defaults to `<data_dir>/installers`.
    pub installers_dir: Option<PathBuf>,
    /// Optional base URL installers are fetched from when missing locally.
    pub installer_base_url: Option<String>,
    /// Treat a failed login with supplied credentials as fatal instead of going offline.
    pub require_authentication: bool,
    pub preferences: Preferences,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            manifest_url: DEFAULT_MANIFEST_URL.into(),
            profile_url: DEFAULT_PROFILE_URL.into(),
            request_timeout_secs: 60,
            connect_timeout_secs: 15,
            probe_timeout_secs: 20,
            download_concurrency: 8,
            verify_checksums: false,
            auto_install_runtime: true,
            installers_dir: None,
            installer_base_url: None,
            require_authentication: false,
            preferences: Preferences::default(),
        }
    }
}

impl LauncherConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load `config.json` from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No config at {:?}, using defaults", path);
                return Self::with_data_dir(data_dir);
            }
        };

        match serde_json::from_str::<LauncherConfig>(&raw) {
            Ok(mut config) => {
                config.data_dir = data_dir.to_path_buf();
                config
            }
            Err(err) => {
                warn!("Ignoring unreadable config {:?}: {}", path, err);
                Self::with_data_dir(data_dir)
            }
        }
    }

    pub fn save(&self) -> LauncherResult<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|source| LauncherError::io(&self.data_dir, source))?;
        let path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| LauncherError::io(path, source))
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if self.download_concurrency == 0 {
            return Err(LauncherError::Config(
                "download_concurrency must be at least 1".into(),
            ));
        }
        if self.manifest_url.trim().is_empty() {
            return Err(LauncherError::Config("manifest_url is empty".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    pub fn installers_dir(&self) -> PathBuf {
        self.installers_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("installers"))
    }

    pub fn launch_command_file(&self) -> PathBuf {
        self.data_dir.join(LAUNCH_COMMAND_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
