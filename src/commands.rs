// ─── Launch Service ───
// Inbound surface of the launcher: one "launch requested" call that runs the
// whole pipeline in a background task and reports progress and a single
// outcome over a channel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::core::auth::{Authenticator, SessionIdentity, YggdrasilAuthenticator};
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{build_http_client, HttpSource, RemoteSource};
use crate::core::java::{LocalRuntime, RuntimeProvisioner};
use crate::core::launch::{self, ClasspathResolver, LaunchPlan, ResolvedClasspath};
use crate::core::state::LauncherConfig;
use crate::core::version::{ManifestClient, VersionEntry};

/// What the front-end submits when the user presses "Launch".
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub username: String,
    pub password: String,
    pub api_url: String,
    pub version_id: String,
}

/// Final result of one launch attempt. Every kind has its own message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched {
        version_id: String,
        pid: Option<u32>,
        command_file: PathBuf,
    },
    AuthenticationFailed {
        username: String,
    },
    CatalogUnavailable {
        reason: String,
    },
    VersionNotFound {
        version_id: String,
    },
    DownloadFailed {
        url: String,
        reason: String,
    },
    RuntimeAbsent {
        major: u32,
        install_triggered: bool,
    },
    RuntimeVersionMismatch {
        expected: u32,
        found: Option<u32>,
    },
    InstallFailed {
        major: u32,
        reason: String,
    },
    LaunchError {
        reason: String,
    },
}

impl LaunchOutcome {
    pub fn is_launched(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }

    /// Human-readable notification for the front-end.
    pub fn user_message(&self) -> String {
        match self {
            LaunchOutcome::Launched { version_id, .. } => {
                format!("Minecraft {} is starting.", version_id)
            }
            LaunchOutcome::AuthenticationFailed { username } => {
                format!("Login failed for {}. Check your username, password and API URL.", username)
            }
            LaunchOutcome::CatalogUnavailable { reason } => {
                format!("Could not reach the version list ({}). Check your connection and try again.", reason)
            }
            LaunchOutcome::VersionNotFound { version_id } => {
                format!("Version {} does not exist in the version list.", version_id)
            }
            LaunchOutcome::DownloadFailed { url, reason } => {
                format!("Failed to download {}: {}", url, reason)
            }
            LaunchOutcome::RuntimeAbsent {
                major,
                install_triggered: true,
            } => format!(
                "Java {} was being installed but is not ready yet. Launch again once the installation has finished.",
                major
            ),
            LaunchOutcome::RuntimeAbsent {
                major,
                install_triggered: false,
            } => format!("Java {} is not installed. Please install it and try again.", major),
            LaunchOutcome::RuntimeVersionMismatch { expected, found } => match found {
                Some(found) => format!(
                    "The installed Java reports version {}, but this release needs Java {}.",
                    found, expected
                ),
                None => format!(
                    "The installed Java did not report a usable version; this release needs Java {}.",
                    expected
                ),
            },
            LaunchOutcome::InstallFailed { major, reason } => {
                format!("Installing Java {} failed: {}", major, reason)
            }
            LaunchOutcome::LaunchError { reason } => {
                format!("Minecraft could not be started: {}", reason)
            }
        }
    }
}

impl From<LauncherError> for LaunchOutcome {
    fn from(err: LauncherError) -> Self {
        match err {
            LauncherError::CatalogUnavailable { url, reason } => LaunchOutcome::CatalogUnavailable {
                reason: format!("{}: {}", url, reason),
            },
            LauncherError::VersionNotFound(version_id) => {
                LaunchOutcome::VersionNotFound { version_id }
            }
            LauncherError::DownloadFailed { url, reason } => {
                LaunchOutcome::DownloadFailed { url, reason }
            }
            LauncherError::RuntimeAbsent {
                major,
                install_triggered,
            } => LaunchOutcome::RuntimeAbsent {
                major,
                install_triggered,
            },
            LauncherError::RuntimeVersionMismatch { expected, found } => {
                LaunchOutcome::RuntimeVersionMismatch { expected, found }
            }
            LauncherError::InstallFailed { major, reason } => {
                LaunchOutcome::InstallFailed { major, reason }
            }
            LauncherError::AuthenticationFailed(username) => {
                LaunchOutcome::AuthenticationFailed { username }
            }
            // Local disk trouble while materializing files is a failed download
            // from the user's point of view.
            LauncherError::Io { path, source } => LaunchOutcome::DownloadFailed {
                url: path.display().to_string(),
                reason: source.to_string(),
            },
            other => LaunchOutcome::LaunchError {
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    Authenticating,
    Resolving,
    ProvisioningRuntime,
    Starting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Progress {
        version_id: String,
        stage: LaunchStage,
        percent: u8,
    },
    Finished(LaunchOutcome),
}

/// Owns the pipeline components for one data directory.
pub struct LaunchService {
    config: LauncherConfig,
    manifest: ManifestClient,
    resolver: ClasspathResolver,
    provisioner: RuntimeProvisioner,
    authenticator: Arc<dyn Authenticator>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LaunchService {
    /// Build the service with the real HTTP transport and authenticator.
    pub fn from_config(config: LauncherConfig) -> LauncherResult<Self> {
        config.validate()?;
        let client = build_http_client(config.connect_timeout(), config.request_timeout())
            .map_err(|e| LauncherError::Config(format!("cannot build HTTP client: {}", e)))?;
        let source: Arc<dyn RemoteSource> = Arc::new(
            HttpSource::new(client.clone()).with_document_timeout(config.request_timeout()),
        );
        let authenticator: Arc<dyn Authenticator> = Arc::new(YggdrasilAuthenticator::new(client));
        Ok(Self::with_parts(config, source, authenticator))
    }

    pub fn with_parts(
        config: LauncherConfig,
        source: Arc<dyn RemoteSource>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let manifest = ManifestClient::new(source.clone(), config.manifest_url.clone());
        let downloader =
            Downloader::new(source).with_checksum_verification(config.verify_checksums);

        let resolver = ClasspathResolver::new(
            manifest.clone(),
            downloader.clone(),
            config.versions_dir(),
            config.libraries_dir(),
        )
        .with_concurrency(config.download_concurrency);

        let mut provisioner =
            RuntimeProvisioner::new(config.data_dir.clone(), config.installers_dir())
                .with_probe_timeout(config.probe_timeout())
                .with_auto_install(config.auto_install_runtime);
        if let Some(base_url) = &config.installer_base_url {
            provisioner = provisioner.with_installer_source(base_url.clone(), downloader);
        }

        Self {
            config,
            manifest,
            resolver,
            provisioner,
            authenticator,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub async fn list_versions(&self) -> LauncherResult<Vec<VersionEntry>> {
        self.manifest.list_versions().await
    }

    /// Where the client jar of `version_id` is published, without downloading it.
    pub async fn client_download_url(&self, version_id: &str) -> LauncherResult<String> {
        let entry = self.manifest.find(version_id).await?;
        Ok(self.manifest.get_detail(&entry).await?.primary_artifact_url)
    }

    /// Best-effort profile id lookup; `None` when the service does not know the name.
    pub async fn player_id(&self, username: &str) -> Option<String> {
        self.authenticator
            .player_id(username, &self.config.profile_url)
            .await
    }

    /// Resolve a version's classpath; at most one resolution per version runs at a time.
    pub async fn resolve(&self, version_id: &str) -> LauncherResult<ResolvedClasspath> {
        let lock = self.lock_for(&format!("version:{}", version_id));
        let _guard = lock.lock().await;
        self.resolver.resolve(version_id).await
    }

    /// Ensure the runtime for a version; installs of the same Java major are serialized.
    pub async fn ensure_runtime(&self, version_id: &str) -> LauncherResult<LocalRuntime> {
        let major = crate::core::java::required_runtime(version_id).major;
        let lock = self.lock_for(&format!("jdk:{}", major));
        let _guard = lock.lock().await;
        self.provisioner.ensure_runtime(version_id).await
    }

    /// Run a launch request in the background. Progress and exactly one
    /// `Finished` event arrive on the returned receiver.
    pub fn spawn_launch(self: &Arc<Self>, request: LaunchRequest) -> mpsc::Receiver<LaunchEvent> {
        let (tx, rx) = mpsc::channel(16);
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = service.run_launch(request, &tx).await;
            let _ = tx.send(LaunchEvent::Finished(outcome)).await;
        });
        rx
    }

    /// The whole pipeline: authenticate, resolve, provision, start.
    #[instrument(skip(self, request, events), fields(version = %request.version_id))]
    pub async fn run_launch(
        &self,
        request: LaunchRequest,
        events: &mpsc::Sender<LaunchEvent>,
    ) -> LaunchOutcome {
        match self.launch_pipeline(&request, events).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Launch of {} failed: {}", request.version_id, err);
                LaunchOutcome::from(err)
            }
        }
    }

    async fn launch_pipeline(
        &self,
        request: &LaunchRequest,
        events: &mpsc::Sender<LaunchEvent>,
    ) -> LauncherResult<LaunchOutcome> {
        let version_id = request.version_id.trim();
        let progress = |stage, percent| {
            let _ = events.try_send(LaunchEvent::Progress {
                version_id: version_id.to_string(),
                stage,
                percent,
            });
        };

        progress(LaunchStage::Authenticating, 5);
        let identity = self.authenticate(request).await?;

        progress(LaunchStage::Resolving, 15);
        let resolved = self.resolve(version_id).await?;

        progress(LaunchStage::ProvisioningRuntime, 70);
        let runtime = self.ensure_runtime(version_id).await?;

        progress(LaunchStage::Starting, 90);
        let plan = LaunchPlan::new(resolved, identity, runtime);
        let launched = launch::launch(
            &plan,
            &self.config.launch_command_file(),
            &self.config.data_dir,
        )
        .await?;

        info!("Launched {} (pid {:?})", version_id, launched.pid);
        Ok(LaunchOutcome::Launched {
            version_id: version_id.to_string(),
            pid: launched.pid,
            command_file: launched.command_file,
        })
    }

    /// Log in when both username and password are given; otherwise go offline.
    async fn authenticate(&self, request: &LaunchRequest) -> LauncherResult<SessionIdentity> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Ok(SessionIdentity::offline(&request.username));
        }

        let api_url = if request.api_url.trim().is_empty() {
            self.config.preferences.api_url.as_str()
        } else {
            request.api_url.trim()
        };

        match self
            .authenticator
            .authenticate(request.username.trim(), &request.password, api_url)
            .await
        {
            Some(token) => Ok(SessionIdentity::online(&request.username, token)),
            None if self.config.require_authentication => Err(
                LauncherError::AuthenticationFailed(request.username.trim().to_string()),
            ),
            None => {
                warn!("No session for {}, continuing offline", request.username.trim());
                Ok(SessionIdentity::offline(&request.username))
            }
        }
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Entries only referenced by the map have no holder or waiter left.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key.to_string()).or_default().clone()
    }
}
