use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};

/// Java major required by a game version, and the installer that provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequirement {
    pub major: u32,
    pub installer_file_name: String,
}

/// A managed runtime found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRuntime {
    pub install_root: PathBuf,
    pub java_bin: PathBuf,
    /// `None` until the executable has been probed.
    pub verified_major: Option<u32>,
}

/// Per-call provisioning states. Nothing here is persisted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unchecked,
    Absent,
    Installed,
    Probing,
    Verified,
    Mismatched,
}

/// Map a game version to its runtime.
///
/// Comparison is plain lexicographic string ordering, first match wins:
/// `>= "1.20.3"` needs 21, `>= "1.16.5"` needs 17, anything else 8. This is
/// not version-aware: `"1.8.9"` and `"1.9"` sort above `"1.20.3"` and map to
/// 21, while `"1.100"` sorts below `"1.16.5"` and maps to 8.
pub fn required_runtime(version_id: &str) -> RuntimeRequirement {
    let major = if version_id >= "1.20.3" {
        21
    } else if version_id >= "1.16.5" {
        17
    } else {
        8
    };

    RuntimeRequirement {
        major,
        installer_file_name: installer_file_name(major),
    }
}

fn installer_file_name(major: u32) -> String {
    if cfg!(windows) {
        match major {
            21 => "jdk-21_windows-x64_bin.exe".into(),
            17 => "jdk17.0.1.0.exe".into(),
            _ => "jre-8u431-windows-x64.exe".into(),
        }
    } else {
        let image = if major <= 8 { "jre" } else { "jdk" };
        format!(
            "{}-{}_{}-{}_bin.zip",
            image,
            major,
            platform::platform_os(),
            platform::platform_arch()
        )
    }
}

/// Detects, verifies and installs the managed Java runtimes under the data dir.
pub struct RuntimeProvisioner {
    data_dir: PathBuf,
    installers_dir: PathBuf,
    installer_base_url: Option<String>,
    downloader: Option<Downloader>,
    probe_timeout: Duration,
    auto_install: bool,
}

impl RuntimeProvisioner {
    pub fn new(data_dir: PathBuf, installers_dir: PathBuf) -> Self {
        Self {
            data_dir,
            installers_dir,
            installer_base_url: None,
            downloader: None,
            probe_timeout: Duration::from_secs(20),
            auto_install: true,
        }
    }

    /// Fetch missing installers from `base_url` before running them.
    pub fn with_installer_source(mut self, base_url: String, downloader: Downloader) -> Self {
        self.installer_base_url = Some(base_url.trim_end_matches('/').to_string());
        self.downloader = Some(downloader);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_auto_install(mut self, enabled: bool) -> Self {
        self.auto_install = enabled;
        self
    }

    pub fn runtime_dir(&self, major: u32) -> PathBuf {
        self.data_dir.join(format!("jdk{}", major))
    }

    /// Make sure the runtime required by `version_id` is installed and reports
    /// the right major version.
    pub async fn ensure_runtime(&self, version_id: &str) -> LauncherResult<LocalRuntime> {
        let requirement = required_runtime(version_id);
        info!(
            "Version {} requires Java {} ({})",
            version_id, requirement.major, requirement.installer_file_name
        );
        self.ensure_requirement(&requirement).await
    }

    #[instrument(skip(self, requirement), fields(major = requirement.major))]
    pub async fn ensure_requirement(
        &self,
        requirement: &RuntimeRequirement,
    ) -> LauncherResult<LocalRuntime> {
        let major = requirement.major;
        let install_root = self.runtime_dir(major);
        let mut state = ProvisionState::Unchecked;

        if let Some(java_bin) = locate_java_binary(&install_root) {
            transition(&mut state, ProvisionState::Probing);
            let found = self.probe_major(&java_bin).await;
            if found != Some(major) {
                transition(&mut state, ProvisionState::Mismatched);
                return Err(LauncherError::RuntimeVersionMismatch {
                    expected: major,
                    found,
                });
            }
            transition(&mut state, ProvisionState::Verified);
            return Ok(LocalRuntime {
                install_root,
                java_bin,
                verified_major: Some(major),
            });
        }

        transition(&mut state, ProvisionState::Absent);
        if !self.auto_install {
            return Err(LauncherError::RuntimeAbsent {
                major,
                install_triggered: false,
            });
        }

        self.install(requirement, &install_root).await?;
        transition(&mut state, ProvisionState::Installed);

        // A fresh install only counts once a second probe confirms it.
        let Some(java_bin) = locate_java_binary(&install_root) else {
            warn!("Installer finished but no java binary under {:?}", install_root);
            return Err(LauncherError::RuntimeAbsent {
                major,
                install_triggered: true,
            });
        };
        transition(&mut state, ProvisionState::Probing);
        match self.probe_major(&java_bin).await {
            Some(found) if found == major => {
                transition(&mut state, ProvisionState::Verified);
                Ok(LocalRuntime {
                    install_root,
                    java_bin,
                    verified_major: Some(major),
                })
            }
            found => {
                warn!(
                    "Fresh Java {} install did not verify (probe reported {:?})",
                    major, found
                );
                Err(LauncherError::RuntimeAbsent {
                    major,
                    install_triggered: true,
                })
            }
        }
    }

    /// Run `java -version` and return the reported major version.
    async fn probe_major(&self, java_bin: &Path) -> Option<u32> {
        let mut command = Command::new(java_bin);
        command
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.probe_timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!("Could not execute {:?}: {}", java_bin, err);
                return None;
            }
            Err(_) => {
                warn!("Probing {:?} timed out after {:?}", java_bin, self.probe_timeout);
                return None;
            }
        };

        let version_output = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        debug!(
            "Probing {:?}: {}",
            java_bin,
            version_output.lines().next().unwrap_or("")
        );
        probe::reported_major(&version_output)
    }

    async fn install(
        &self,
        requirement: &RuntimeRequirement,
        install_root: &Path,
    ) -> LauncherResult<()> {
        let major = requirement.major;
        let install_failed = |reason: String| LauncherError::InstallFailed { major, reason };

        let installer = self.installer_path(requirement).await?;
        if let Some(parent) = install_root.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| install_failed(format!("cannot create {:?}: {}", parent, e)))?;
        }

        let started = Instant::now();
        info!("Installing Java {} from {:?} into {:?}", major, installer, install_root);

        if is_zip_archive(&installer) {
            let archive = installer.clone();
            let root = install_root.to_path_buf();
            tokio::task::spawn_blocking(move || extract::extract_zip_file(&archive, &root))
                .await
                .map_err(|e| install_failed(format!("extraction task failed: {}", e)))?
                .map_err(|e| install_failed(e.to_string()))?;
        } else {
            let status = Command::new(&installer)
                .arg("/s")
                .arg(format!("INSTALLDIR={}", install_root.display()))
                .stdin(Stdio::null())
                .status()
                .await
                .map_err(|e| install_failed(format!("cannot start {:?}: {}", installer, e)))?;
            if !status.success() {
                return Err(install_failed(format!("installer exited with {}", status)));
            }
        }

        if let Some(java_bin) = locate_java_binary(install_root) {
            ensure_executable(&java_bin);
        }
        info!("Java {} installer finished in {:?}", major, started.elapsed());
        Ok(())
    }

    /// Local installer file, fetched first when a remote source is configured.
    async fn installer_path(&self, requirement: &RuntimeRequirement) -> LauncherResult<PathBuf> {
        let path = self.installers_dir.join(&requirement.installer_file_name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        match (&self.installer_base_url, &self.downloader) {
            (Some(base_url), Some(downloader)) => {
                let url = format!("{}/{}", base_url, requirement.installer_file_name);
                downloader
                    .ensure(&url, &path)
                    .await
                    .map_err(|e| LauncherError::InstallFailed {
                        major: requirement.major,
                        reason: e.to_string(),
                    })?;
                Ok(path)
            }
            _ => Err(LauncherError::InstallFailed {
                major: requirement.major,
                reason: format!("installer not found at {:?}", path),
            }),
        }
    }
}

fn transition(state: &mut ProvisionState, next: ProvisionState) {
    debug!("Runtime provisioning {:?} -> {:?}", state, next);
    *state = next;
}

fn is_zip_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Find the java executable of an install root: `bin/`, the macOS bundle
/// layout, or either of those one directory down.
pub fn locate_java_binary(runtime_root: &Path) -> Option<PathBuf> {
    if let Some(found) = java_in_layouts(runtime_root) {
        return Some(found);
    }

    let entries = std::fs::read_dir(runtime_root).ok()?;
    let mut nested: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    nested.sort();
    nested.iter().find_map(|dir| java_in_layouts(dir))
}

fn java_in_layouts(root: &Path) -> Option<PathBuf> {
    let primary = root.join("bin").join(java_exe());
    if primary.is_file() {
        return Some(primary);
    }

    let mac_layout = root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    mac_layout.is_file().then_some(mac_layout)
}

fn ensure_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = std::fs::metadata(path) {
            let mut permissions = metadata.permissions();
            let mode = permissions.mode();
            if mode & 0o111 != 0o111 {
                permissions.set_mode(mode | 0o755);
                if let Err(err) = std::fs::set_permissions(path, permissions) {
                    warn!("chmod {:?} failed: {}", path, err);
                }
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

fn parse_major_version(version: &str) -> u32 {
    let first_part = version.split('.').next().unwrap_or("0");
    let first_part = first_part.split(['-', '+', '_']).next().unwrap_or("0");
    let major: u32 = first_part.parse().unwrap_or(0);

    if major == 1 {
        version
            .split('.')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(major)
    } else {
        major
    }
}

mod platform {
    pub fn platform_arch() -> &'static str {
        match std::env::consts::ARCH {
            "x86_64" => "x64",
            "aarch64" => "aarch64",
            "x86" => "x86",
            other => other,
        }
    }

    pub fn platform_os() -> &'static str {
        match std::env::consts::OS {
            "windows" => "windows",
            "macos" => "macos",
            _ => "linux",
        }
    }
}

mod probe {
    use super::parse_major_version;

    /// Major version reported by `java -version` output, if any.
    pub fn reported_major(output: &str) -> Option<u32> {
        let version = parse_version_string(output)?;
        match parse_major_version(&version) {
            0 => None,
            major => Some(major),
        }
    }

    /// First quoted string on a `... version "x"` line. Other lines, such as
    /// `Picked up JAVA_TOOL_OPTIONS: -Dfoo="bar"`, may also carry quotes.
    fn parse_version_string(output: &str) -> Option<String> {
        output.lines().filter(|line| line.contains("version")).find_map(|line| {
            let start = line.find('"')?;
            let end = line[start + 1..].find('"')?;
            Some(line[start + 1..start + 1 + end].to_string())
        })
    }
}

mod extract {
    use std::collections::HashSet;

    use super::*;

    /// Unpack a runtime archive into `runtime_root`, dropping the archive's
    /// top-level folder when every entry lives under one.
    pub fn extract_zip_file(zip_path: &Path, runtime_root: &Path) -> LauncherResult<()> {
        let zip_file =
            std::fs::File::open(zip_path).map_err(|source| LauncherError::io(zip_path, source))?;
        let mut archive = zip::ZipArchive::new(zip_file)?;

        if runtime_root.exists() {
            std::fs::remove_dir_all(runtime_root)
                .map_err(|source| LauncherError::io(runtime_root, source))?;
        }
        std::fs::create_dir_all(runtime_root)
            .map_err(|source| LauncherError::io(runtime_root, source))?;

        let strip_top = single_top_level_dir(&mut archive)?;

        for index in 0..archive.len() {
            let mut zipped = archive.by_index(index)?;
            let enclosed_name = zipped
                .enclosed_name()
                .ok_or_else(|| LauncherError::Other("Invalid zip entry path".into()))?;

            let mut components = enclosed_name.components();
            if strip_top {
                let _ = components.next();
            }
            let rel_path: PathBuf = components
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .collect();

            if rel_path.as_os_str().is_empty() {
                continue;
            }

            let out_path = runtime_root.join(rel_path);
            if zipped.is_dir() {
                std::fs::create_dir_all(&out_path)
                    .map_err(|source| LauncherError::io(&out_path, source))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| LauncherError::io(parent, source))?;
            }

            let mut out = std::fs::File::create(&out_path)
                .map_err(|source| LauncherError::io(&out_path, source))?;
            std::io::copy(&mut zipped, &mut out)
                .map_err(|source| LauncherError::io(&out_path, source))?;

            #[cfg(unix)]
            if let Some(mode) = zipped.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|source| LauncherError::io(&out_path, source))?;
            }
        }

        Ok(())
    }

    fn single_top_level_dir(archive: &mut zip::ZipArchive<std::fs::File>) -> LauncherResult<bool> {
        let mut tops = HashSet::new();
        let mut nested_files = 0usize;
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            let Some(name) = entry.enclosed_name() else {
                continue;
            };
            let mut components = name.components();
            if let Some(top) = components.next() {
                tops.insert(top.as_os_str().to_os_string());
            }
            if components.next().is_some() || entry.is_dir() {
                nested_files += 1;
            }
        }
        Ok(tops.len() == 1 && nested_files == archive.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_table_uses_string_ordering() {
        let major = |v: &str| required_runtime(v).major;

        assert_eq!(major("1.20.4"), 21);
        assert_eq!(major("1.20.3"), 21);
        assert_eq!(major("1.21"), 21);
        assert_eq!(major("1.20.2"), 17);
        assert_eq!(major("1.18.2"), 17);
        assert_eq!(major("1.16.5"), 17);
        assert_eq!(major("1.16.4"), 8);
        assert_eq!(major("1.12.2"), 8);
        assert_eq!(major(""), 8);
    }

    #[test]
    fn requirement_table_keeps_lexicographic_quirks() {
        // '8' and '9' sort after '2', so old single-digit minors land on 21.
        assert_eq!(required_runtime("1.8.9").major, 21);
        assert_eq!(required_runtime("1.9").major, 21);
        assert_eq!(required_runtime("1.7.10").major, 21);
        // "1.100" < "1.16.5" as strings.
        assert_eq!(required_runtime("1.100").major, 8);
        // Snapshot ids start with a digit greater than '1'.
        assert_eq!(required_runtime("23w51b").major, 21);
    }

    #[test]
    fn installer_name_matches_major() {
        let requirement = required_runtime("1.20.4");
        if cfg!(windows) {
            assert_eq!(requirement.installer_file_name, "jdk-21_windows-x64_bin.exe");
            assert_eq!(required_runtime("1.16.5").installer_file_name, "jdk17.0.1.0.exe");
            assert_eq!(required_runtime("1.12.2").installer_file_name, "jre-8u431-windows-x64.exe");
        } else {
            assert!(requirement.installer_file_name.starts_with("jdk-21_"));
            assert!(requirement.installer_file_name.ends_with(".zip"));
            assert!(required_runtime("1.16.5").installer_file_name.starts_with("jdk-17_"));
            assert!(required_runtime("1.12.2").installer_file_name.starts_with("jre-8_"));
        }
    }

    #[test]
    fn test_parse_major_modern() {
        assert_eq!(parse_major_version("17.0.8"), 17);
        assert_eq!(parse_major_version("21.0.1"), 21);
        assert_eq!(parse_major_version("21-ea"), 21);
    }

    #[test]
    fn test_parse_major_legacy() {
        assert_eq!(parse_major_version("1.8.0_392"), 8);
    }

    #[test]
    fn reported_major_reads_quoted_version() {
        let modern = "openjdk version \"21.0.2\" 2024-01-16\nOpenJDK Runtime Environment Temurin-21.0.2+13";
        let legacy = "java version \"1.8.0_431\"\nJava(TM) SE Runtime Environment";
        assert_eq!(probe::reported_major(modern), Some(21));
        assert_eq!(probe::reported_major(legacy), Some(8));
        assert_eq!(probe::reported_major("command not found"), None);
    }

    #[test]
    fn reported_major_skips_tool_options_banner() {
        let output = "Picked up JAVA_TOOL_OPTIONS: -Dfile.encoding=\"UTF-8\"\nopenjdk version \"17.0.9\" 2023-10-17\n";
        assert_eq!(probe::reported_major(output), Some(17));
    }

    #[test]
    fn locate_finds_bin_and_nested_layouts() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(locate_java_binary(temp.path()), None);

        let nested = temp.path().join("jdk-21.0.2+13").join("bin");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(java_exe()), b"").unwrap();
        assert_eq!(locate_java_binary(temp.path()), Some(nested.join(java_exe())));

        let direct = temp.path().join("bin");
        std::fs::create_dir_all(&direct).unwrap();
        std::fs::write(direct.join(java_exe()), b"").unwrap();
        assert_eq!(locate_java_binary(temp.path()), Some(direct.join(java_exe())));
    }

    #[tokio::test]
    async fn absent_runtime_without_auto_install_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let provisioner =
            RuntimeProvisioner::new(temp.path().to_path_buf(), temp.path().join("installers"))
                .with_auto_install(false);

        let err = provisioner.ensure_runtime("1.20.4").await.unwrap_err();
        assert!(matches!(
            err,
            LauncherError::RuntimeAbsent { major: 21, install_triggered: false }
        ));
    }

    #[tokio::test]
    async fn missing_installer_fails_install() {
        let temp = tempfile::tempdir().unwrap();
        let provisioner =
            RuntimeProvisioner::new(temp.path().to_path_buf(), temp.path().join("installers"));

        let err = provisioner.ensure_runtime("1.12.2").await.unwrap_err();
        assert!(matches!(err, LauncherError::InstallFailed { major: 8, .. }));
    }

    #[cfg(unix)]
    mod scripted {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        fn fake_java(version: &str) -> String {
            format!(
                "#!/bin/sh\necho 'openjdk version \"{}\" 2024-01-16' >&2\n",
                version
            )
        }

        fn write_script(path: &Path, body: &str) {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn provisioner(root: &Path) -> RuntimeProvisioner {
            RuntimeProvisioner::new(root.to_path_buf(), root.join("installers"))
                .with_probe_timeout(Duration::from_secs(10))
        }

        #[tokio::test]
        async fn matching_runtime_is_verified() {
            let temp = tempfile::tempdir().unwrap();
            let java = temp.path().join("jdk21/bin/java");
            write_script(&java, &fake_java("21.0.2"));

            let runtime = provisioner(temp.path()).ensure_runtime("1.20.4").await.unwrap();

            assert_eq!(runtime.java_bin, java);
            assert_eq!(runtime.install_root, temp.path().join("jdk21"));
            assert_eq!(runtime.verified_major, Some(21));
        }

        #[tokio::test]
        async fn wrong_runtime_is_a_mismatch() {
            let temp = tempfile::tempdir().unwrap();
            write_script(&temp.path().join("jdk21/bin/java"), &fake_java("17.0.9"));

            let err = provisioner(temp.path()).ensure_runtime("1.20.4").await.unwrap_err();
            assert!(matches!(
                err,
                LauncherError::RuntimeVersionMismatch { expected: 21, found: Some(17) }
            ));
        }

        #[tokio::test]
        async fn silent_installer_then_reprobe_verifies() {
            let temp = tempfile::tempdir().unwrap();
            let requirement = RuntimeRequirement {
                major: 17,
                installer_file_name: "jdk17-installer.sh".into(),
            };
            let payload = temp.path().join("payload-java");
            write_script(&payload, &fake_java("17.0.1"));
            write_script(
                &temp.path().join("installers/jdk17-installer.sh"),
                &format!(
                    "#!/bin/sh\ndir=\"${{2#INSTALLDIR=}}\"\nmkdir -p \"$dir/bin\"\ncp \"{}\" \"$dir/bin/java\"\n",
                    payload.display()
                ),
            );

            let runtime = provisioner(temp.path())
                .ensure_requirement(&requirement)
                .await
                .unwrap();

            assert_eq!(runtime.java_bin, temp.path().join("jdk17/bin/java"));
            assert_eq!(runtime.verified_major, Some(17));
        }

        #[tokio::test]
        async fn installer_that_installs_nothing_stays_unverified() {
            let temp = tempfile::tempdir().unwrap();
            let requirement = RuntimeRequirement {
                major: 17,
                installer_file_name: "noop.sh".into(),
            };
            write_script(&temp.path().join("installers/noop.sh"), "#!/bin/sh\nexit 0\n");

            let err = provisioner(temp.path())
                .ensure_requirement(&requirement)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                LauncherError::RuntimeAbsent { major: 17, install_triggered: true }
            ));
        }

        #[tokio::test]
        async fn failing_installer_is_install_failed() {
            let temp = tempfile::tempdir().unwrap();
            let requirement = RuntimeRequirement {
                major: 8,
                installer_file_name: "broken.sh".into(),
            };
            write_script(&temp.path().join("installers/broken.sh"), "#!/bin/sh\nexit 3\n");

            let err = provisioner(temp.path())
                .ensure_requirement(&requirement)
                .await
                .unwrap_err();
            assert!(matches!(err, LauncherError::InstallFailed { major: 8, .. }));
        }

        #[tokio::test]
        async fn zip_installer_is_extracted_and_verified() {
            let temp = tempfile::tempdir().unwrap();
            let requirement = required_runtime("1.20.4");
            let installers = temp.path().join("installers");
            std::fs::create_dir_all(&installers).unwrap();

            let file = std::fs::File::create(installers.join(&requirement.installer_file_name)).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            writer.add_directory("jdk-21.0.2+13/", options).unwrap();
            writer.start_file("jdk-21.0.2+13/bin/java", options).unwrap();
            writer.write_all(fake_java("21.0.2").as_bytes()).unwrap();
            writer.start_file("jdk-21.0.2+13/release", options).unwrap();
            writer.write_all(b"JAVA_VERSION=\"21.0.2\"\n").unwrap();
            writer.finish().unwrap();

            let runtime = provisioner(temp.path()).ensure_runtime("1.20.4").await.unwrap();

            assert_eq!(runtime.java_bin, temp.path().join("jdk21/bin/java"));
            assert!(temp.path().join("jdk21/release").exists());
        }
    }
}
