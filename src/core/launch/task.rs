// ─── Launch Task ───
// Spawns the game process with the correct arguments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::auth::SessionIdentity;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::LocalRuntime;

use super::classpath::{join_classpath, safe_path_str, ResolvedClasspath};

const REDACTED: &str = "<redacted>";

/// Everything needed to start one game process. Built per attempt and
/// consumed by [`launch`].
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub classpath: Vec<PathBuf>,
    pub main_class: String,
    pub username: String,
    pub session_token: Option<String>,
    pub version_id: String,
    pub runtime: LocalRuntime,
}

impl LaunchPlan {
    pub fn new(resolved: ResolvedClasspath, identity: SessionIdentity, runtime: LocalRuntime) -> Self {
        let identity = identity.sanitized();
        Self {
            classpath: resolved.entries,
            main_class: resolved.main_class,
            username: identity.username,
            session_token: identity.access_token,
            version_id: resolved.version_id,
            runtime,
        }
    }

    /// Arguments after the java executable:
    /// `-cp <classpath> <mainClass> --username <u> --version <v> (--accessToken <t> | --offline)`.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = vec![
            "-cp".to_string(),
            join_classpath(&self.classpath),
            self.main_class.clone(),
            "--username".to_string(),
            self.username.clone(),
            "--version".to_string(),
            self.version_id.clone(),
        ];

        match &self.session_token {
            Some(token) => {
                args.push("--accessToken".to_string());
                args.push(token.clone());
            }
            None => args.push("--offline".to_string()),
        }

        args
    }

    /// Shell-style rendering of the full command, with the session token hidden.
    pub fn command_line_for_logs(&self) -> String {
        let mut args = self.arguments();
        if let Some(flag) = args.iter().position(|arg| arg == "--accessToken") {
            if let Some(token) = args.get_mut(flag + 1) {
                *token = REDACTED.to_string();
            }
        }
        format_command_for_logs(&safe_path_str(&self.runtime.java_bin), &args)
    }
}

/// A started game process. The launcher does not track it any further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedProcess {
    pub pid: Option<u32>,
    pub command_file: PathBuf,
}

/// Launch the game as a detached child process.
///
/// Writes the command line to `command_file` first, then returns as soon as
/// the process has started; its exit status is never observed.
pub async fn launch(
    plan: &LaunchPlan,
    command_file: &Path,
    working_dir: &Path,
) -> LauncherResult<LaunchedProcess> {
    if plan.classpath.is_empty() {
        return Err(LauncherError::LaunchError(
            "Classpath is empty, refusing to start java without -cp entries".into(),
        ));
    }

    write_command_file(plan, command_file).await;

    let mut cmd = Command::new(&plan.runtime.java_bin);
    cmd.args(plan.arguments())
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    configure_platform_spawn(&mut cmd);

    info!(
        "Launching {} with Java: {:?}",
        plan.version_id, plan.runtime.java_bin
    );
    debug!("Command (copy/paste): {}", plan.command_line_for_logs());

    let child = cmd.spawn().map_err(|e| {
        LauncherError::LaunchError(format!(
            "cannot start {:?}: {}",
            plan.runtime.java_bin, e
        ))
    })?;

    let pid = child.id();
    info!("Game process started (pid {:?})", pid);
    // Dropping the handle leaves the child running; tokio reaps it once it exits.
    drop(child);

    Ok(LaunchedProcess {
        pid,
        command_file: command_file.to_path_buf(),
    })
}

/// Best-effort diagnostic copy of the command line.
async fn write_command_file(plan: &LaunchPlan, command_file: &Path) {
    let contents = format!(
        "# {} launch command, written {}\n{}\n",
        plan.version_id,
        Utc::now().to_rfc3339(),
        plan.command_line_for_logs()
    );

    if let Some(parent) = command_file.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    if let Err(err) = tokio::fs::write(command_file, contents).await {
        warn!("Could not write launch command to {:?}: {}", command_file, err);
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x00000008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    // Own process group, so a Ctrl-C in the launcher's terminal does not reach the game.
    #[cfg(unix)]
    cmd.process_group(0);
}

fn format_command_for_logs(program: &str, args: &[String]) -> String {
    let program = shell_escape(program);
    let args = args
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | ';')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
