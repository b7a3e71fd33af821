use async_trait::async_trait;
use bridge_core::{CancelToken, OutputSink};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ComposeError, Result};
use crate::traits::{parse_ps_output, ComposeBackend, ContainerInfo, Project};

/// Backend driving the `docker compose` command line plugin.
pub struct DockerCompose {
    binary: String,
    base_dir: Option<PathBuf>,
}

impl DockerCompose {
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
            base_dir: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Resolve relative definition files against `dir`. A relative `dir` is
    /// taken from the current directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn compose_command(&self, project: &Project, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("compose").arg("--project-name").arg(project.name());
        for file in project.files() {
            cmd.arg("--file").arg(file);
        }
        cmd.args(args)
            .current_dir(project.working_dir())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn absolute_base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) if base.is_absolute() => Ok(base.clone()),
            Some(base) => Ok(std::env::current_dir()?.join(base)),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> ComposeError {
        if err.kind() == std::io::ErrorKind::NotFound {
            ComposeError::CommandNotFound(self.binary.clone())
        } else {
            ComposeError::Io(err)
        }
    }

    async fn run_compose(
        &self,
        project: &Project,
        args: &[&str],
        cancel: &CancelToken,
    ) -> Result<String> {
        debug!(
            binary = %self.binary,
            project = project.name(),
            args = ?args,
            "Running compose command"
        );

        if cancel.is_cancelled() {
            return Err(ComposeError::Cancelled);
        }

        let child = self
            .compose_command(project, args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Dropping the child on cancellation kills it (kill_on_drop).
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(ComposeError::Cancelled),
            output = child.wait_with_output() => output?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ComposeError::CommandFailed(format!(
                "compose {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for DockerCompose {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComposeBackend for DockerCompose {
    fn name(&self) -> &'static str {
        "compose"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .args(["compose", "version"])
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Definition files are made absolute so they stay valid once the
    /// child runs inside the project's working directory.
    fn build_project(&self, name: &str, files: &[PathBuf]) -> Result<Project> {
        let base = self.absolute_base_dir()?;
        let files: Vec<PathBuf> = files
            .iter()
            .map(|file| {
                if file.is_relative() {
                    base.join(file)
                } else {
                    file.clone()
                }
            })
            .collect();

        let project = Project::new(name, files)?;

        if let Some(missing) = project.files().iter().find(|f| !f.exists()) {
            return Err(ComposeError::InvalidProject(format!(
                "definition file {} does not exist",
                missing.display()
            )));
        }

        Ok(project)
    }

    async fn logs(
        &self,
        project: &Project,
        cancel: &CancelToken,
        follow: bool,
        sink: &OutputSink,
    ) -> Result<()> {
        let mut args = vec!["logs", "--no-color"];
        if follow {
            args.push("--follow");
        }
        debug!(project = project.name(), follow, "Attaching to compose logs");

        if cancel.is_cancelled() {
            return Err(ComposeError::Cancelled);
        }

        let mut child = self
            .compose_command(project, &args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ComposeError::CommandFailed("compose logs has no stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ComposeError::CommandFailed("compose logs has no stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text).await;
            text
        });

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(project = project.name(), "Log stream cancelled");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to stop compose logs");
                    }
                    stderr_task.abort();
                    return Err(ComposeError::Cancelled);
                }
                line = lines.next_line() => match line? {
                    Some(line) => sink.write_line(&line)?,
                    None => break,
                },
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(ComposeError::CommandFailed(format!(
                "compose logs failed: {}",
                stderr.trim()
            )));
        }

        debug!(project = project.name(), "Log stream ended");
        Ok(())
    }

    async fn ps(&self, project: &Project, cancel: &CancelToken) -> Result<Vec<ContainerInfo>> {
        let output = self
            .run_compose(project, &["ps", "--format", "json"], cancel)
            .await?;
        parse_ps_output(&output)
    }
}
