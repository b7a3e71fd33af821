use async_trait::async_trait;
use bridge_core::{CancelToken, OutputSink};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{ComposeError, Result};

pub const INFO_ID: &str = "ID";
pub const INFO_NAME: &str = "Name";
pub const INFO_STATE: &str = "State";

fn project_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid project name regex")
    })
}

/// A compose project: a name plus the definition files that describe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    name: String,
    files: Vec<PathBuf>,
    working_dir: PathBuf,
}

impl Project {
    /// Validate and build a project handle.
    ///
    /// The working directory defaults to the parent of the first file.
    pub fn new(name: impl Into<String>, files: Vec<PathBuf>) -> Result<Self> {
        let name = name.into();
        if !project_name_pattern().is_match(&name) {
            return Err(ComposeError::InvalidProject(format!(
                "project name {:?} must be lowercase alphanumerics, '-' or '_'",
                name
            )));
        }
        if files.is_empty() {
            return Err(ComposeError::InvalidProject(format!(
                "project {} has no definition files",
                name
            )));
        }
        if files.iter().any(|f| f.as_os_str().is_empty()) {
            return Err(ComposeError::InvalidProject(format!(
                "project {} has an empty definition file path",
                name
            )));
        }

        let working_dir = files[0]
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            name,
            files,
            working_dir,
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Turn an arbitrary label (e.g. a directory name) into a valid project name.
    pub fn normalize_name(raw: &str) -> String {
        let normalized: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        normalized
            .trim_start_matches(|c: char| c == '-' || c == '_')
            .to_string()
    }
}

/// Raw container information as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerInfo(BTreeMap<String, String>);

impl ContainerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Flatten a JSON object; non-string values keep their JSON text.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(ComposeError::Parse(format!(
                    "expected a container object, got {}",
                    other
                )))
            }
        };

        Ok(Self(
            map.into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect(),
        ))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get(INFO_ID)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(INFO_NAME)
    }

    pub fn state(&self) -> Option<&str> {
        self.get(INFO_STATE)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Parse `ps --format json` output.
///
/// Older compose releases print one JSON array, newer ones print one object
/// per line. Backend order is preserved.
pub fn parse_ps_output(text: &str) -> Result<Vec<ContainerInfo>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(trimmed)?;
        return values.into_iter().map(ContainerInfo::from_json).collect();
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| ContainerInfo::from_json(serde_json::from_str(line)?))
        .collect()
}

/// Container orchestration primitives keyed by project handle.
#[async_trait]
pub trait ComposeBackend: Send + Sync {
    /// Short backend name, shown in diagnostics
    fn name(&self) -> &'static str;

    /// Check if the backend tooling is installed
    async fn is_available(&self) -> bool;

    /// Build a project handle. Must be cheap and must not call into the daemon;
    /// a local metadata check per definition file is acceptable.
    fn build_project(&self, name: &str, files: &[PathBuf]) -> Result<Project> {
        Project::new(name, files.to_vec())
    }

    /// Stream container logs into `sink` until the stream ends or `cancel` fires.
    ///
    /// With `follow == false` the current output is emitted and the call returns.
    /// Cancellation is reported as [`ComposeError::Cancelled`].
    async fn logs(
        &self,
        project: &Project,
        cancel: &CancelToken,
        follow: bool,
        sink: &OutputSink,
    ) -> Result<()>;

    /// List running containers for the project, in backend order.
    async fn ps(&self, project: &Project, cancel: &CancelToken) -> Result<Vec<ContainerInfo>>;
}
