use anyhow::{Context, Result};
use compose::{DockerCompose, Project};
use handler::{CommandSet, ProjectSchema};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "compose-bridge.toml";
const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
const DEFAULT_PROJECT_NAME: &str = "default";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub commands: CommandSet,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Falls back to the normalized directory name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    pub binary: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Read `compose-bridge.toml` from `dir`, or use defaults when absent.
    /// Missing project values are filled in either way.
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config: BridgeConfig = if path.exists() {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            BridgeConfig::default()
        };

        if config.project.name.is_none() {
            config.project.name = Some(default_project_name(dir));
        }
        if config.project.files.is_empty() {
            config.project.files = vec![DEFAULT_COMPOSE_FILE.to_string()];
        }

        Ok(config)
    }

    pub fn project_name(&self) -> &str {
        self.project.name.as_deref().unwrap_or(DEFAULT_PROJECT_NAME)
    }

    pub fn schema(&self) -> ProjectSchema {
        ProjectSchema::new(self.project_name(), self.project.files.clone())
    }

    /// Backend resolving relative definition files against `dir`.
    pub fn backend(&self, dir: &Path) -> DockerCompose {
        DockerCompose::new()
            .with_binary(&self.backend.binary)
            .with_base_dir(dir)
    }
}

fn default_project_name(dir: &Path) -> String {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(Project::normalize_name)
        .unwrap_or_default();

    if name.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    }
}
