//! Resolving a backend project handle from a property set.

use bridge_core::{CancelToken, OperationError, OutputSink, Properties};
use compose::{ComposeBackend, ContainerInfo, Project};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::schema::{ProjectSchema, PROJECT_FILES, PROJECT_NAME};

/// A resolved project bound to the backend that will serve it.
///
/// Owned by the invocation that resolved it.
pub struct ProjectHandle {
    project: Project,
    backend: Arc<dyn ComposeBackend>,
}

impl ProjectHandle {
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub async fn logs(
        &self,
        cancel: &CancelToken,
        follow: bool,
        sink: &OutputSink,
    ) -> compose::Result<()> {
        self.backend.logs(&self.project, cancel, follow, sink).await
    }

    pub async fn ps(&self, cancel: &CancelToken) -> compose::Result<Vec<ContainerInfo>> {
        self.backend.ps(&self.project, cancel).await
    }
}

impl std::fmt::Debug for ProjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectHandle")
            .field("project", &self.project)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Builds project handles from the project identity properties.
#[derive(Clone)]
pub struct ProjectResolver {
    backend: Arc<dyn ComposeBackend>,
}

impl ProjectResolver {
    pub fn new(backend: Arc<dyn ComposeBackend>) -> Self {
        Self { backend }
    }

    /// Resolve the project named by `props`.
    ///
    /// Missing identity properties and backend refusals are returned as
    /// errors for the caller to record; nothing is swallowed.
    pub fn resolve(
        &self,
        props: &Properties,
        operation: &str,
    ) -> Result<ProjectHandle, OperationError> {
        let name = props
            .require(&PROJECT_NAME)
            .map_err(|e| OperationError::from_property(operation, e))?;
        let files: Vec<PathBuf> = props
            .require(&PROJECT_FILES)
            .map_err(|e| OperationError::from_property(operation, e))?
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let project = self
            .backend
            .build_project(&name, &files)
            .map_err(|e| OperationError::project(e.to_string()))?;

        debug!(
            operation,
            project = project.name(),
            files = project.files().len(),
            "Project resolved"
        );

        Ok(ProjectHandle {
            project,
            backend: self.backend.clone(),
        })
    }
}

/// Schema and resolver shared by every compose operation of a handler.
#[derive(Clone)]
pub struct ComposeBase {
    schema: ProjectSchema,
    resolver: ProjectResolver,
}

impl ComposeBase {
    pub fn new(backend: Arc<dyn ComposeBackend>, schema: ProjectSchema) -> Self {
        Self {
            schema,
            resolver: ProjectResolver::new(backend),
        }
    }

    pub fn properties(&self) -> Properties {
        self.schema.properties()
    }

    pub fn resolver(&self) -> &ProjectResolver {
        &self.resolver
    }
}
