//! Property ids and the shared project schema.
//!
//! These ids are the stable contract with host frameworks.

use bridge_core::{
    CancelToken, OperationError, OperationResult, OutputSink, Properties, PropertyKey,
    PropertyType,
};

pub const PROJECT_NAME: PropertyKey<String> = PropertyKey::new("compose.project.name");
pub const PROJECT_FILES: PropertyKey<Vec<String>> = PropertyKey::new("compose.project.files");
pub const CANCEL: PropertyKey<CancelToken> = PropertyKey::new("compose.cancel");
pub const DETACH: PropertyKey<bool> = PropertyKey::new("compose.detach");
pub const OUTPUT: PropertyKey<OutputSink> = PropertyKey::new("compose.output");

pub const COMMAND_KEY: PropertyKey<String> = PropertyKey::new("command.key");
pub const COMMAND_KEYS: PropertyKey<Vec<String>> = PropertyKey::new("command.keys");
pub const COMMAND_DEFINITION: PropertyKey<serde_json::Value> =
    PropertyKey::new("command.definition");

/// Project identity properties shared by every compose operation, with the
/// defaults supplied by the project configuration.
#[derive(Debug, Clone, Default)]
pub struct ProjectSchema {
    name: Option<String>,
    files: Vec<String>,
}

impl ProjectSchema {
    pub fn new(name: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            files,
        }
    }

    pub fn properties(&self) -> Properties {
        let name = match &self.name {
            Some(name) => PROJECT_NAME.bind(name.clone()),
            None => PROJECT_NAME.declare(),
        };
        let files = if self.files.is_empty() {
            PROJECT_FILES.declare()
        } else {
            PROJECT_FILES.bind(self.files.clone())
        };

        Properties::new()
            .with(
                name.with_label("Project name")
                    .with_description("Compose project name")
                    .required(),
            )
            .with(
                files
                    .with_label("Project files")
                    .with_description("Compose definition files")
                    .required(),
            )
            .with(
                CANCEL
                    .declare()
                    .with_label("Cancellation")
                    .with_description("Token used to abort long-running backend calls")
                    .required()
                    .internal(),
            )
    }

    pub fn required() -> Vec<&'static str> {
        vec![PROJECT_NAME.id(), PROJECT_FILES.id(), CANCEL.id()]
    }
}

/// Read a required property, recording a failure on the result when it is
/// missing or mistyped.
pub(crate) fn require<T: PropertyType>(
    props: &Properties,
    key: &PropertyKey<T>,
    operation: &str,
    result: &mut OperationResult,
) -> Option<T> {
    match props.require(key) {
        Ok(value) => Some(value),
        Err(e) => {
            result.add_error(OperationError::from_property(operation, e));
            result.mark_failed();
            None
        }
    }
}
