//! Command operations: listing and fetching project command definitions.
//!
//! A command is a named recipe (service + exec line) declared in the
//! project configuration. These operations only read definitions; running
//! them is left to other handlers.

use async_trait::async_trait;
use bridge_core::{
    validate_schema, ExecContext, Executor, Identifiable, OperationError, OperationResult,
    Properties, PropertyProvider, Record, Usage, Validator,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::project::ComposeBase;
use crate::schema::{require, ProjectSchema, COMMAND_DEFINITION, COMMAND_KEY, COMMAND_KEYS};

pub const COMMAND_LIST: &str = "command.compose.list";
pub const COMMAND_GET: &str = "command.compose.get";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    /// Service whose container runs the command
    pub service: String,
    #[serde(default)]
    pub exec: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl CommandDefinition {
    pub fn new(service: impl Into<String>, exec: Vec<String>) -> Self {
        Self {
            service: service.into(),
            exec,
            description: String::new(),
            help: String::new(),
            working_dir: None,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Source of command definitions.
pub trait CommandStore: Send + Sync {
    /// Command keys in sorted order
    fn keys(&self) -> Vec<String>;

    fn get(&self, key: &str) -> Option<CommandDefinition>;
}

/// Command definitions keyed by name, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSet {
    commands: BTreeMap<String, CommandDefinition>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, command: CommandDefinition) -> Self {
        self.commands.insert(key.into(), command);
        self
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandStore for CommandSet {
    fn keys(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<CommandDefinition> {
        self.commands.get(key).cloned()
    }
}

/// Lists the keys of every defined command.
pub struct CommandListOperation {
    base: Arc<ComposeBase>,
    store: Arc<dyn CommandStore>,
}

impl CommandListOperation {
    pub fn new(base: Arc<ComposeBase>, store: Arc<dyn CommandStore>) -> Self {
        Self { base, store }
    }
}

impl Identifiable for CommandListOperation {
    fn id(&self) -> &str {
        COMMAND_LIST
    }

    fn label(&self) -> &str {
        "List commands"
    }

    fn description(&self) -> &str {
        "List the commands defined for the project."
    }

    fn usage(&self) -> Usage {
        Usage::External
    }
}

impl PropertyProvider for CommandListOperation {
    fn properties(&self) -> Properties {
        let mut props = self.base.properties();
        props.add(
            COMMAND_KEYS
                .declare()
                .with_label("Command keys")
                .with_description("Receives the sorted list of command keys")
                .internal(),
        );
        props
    }

    fn required_properties(&self) -> Vec<&'static str> {
        ProjectSchema::required()
    }
}

impl Validator for CommandListOperation {
    fn validate(&self) -> OperationResult {
        validate_schema(self)
    }
}

#[async_trait]
impl Executor for CommandListOperation {
    async fn exec(&self, props: &mut Properties, ctx: &ExecContext) -> OperationResult {
        let mut result = OperationResult::new();

        if let Err(e) = self.base.resolver().resolve(props, self.id()) {
            result.add_error(e);
            result.mark_failed();
        }

        if result.success() {
            let keys = self.store.keys();
            for key in &keys {
                let description = self
                    .store
                    .get(key)
                    .map(|c| c.description)
                    .unwrap_or_default();
                ctx.reporter().report(
                    Record::info("Command")
                        .field("key", key.as_str())
                        .field("description", description),
                );
            }

            if let Err(e) = props.set(&COMMAND_KEYS, keys) {
                result.add_error(OperationError::from_property(self.id(), e));
                result.mark_failed();
            }
        }

        result.mark_finished();
        result
    }
}

/// Fetches a single command definition by key.
pub struct CommandGetOperation {
    base: Arc<ComposeBase>,
    store: Arc<dyn CommandStore>,
}

impl CommandGetOperation {
    pub fn new(base: Arc<ComposeBase>, store: Arc<dyn CommandStore>) -> Self {
        Self { base, store }
    }
}

impl Identifiable for CommandGetOperation {
    fn id(&self) -> &str {
        COMMAND_GET
    }

    fn label(&self) -> &str {
        "Get command"
    }

    fn description(&self) -> &str {
        "Retrieve a command definition by key."
    }

    fn usage(&self) -> Usage {
        Usage::External
    }
}

impl PropertyProvider for CommandGetOperation {
    fn properties(&self) -> Properties {
        let mut props = self.base.properties();
        props.add(
            COMMAND_KEY
                .declare()
                .with_label("Command key")
                .with_description("Key of the command to retrieve")
                .required(),
        );
        props.add(
            COMMAND_DEFINITION
                .declare()
                .with_label("Command definition")
                .with_description("Receives the command definition as JSON")
                .internal(),
        );
        props
    }

    fn required_properties(&self) -> Vec<&'static str> {
        let mut required = ProjectSchema::required();
        required.push(COMMAND_KEY.id());
        required
    }
}

impl Validator for CommandGetOperation {
    fn validate(&self) -> OperationResult {
        validate_schema(self)
    }
}

#[async_trait]
impl Executor for CommandGetOperation {
    async fn exec(&self, props: &mut Properties, ctx: &ExecContext) -> OperationResult {
        let mut result = OperationResult::new();

        if let Err(e) = self.base.resolver().resolve(props, self.id()) {
            result.add_error(e);
            result.mark_failed();
        }
        let key = require(props, &COMMAND_KEY, self.id(), &mut result);

        if let (true, Some(key)) = (result.success(), key) {
            match self.store.get(&key) {
                Some(command) => match serde_json::to_value(&command) {
                    Ok(definition) => {
                        ctx.reporter().report(
                            Record::info("Command")
                                .field("key", key.as_str())
                                .field("definition", definition.clone()),
                        );
                        if let Err(e) = props.set(&COMMAND_DEFINITION, definition) {
                            result.add_error(OperationError::from_property(self.id(), e));
                            result.mark_failed();
                        }
                    }
                    Err(e) => {
                        result.add_error(OperationError::backend(
                            "Could not encode the command definition",
                            e,
                        ));
                        result.mark_failed();
                    }
                },
                None => {
                    result.add_error(OperationError::not_found(format!("command {}", key)));
                    result.mark_failed();
                }
            }
        }

        result.mark_finished();
        result
    }
}
