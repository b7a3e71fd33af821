//! Monitoring operations: log streaming and container listing.

use async_trait::async_trait;
use bridge_core::{
    validate_schema, ExecContext, Executor, Identifiable, OperationError, OperationResult,
    OutputSink, Properties, PropertyProvider, PropertyValue, Record, Usage, Validator,
};
use std::sync::Arc;
use tracing::debug;

use crate::project::ComposeBase;
use crate::schema::{require, ProjectSchema, CANCEL, DETACH, OUTPUT};

pub const MONITOR_LOGS: &str = "monitor.compose.logs";
pub const MONITOR_PS: &str = "monitor.compose.ps";

const LOGS_CONTEXT: &str = "Could not attach to the project for logs";
const PS_CONTEXT: &str = "Could not list containers for the project";

/// Streams container logs of the project to standard output.
///
/// `compose.detach = false` follows the stream until it ends or the
/// cancellation token fires; `true` prints the current logs and returns.
pub struct LogsOperation {
    base: Arc<ComposeBase>,
}

impl LogsOperation {
    pub fn new(base: Arc<ComposeBase>) -> Self {
        Self { base }
    }

    /// Bind the output property (if declared) to stdout and return the sink
    /// the backend should write to.
    fn bind_output(&self, props: &mut Properties, result: &mut OperationResult) -> OutputSink {
        let sink = OutputSink::stdout();
        if let Some(property) = props.get_mut(OUTPUT.id()) {
            if let Err(e) = property.set(PropertyValue::Output(sink.clone())) {
                result.add_error(OperationError::from_property(self.id(), e));
                result.mark_failed();
            }
        }
        sink
    }
}

impl Identifiable for LogsOperation {
    fn id(&self) -> &str {
        MONITOR_LOGS
    }

    fn label(&self) -> &str {
        "Container logs"
    }

    fn description(&self) -> &str {
        "Show or follow the logs of all containers in the compose project."
    }

    fn usage(&self) -> Usage {
        Usage::External
    }
}

impl PropertyProvider for LogsOperation {
    fn properties(&self) -> Properties {
        let mut props = self.base.properties();
        props.merge(
            Properties::new()
                .with(
                    DETACH
                        .declare()
                        .with_label("Detach")
                        .with_description("Print current logs and return instead of following")
                        .required(),
                )
                .with(
                    OUTPUT
                        .declare()
                        .with_label("Output")
                        .with_description("Where the log stream is written")
                        .internal(),
                ),
        );
        props
    }

    fn required_properties(&self) -> Vec<&'static str> {
        let mut required = ProjectSchema::required();
        required.push(DETACH.id());
        required
    }
}

impl Validator for LogsOperation {
    fn validate(&self) -> OperationResult {
        validate_schema(self)
    }
}

#[async_trait]
impl Executor for LogsOperation {
    async fn exec(&self, props: &mut Properties, _ctx: &ExecContext) -> OperationResult {
        let mut result = OperationResult::new();

        let handle = match self.base.resolver().resolve(props, self.id()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                result.add_error(e);
                result.mark_failed();
                None
            }
        };
        let cancel = require(props, &CANCEL, self.id(), &mut result);
        let detach = require(props, &DETACH, self.id(), &mut result);

        let (Some(handle), Some(cancel), Some(detach)) = (handle, cancel, detach) else {
            result.mark_finished();
            return result;
        };

        let sink = self.bind_output(props, &mut result);

        if result.success() {
            let follow = !detach;
            debug!(project = handle.project().name(), follow, "Streaming logs");

            match handle.logs(&cancel, follow, &sink).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    result.add_error(OperationError::cancelled(self.id()));
                }
                Err(e) => {
                    result.add_error(OperationError::backend(LOGS_CONTEXT, e));
                    result.mark_failed();
                }
            }
        }

        result.mark_finished();
        result
    }
}

/// Reports every running container of the project as a structured record.
pub struct PsOperation {
    base: Arc<ComposeBase>,
}

impl PsOperation {
    pub fn new(base: Arc<ComposeBase>) -> Self {
        Self { base }
    }
}

impl Identifiable for PsOperation {
    fn id(&self) -> &str {
        MONITOR_PS
    }

    fn label(&self) -> &str {
        "List containers"
    }

    fn description(&self) -> &str {
        "List all containers used by the compose project."
    }

    fn usage(&self) -> Usage {
        Usage::External
    }
}

impl PropertyProvider for PsOperation {
    fn properties(&self) -> Properties {
        self.base.properties()
    }

    fn required_properties(&self) -> Vec<&'static str> {
        ProjectSchema::required()
    }
}

impl Validator for PsOperation {
    fn validate(&self) -> OperationResult {
        validate_schema(self)
    }
}

#[async_trait]
impl Executor for PsOperation {
    async fn exec(&self, props: &mut Properties, ctx: &ExecContext) -> OperationResult {
        let mut result = OperationResult::new();

        let handle = match self.base.resolver().resolve(props, self.id()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                result.add_error(e);
                result.mark_failed();
                None
            }
        };
        let cancel = require(props, &CANCEL, self.id(), &mut result);

        let (Some(handle), Some(cancel)) = (handle, cancel) else {
            result.mark_finished();
            return result;
        };

        match handle.ps(&cancel).await {
            Ok(infos) if infos.is_empty() => {
                ctx.reporter()
                    .report(Record::info("No running containers found."));
            }
            Ok(infos) => {
                for (index, info) in infos.iter().enumerate() {
                    let raw: serde_json::Map<String, serde_json::Value> = info
                        .fields()
                        .iter()
                        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                        .collect();

                    ctx.reporter().report(
                        Record::info("Compose info")
                            .field("index", index)
                            .field("id", optional(info.id()))
                            .field("name", optional(info.name()))
                            .field("state", optional(info.state()))
                            .field("info", serde_json::Value::Object(raw)),
                    );
                }
            }
            Err(e) if e.is_cancelled() => {
                result.add_error(OperationError::cancelled(self.id()));
            }
            Err(e) => {
                result.add_error(OperationError::backend(PS_CONTEXT, e));
                result.mark_failed();
            }
        }

        result.mark_finished();
        result
    }
}

fn optional(value: Option<&str>) -> serde_json::Value {
    value.map_or(serde_json::Value::Null, serde_json::Value::from)
}
