use bridge_core::{Handler, Operations};
use compose::ComposeBackend;
use std::sync::Arc;

use crate::command::{CommandGetOperation, CommandListOperation, CommandStore};
use crate::monitor::{LogsOperation, PsOperation};
use crate::project::ComposeBase;
use crate::schema::ProjectSchema;

pub const MONITOR_HANDLER: &str = "compose.monitor";
pub const COMMAND_HANDLER: &str = "compose.command";

/// Exposes the log and container listing operations.
pub struct MonitorHandler {
    base: Arc<ComposeBase>,
}

impl MonitorHandler {
    pub fn new(backend: Arc<dyn ComposeBackend>, schema: ProjectSchema) -> Self {
        Self {
            base: Arc::new(ComposeBase::new(backend, schema)),
        }
    }
}

impl Handler for MonitorHandler {
    fn id(&self) -> &str {
        MONITOR_HANDLER
    }

    fn operations(&self) -> Operations {
        let mut ops = Operations::new();
        ops.add(Arc::new(LogsOperation::new(self.base.clone())));
        ops.add(Arc::new(PsOperation::new(self.base.clone())));
        ops
    }
}

/// Exposes the project command definitions.
pub struct CommandHandler {
    base: Arc<ComposeBase>,
    store: Arc<dyn CommandStore>,
}

impl CommandHandler {
    pub fn new(
        backend: Arc<dyn ComposeBackend>,
        schema: ProjectSchema,
        store: Arc<dyn CommandStore>,
    ) -> Self {
        Self {
            base: Arc::new(ComposeBase::new(backend, schema)),
            store,
        }
    }
}

impl Handler for CommandHandler {
    fn id(&self) -> &str {
        COMMAND_HANDLER
    }

    fn operations(&self) -> Operations {
        let mut ops = Operations::new();
        ops.add(Arc::new(CommandListOperation::new(
            self.base.clone(),
            self.store.clone(),
        )));
        ops.add(Arc::new(CommandGetOperation::new(
            self.base.clone(),
            self.store.clone(),
        )));
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandSet, COMMAND_GET, COMMAND_LIST};
    use crate::monitor::{MONITOR_LOGS, MONITOR_PS};
    use compose::DockerCompose;

    fn schema() -> ProjectSchema {
        ProjectSchema::new("shop", vec!["docker-compose.yml".to_string()])
    }

    #[test]
    fn test_monitor_handler_operations() {
        let handler = MonitorHandler::new(Arc::new(DockerCompose::new()), schema());
        let ops = handler.operations();

        assert_eq!(handler.id(), "compose.monitor");
        assert_eq!(ops.ids(), vec![MONITOR_LOGS, MONITOR_PS]);
        assert_eq!(ops.external().len(), 2);
    }

    #[test]
    fn test_command_handler_operations() {
        let handler = CommandHandler::new(
            Arc::new(DockerCompose::new()),
            schema(),
            Arc::new(CommandSet::new()),
        );
        let ops = handler.operations();

        assert_eq!(handler.id(), "compose.command");
        assert_eq!(ops.ids(), vec![COMMAND_LIST, COMMAND_GET]);
    }

    #[test]
    fn test_operations_validate_against_their_schema() {
        let backend: Arc<dyn ComposeBackend> = Arc::new(DockerCompose::new());
        let mut ops = MonitorHandler::new(backend.clone(), schema()).operations();
        ops.merge(CommandHandler::new(backend, schema(), Arc::new(CommandSet::new())).operations());

        for op in ops.iter() {
            assert!(op.validate().success(), "{} failed validation", op.id());
        }
    }
}
