//! Compose handlers: monitoring (logs, ps) and command definitions,
//! exposed as bridge operations over a [`compose::ComposeBackend`].

pub mod command;
pub mod handlers;
pub mod monitor;
pub mod project;
pub mod schema;

pub use command::{
    CommandDefinition, CommandGetOperation, CommandListOperation, CommandSet, CommandStore,
    COMMAND_GET, COMMAND_LIST,
};
pub use handlers::{CommandHandler, MonitorHandler, COMMAND_HANDLER, MONITOR_HANDLER};
pub use monitor::{LogsOperation, PsOperation, MONITOR_LOGS, MONITOR_PS};
pub use project::{ComposeBase, ProjectHandle, ProjectResolver};
pub use schema::ProjectSchema;
