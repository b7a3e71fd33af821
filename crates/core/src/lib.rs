//! Core contracts for bridge operations: typed properties, the result
//! aggregator, the operation capability traits and the runner that drives an
//! invocation through its lifecycle.

pub mod cancel;
pub mod error;
pub mod operation;
pub mod output;
pub mod properties;
pub mod property;
pub mod registry;
pub mod report;
pub mod result;
pub mod runner;

pub use cancel::CancelToken;
pub use error::{OperationError, PropertyError};
pub use operation::{
    validate_schema, ExecContext, Executor, Identifiable, Operation, PropertyProvider, Usage,
    Validator,
};
pub use output::OutputSink;
pub use properties::Properties;
pub use property::{Property, PropertyKey, PropertyKind, PropertyType, PropertyValue};
pub use registry::{Handler, Operations};
pub use report::{MemoryReporter, Record, RecordLevel, Reporter, TracingReporter};
pub use result::OperationResult;
pub use runner::{Invocation, OperationRunner, OperationState};
