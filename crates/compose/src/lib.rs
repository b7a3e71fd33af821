pub mod docker;
pub mod error;
pub mod traits;

pub use docker::DockerCompose;
pub use error::{ComposeError, Result};
pub use traits::{parse_ps_output, ComposeBackend, ContainerInfo, Project};
