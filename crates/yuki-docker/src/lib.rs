//! Docker backend of the yuki runtime client, built on `bollard`.

mod config;
pub use config::{DockerConfig, DockerEndpoint};

mod error;
pub use error::DockerError;

mod runtime;
pub use runtime::DockerRuntime;
