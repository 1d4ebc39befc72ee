use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("cannot connect to docker at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("docker daemon at {endpoint} is not responding: {reason}")]
    Unreachable { endpoint: String, reason: String },
}
