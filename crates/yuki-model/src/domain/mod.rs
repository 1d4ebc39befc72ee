mod kv;
pub use kv::KeyValue;

mod env;
pub use env::EnvSet;

mod constants;
pub use constants::{
    DATA_MOUNT_POINT, LABEL_IMAGES, LABEL_NAME, LABEL_STORAGE_DIR, LABEL_SYNCING, LOG_MOUNT_POINT,
};

mod container;
pub use container::Container;

mod status;
pub use status::ContainerStatus;

mod repository;
pub use repository::Repository;

mod options;
pub use options::SyncOptions;

/// Opaque identifier assigned by the container runtime.
pub type ContainerId = String;

/// Runtime-attached key/value metadata.
pub type Labels = std::collections::HashMap<String, String>;
