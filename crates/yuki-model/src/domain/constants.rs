/// Repository name the sync container was launched for.
pub const LABEL_NAME: &str = "org.ustcmirror.name";

/// Marks a container as a sync job. Always `"true"` on containers we create.
pub const LABEL_SYNCING: &str = "org.ustcmirror.syncing";

/// Host storage directory of the repository being synced.
pub const LABEL_STORAGE_DIR: &str = "org.ustcmirror.storage-dir";

/// Marks images that may be removed once dangling.
pub const LABEL_IMAGES: &str = "org.ustcmirror.images";

/// Where the repository storage directory is mounted inside the container.
pub const DATA_MOUNT_POINT: &str = "/data/";

/// Where the per-repository log directory is mounted inside the container.
pub const LOG_MOUNT_POINT: &str = "/log/";
