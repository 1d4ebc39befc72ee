use std::collections::HashMap;

use bollard::{
    errors::Error as BollardError,
    models,
    query_parameters::{ListImagesOptions, ListImagesOptionsBuilder},
};
use yuki_core::runtime::{
    ContainerFilter, ContainerSpec, ContainerSummary, ImageFilter, ImageSummary, RuntimeError,
};

const NO_SUCH_IMAGE: &str = "No such image";
const UNTAGGED: &str = "<none>:<none>";

/// Map a bollard error to a [`RuntimeError`]. `image` is the image the call depends on, if any.
pub(crate) fn classify(err: BollardError, image: Option<&str>) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => match image {
            Some(image) if message.contains(NO_SUCH_IMAGE) => RuntimeError::ImageNotFound(image.to_string()),
            _ => RuntimeError::NotFound(message),
        },
        BollardError::DockerResponseServerError {
            status_code: 409,
            message,
        } => RuntimeError::Conflict(message),
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Api(format!("{status_code}: {message}")),
        BollardError::IOError { err } => RuntimeError::Io(err.to_string()),
        other => RuntimeError::Api(other.to_string()),
    }
}

pub(crate) fn create_body(spec: &ContainerSpec) -> models::ContainerCreateBody {
    models::ContainerCreateBody {
        image: Some(spec.image.clone()),
        env: Some(spec.env.to_strings()),
        labels: Some(spec.labels.clone()),
        open_stdin: Some(spec.open_stdin),
        host_config: Some(models::HostConfig {
            binds: Some(spec.binds.clone()),
            network_mode: Some(spec.network_mode.clone()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn container_filters(filter: &ContainerFilter) -> HashMap<String, Vec<String>> {
    let mut filters = HashMap::new();
    if !filter.labels.is_empty() {
        filters.insert("label".to_string(), filter.labels.clone());
    }
    if !filter.statuses.is_empty() {
        let statuses = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        filters.insert("status".to_string(), statuses);
    }
    filters
}

pub(crate) fn image_filters(filter: &ImageFilter) -> HashMap<String, Vec<String>> {
    let mut filters = HashMap::new();
    if let Some(dangling) = filter.dangling {
        filters.insert("dangling".to_string(), vec![dangling.to_string()]);
    }
    if !filter.labels.is_empty() {
        filters.insert("label".to_string(), filter.labels.clone());
    }
    filters
}

/// Intermediate layers are included, so dangling build leftovers are listed too.
pub(crate) fn list_images_options(filter: &ImageFilter) -> ListImagesOptions {
    ListImagesOptionsBuilder::new()
        .all(true)
        .filters(&image_filters(filter))
        .build()
}

pub(crate) fn container_summary(raw: models::ContainerSummary) -> Option<ContainerSummary> {
    Some(ContainerSummary {
        id: raw.id?,
        labels: raw.labels.unwrap_or_default(),
        status: raw.state.and_then(|s| s.to_string().parse().ok()),
    })
}

pub(crate) fn image_summary(raw: models::ImageSummary) -> ImageSummary {
    let dangling = raw.repo_tags.iter().all(|t| t == UNTAGGED);
    ImageSummary {
        id: raw.id,
        labels: raw.labels,
        dangling,
    }
}
