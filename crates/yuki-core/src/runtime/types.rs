use yuki_model::{Container, ContainerId, ContainerStatus, EnvSet, Labels};

/// Everything the runtime needs to create one sync container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: EnvSet,
    pub labels: Labels,
    /// `host:container` bind mounts.
    pub binds: Vec<String>,
    pub open_stdin: bool,
    pub network_mode: String,
}

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub labels: Labels,
    pub status: Option<ContainerStatus>,
}

impl From<ContainerSummary> for Container {
    fn from(s: ContainerSummary) -> Self {
        Container::new(s.id, s.labels)
    }
}

/// Container listing filter. Labels are `key=value`; an empty status list matches every state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    pub labels: Vec<String>,
    pub statuses: Vec<ContainerStatus>,
}

impl ContainerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.push(format!("{key}={value}"));
        self
    }

    pub fn with_status(mut self, status: ContainerStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn matches(&self, labels: &Labels, status: ContainerStatus) -> bool {
        labels_match(&self.labels, labels)
            && (self.statuses.is_empty() || self.statuses.contains(&status))
    }
}

/// One entry of an image listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: String,
    pub labels: Labels,
    /// Not referenced by any tag.
    pub dangling: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilter {
    pub dangling: Option<bool>,
    pub labels: Vec<String>,
}

impl ImageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dangling(mut self) -> Self {
        self.dangling = Some(true);
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.push(format!("{key}={value}"));
        self
    }

    pub fn matches(&self, image: &ImageSummary) -> bool {
        self.dangling.is_none_or(|d| d == image.dangling) && labels_match(&self.labels, &image.labels)
    }
}

fn labels_match(wanted: &[String], labels: &Labels) -> bool {
    wanted.iter().all(|w| match w.split_once('=') {
        Some((k, v)) => labels.get(k).is_some_and(|got| got == v),
        None => labels.contains_key(w.as_str()),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Kill the container first if it is running.
    pub force: bool,
    /// Also remove anonymous volumes.
    pub volumes: bool,
}

impl RemoveOptions {
    /// Forced removal together with volumes.
    pub fn purge() -> Self {
        Self {
            force: true,
            volumes: true,
        }
    }
}

/// Log stream parameters passed to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsRequest {
    pub stdout: bool,
    pub stderr: bool,
    /// Number of trailing lines, or `"all"`.
    pub tail: String,
    pub follow: bool,
}

impl Default for LogsRequest {
    fn default() -> Self {
        Self {
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            follow: false,
        }
    }
}

/// Image reference split into repository and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: Option<String>,
}

impl ImageRef {
    /// Split `image` the way registries do: a digest keeps the reference whole, and a colon only starts a
    /// tag when nothing after it looks like a path (so `host:5000/img` has no tag).
    pub fn parse(image: &str) -> Self {
        if image.contains('@') {
            return Self {
                repository: image.to_string(),
                tag: None,
            };
        }
        match image.rsplit_once(':') {
            Some((repo, tag)) if !tag.contains('/') && !tag.is_empty() => Self {
                repository: repo.to_string(),
                tag: Some(tag.to_string()),
            },
            _ => Self {
                repository: image.to_string(),
                tag: None,
            },
        }
    }

    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn container_filter_requires_all_labels_and_any_status() {
        let f = ContainerFilter::new()
            .with_label("org.ustcmirror.syncing", "true")
            .with_status(ContainerStatus::Exited)
            .with_status(ContainerStatus::Dead);

        let l = labels(&[("org.ustcmirror.syncing", "true")]);
        assert!(f.matches(&l, ContainerStatus::Exited));
        assert!(f.matches(&l, ContainerStatus::Dead));
        assert!(!f.matches(&l, ContainerStatus::Running));
        assert!(!f.matches(&Labels::new(), ContainerStatus::Exited));
    }

    #[test]
    fn image_filter_dangling_and_label() {
        let f = ImageFilter::new().dangling().with_label("org.ustcmirror.images", "true");
        let img = ImageSummary {
            id: "sha256:1".into(),
            labels: labels(&[("org.ustcmirror.images", "true")]),
            dangling: true,
        };
        assert!(f.matches(&img));
        assert!(!f.matches(&ImageSummary {
            dangling: false,
            ..img.clone()
        }));
    }

    #[test]
    fn image_ref_parsing() {
        assert_eq!(
            ImageRef::parse("alpine:latest"),
            ImageRef {
                repository: "alpine".into(),
                tag: Some("latest".into())
            }
        );
        assert_eq!(ImageRef::parse("ustcmirror/rsync").tag, None);
        assert_eq!(ImageRef::parse("ustcmirror/rsync").tag_or_latest(), "latest");

        let with_port = ImageRef::parse("registry:5000/ustcmirror/rsync");
        assert_eq!(with_port.repository, "registry:5000/ustcmirror/rsync");
        assert_eq!(with_port.tag, None);

        let both = ImageRef::parse("registry:5000/rsync:v2");
        assert_eq!(both.repository, "registry:5000/rsync");
        assert_eq!(both.tag.as_deref(), Some("v2"));

        let digest = ImageRef::parse("alpine@sha256:abcd");
        assert_eq!(digest.repository, "alpine@sha256:abcd");
        assert_eq!(digest.tag, None);
    }
}
