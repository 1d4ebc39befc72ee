use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration record of one mirror's sync job.
///
/// Owned by the external repository store; the daemon only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name: String,
    /// Image the sync container runs (e.g. `"ustcmirror/rsync:latest"`).
    pub image: String,
    /// Extra environment for the sync program.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub envs: BTreeMap<String, String>,
    /// Host path -> container path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, String>,
    /// Address the sync program binds to. Empty means "use the daemon default".
    #[serde(default, rename = "bindIP")]
    pub bind_ip: String,
    /// Owner of synced files. Empty means "use the daemon default".
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub retry: i64,
    #[serde(default)]
    pub log_rot_cycle: i64,
    pub storage_dir: PathBuf,
}

impl Repository {
    /// Copy of this record with empty `bind_ip`/`user` replaced by the given defaults.
    pub fn with_defaults(&self, default_bind_ip: &str, default_owner: &str) -> Repository {
        let mut r = self.clone();
        if r.bind_ip.is_empty() {
            r.bind_ip = default_bind_ip.to_string();
        }
        if r.user.is_empty() {
            r.user = default_owner.to_string();
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_only_empty_fields() {
        let repo = Repository {
            name: "debian".into(),
            user: "mirror".into(),
            ..Default::default()
        };

        let filled = repo.with_defaults("10.0.0.1", "root");
        assert_eq!(filled.bind_ip, "10.0.0.1");
        assert_eq!(filled.user, "mirror");
        assert!(repo.bind_ip.is_empty());
    }

    #[test]
    fn deserialize_minimal_record() {
        let json = r#"{"name":"alpine","image":"alpine:latest","storageDir":"/srv/alpine"}"#;
        let repo: Repository = serde_json::from_str(json).unwrap();

        assert_eq!(repo.name, "alpine");
        assert_eq!(repo.retry, 0);
        assert!(repo.volumes.is_empty());
    }
}
