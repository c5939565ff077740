use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for a [`MockClient`](crate::MockClient).
///
/// Latencies are written in milliseconds in TOML:
///
/// ```toml
/// query_latency = 300
/// auth_latency = 500
/// session_dir = ".nest"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(with = "millis")]
    pub query_latency: Duration,
    #[serde(with = "millis")]
    pub auth_latency: Duration,
    #[serde(with = "millis")]
    pub sign_out_latency: Duration,
    #[serde(with = "millis")]
    pub upload_latency: Duration,
    /// Directory for the session snapshot. `None` keeps it in memory.
    pub session_dir: Option<PathBuf>,
    /// Seed `profiles` with the demo user.
    pub seed_demo_profile: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            query_latency: Duration::from_millis(300),
            auth_latency: Duration::from_millis(500),
            sign_out_latency: Duration::from_millis(200),
            upload_latency: Duration::from_millis(1000),
            session_dir: None,
            seed_demo_profile: true,
        }
    }
}

impl ClientConfig {
    /// Defaults with every latency zeroed.
    pub fn instant() -> Self {
        Self {
            query_latency: Duration::ZERO,
            auth_latency: Duration::ZERO,
            sign_out_latency: Duration::ZERO,
            upload_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    pub fn from_toml_str(raw: &str) -> SdkResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| SdkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.query_latency, Duration::from_millis(300));
        assert_eq!(c.auth_latency, Duration::from_millis(500));
        assert_eq!(c.sign_out_latency, Duration::from_millis(200));
        assert_eq!(c.upload_latency, Duration::from_millis(1000));
        assert!(c.session_dir.is_none());
        assert!(c.seed_demo_profile);
    }

    #[test]
    fn instant_zeroes_latency_only() {
        let c = ClientConfig::instant();
        assert!(c.query_latency.is_zero());
        assert!(c.upload_latency.is_zero());
        assert!(c.seed_demo_profile);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ClientConfig::from_toml_str("query_latency = 5\nsession_dir = \"/tmp/nest\"\n").unwrap();
        assert_eq!(c.query_latency, Duration::from_millis(5));
        assert_eq!(c.auth_latency, Duration::from_millis(500));
        assert_eq!(c.session_dir, Some(PathBuf::from("/tmp/nest")));
    }

    #[test]
    fn toml_roundtrip_in_millis() {
        let raw = toml::to_string(&ClientConfig::instant()).unwrap();
        assert!(raw.contains("query_latency = 0"));
        assert_eq!(ClientConfig::from_toml_str(&raw).unwrap(), ClientConfig::instant());
    }

    #[test]
    fn rejects_bad_types() {
        assert!(matches!(
            ClientConfig::from_toml_str("query_latency = \"fast\""),
            Err(SdkError::ConfigParse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nest.toml");
        std::fs::write(&path, "seed_demo_profile = false\n").unwrap();
        assert!(!ClientConfig::load(&path).unwrap().seed_demo_profile);
        assert!(matches!(
            ClientConfig::load(&dir.path().join("missing.toml")),
            Err(SdkError::ConfigRead { .. })
        ));
    }
}
