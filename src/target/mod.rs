//! publish targets making blob content reachable by url

mod filesystem;
mod null;

pub use filesystem::FsPublishTarget;
pub use null::NullPublishTarget;

use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::records::BlobRecord;
use crate::store::BlobStore;

/// publishing side of a collection
pub trait PublishTarget {
    fn name(&self) -> &str;

    /// make one blob publicly reachable
    fn publish(&self, record: &BlobRecord, store: &dyn BlobStore) -> Result<()>;

    /// withdraw one blob; an already-absent blob is not an error
    fn unpublish(&self, record: &BlobRecord) -> Result<()>;

    /// public url for a record; empty when the target publishes nothing
    fn public_url(&self, record: &BlobRecord) -> String;

    /// publish every record of a collection enumeration
    fn publish_collection(
        &self,
        records: &mut dyn Iterator<Item = BlobRecord>,
        store: &dyn BlobStore,
    ) -> Result<()> {
        for record in records {
            self.publish(&record, store)?;
        }
        Ok(())
    }
}

/// build a publish target from its configuration definition
///
/// kinds: "null" and "filesystem".
pub fn build_target(root: &Path, config: &Config, target_name: &str) -> Result<Box<dyn PublishTarget>> {
    let def = config
        .target(target_name)
        .ok_or_else(|| Error::TargetNotFound(target_name.to_string()))?;

    match def.kind.as_str() {
        "null" => Ok(Box::new(NullPublishTarget::new(&def.name))),
        "filesystem" => {
            let path = def.path.as_ref().ok_or_else(|| {
                Error::Construction(format!("target '{}' needs a path", def.name))
            })?;
            let base_url = def.base_url.as_ref().ok_or_else(|| {
                Error::Construction(format!("target '{}' needs a base_url", def.name))
            })?;
            let target = FsPublishTarget::new(&def.name, root.join(path), base_url)?;
            Ok(Box::new(target))
        }
        other => Err(Error::Construction(format!(
            "target '{}' has unknown kind '{}'",
            def.name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetDef;
    use tempfile::tempdir;

    fn config_with(targets: Vec<TargetDef>) -> Config {
        Config {
            targets,
            ..Config::default()
        }
    }

    #[test]
    fn test_build_null_target() {
        let dir = tempdir().unwrap();
        let config = config_with(vec![TargetDef {
            name: "none".to_string(),
            kind: "null".to_string(),
            path: None,
            base_url: None,
        }]);

        let target = build_target(dir.path(), &config, "none").unwrap();
        assert_eq!(target.name(), "none");
    }

    #[test]
    fn test_build_filesystem_target() {
        let dir = tempdir().unwrap();
        let config = config_with(vec![TargetDef {
            name: "web".to_string(),
            kind: "filesystem".to_string(),
            path: Some("public".into()),
            base_url: Some("https://assets.example.org/".to_string()),
        }]);

        let target = build_target(dir.path(), &config, "web").unwrap();
        assert_eq!(target.name(), "web");
        assert!(dir.path().join("public").is_dir());
    }

    #[test]
    fn test_filesystem_target_requires_options() {
        let dir = tempdir().unwrap();
        let config = config_with(vec![TargetDef {
            name: "web".to_string(),
            kind: "filesystem".to_string(),
            path: None,
            base_url: None,
        }]);

        assert!(matches!(
            build_target(dir.path(), &config, "web"),
            Err(Error::Construction(_))
        ));
    }

    #[test]
    fn test_unknown_target() {
        let dir = tempdir().unwrap();
        let config = config_with(vec![]);
        assert!(matches!(
            build_target(dir.path(), &config, "ghost"),
            Err(Error::TargetNotFound(_))
        ));
    }
}
