use std::collections::HashSet;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::records::AssetRecord;

/// predicate deciding whether some subsystem still references an asset
///
/// strategies are side-effect-free and order-independent.
pub trait UsageStrategy {
    fn name(&self) -> &str;
    fn is_in_use(&self, asset: &AssetRecord) -> bool;
}

/// explicit set of usage strategies assembled by the application wiring
///
/// an asset counts as in use when at least one strategy still knows a
/// reference; it is deletable only when every registered strategy
/// agrees it is unused. with no strategies registered that condition
/// is vacuously true, so every asset is reported unused — intended
/// behavior, kept deliberately.
#[derive(Default)]
pub struct UsageRegistry {
    strategies: Vec<Box<dyn UsageStrategy>>,
}

impl UsageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Box<dyn UsageStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn is_in_use(&self, asset: &AssetRecord) -> bool {
        self.strategies.iter().any(|s| s.is_in_use(asset))
    }
}

/// usage strategy backed by a plain text list of referenced identifiers
///
/// each non-empty line names an asset identifier or a blob content
/// hash; `#` starts a comment.
pub struct ReferenceListStrategy {
    name: String,
    referenced: HashSet<String>,
}

impl ReferenceListStrategy {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let referenced = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            name: format!("reference-list:{}", path.display()),
            referenced,
        })
    }
}

impl UsageStrategy for ReferenceListStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_in_use(&self, asset: &AssetRecord) -> bool {
        self.referenced.contains(&asset.identifier)
            || self.referenced.contains(&asset.resource.to_hex())
    }
}
