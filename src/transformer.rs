//! Archive resource transformer
//!
//! The interface an archive-building host drives while it copies entries
//! from input archives into the output archive. The host owns enumeration
//! and entry headers; the transformer claims matching entries, and at the
//! end supplies the body of the single merged entry.

use crate::config::Config;
use crate::error::PlugcacheResult;
use crate::merge::{MergeEngine, MergeReport};
use crate::relocation::RelocatorRef;
use std::io::{Read, Write};
use tracing::debug;

/// One archive entry handed to a transformer
pub struct TransformerContext<'a> {
    /// Entry path inside its archive
    pub path: &'a str,

    /// Entry contents, readable only during the call
    pub input: &'a mut dyn Read,

    /// Relocators active for this build
    pub relocators: &'a [RelocatorRef],
}

/// Resource transformer, held by the host as a typed collaborator
pub trait ResourceTransformer {
    /// Whether the entry at `path` should be routed to this transformer
    fn can_transform_resource(&self, path: &str) -> bool;

    /// Take in one matching entry
    fn transform(&mut self, context: TransformerContext<'_>) -> PlugcacheResult<()>;

    /// Whether `modify_output` would write something worth keeping
    fn has_transformed_resource(&self) -> bool;

    /// Write the transformed entry body to `destination`
    ///
    /// The host must already have started the entry named `resource_path()`.
    fn modify_output(&mut self, destination: &mut dyn Write) -> PlugcacheResult<MergeReport>;

    /// Archive path the output belongs under
    fn resource_path(&self) -> &str;
}

/// Transformer for plugin cache files
pub struct PluginCacheTransformer {
    resource_path: String,
    engine: MergeEngine,
}

impl PluginCacheTransformer {
    pub fn new(config: Config) -> Self {
        Self {
            resource_path: config.resource.path,
            engine: MergeEngine::new(config.staging),
        }
    }

    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }
}

impl Default for PluginCacheTransformer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ResourceTransformer for PluginCacheTransformer {
    fn can_transform_resource(&self, path: &str) -> bool {
        let matches = path == self.resource_path;
        debug!("Can transform {:?}? {}", path, matches);
        matches
    }

    fn transform(&mut self, context: TransformerContext<'_>) -> PlugcacheResult<()> {
        debug!("Transforming {}", context.path);
        self.engine.ingest(context.input, context.relocators)
    }

    fn has_transformed_resource(&self) -> bool {
        self.engine.has_pending_work()
    }

    fn modify_output(&mut self, destination: &mut dyn Write) -> PlugcacheResult<MergeReport> {
        self.engine.finalize(destination)
    }

    fn resource_path(&self) -> &str {
        &self.resource_path
    }
}
