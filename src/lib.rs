//! plugcache - Plugin Cache Merging for Shaded Archives
//!
//! Merges the plugin cache files found in several input archives into a
//! single cache, relocating the class names it references so they match
//! shaded packages.

pub mod config;
pub mod error;
pub mod merge;
pub mod registry;
pub mod relocation;
pub mod staging;
pub mod transformer;

pub use error::{PlugcacheError, PlugcacheResult};
pub use merge::{MergeEngine, MergeReport};
pub use registry::{Registry, RegistryEntry};
pub use relocation::{PrefixRelocator, Relocator, RelocatorRef};
pub use transformer::{PluginCacheTransformer, ResourceTransformer, TransformerContext};
