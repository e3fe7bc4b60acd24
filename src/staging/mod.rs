//! Fragment staging
//!
//! Holds every plugin cache fragment seen during one archive build, along
//! with the relocators that were active for them, until the merge runs.
//!
//! # Lifecycle
//!
//! | Event | Effect |
//! |-------|--------|
//! | `ingest` | Entry bytes copied to a new fragment, relocators appended |
//! | `reset` | Fragments released, relocators cleared |
//! | drop | Same as `reset` |
//! | process exit | Any staged file still on disk is deleted |

pub mod exit_guard;
pub mod fragment;

pub use fragment::StagedFragment;

use crate::config::StagingConfig;
use crate::error::PlugcacheResult;
use crate::relocation::RelocatorRef;
use std::io::Read;
use tracing::debug;

/// Format bytes as human-readable size (e.g., "1.5 KB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Collects fragments and relocators for one merge
pub struct FragmentAccumulator {
    config: StagingConfig,
    fragments: Vec<StagedFragment>,
    relocators: Vec<RelocatorRef>,
}

impl FragmentAccumulator {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            fragments: Vec::new(),
            relocators: Vec::new(),
        }
    }

    /// Stage one entry's bytes and remember its relocators
    pub fn ingest(
        &mut self,
        input: &mut dyn Read,
        relocators: &[RelocatorRef],
    ) -> PlugcacheResult<()> {
        let fragment = StagedFragment::stage(self.fragments.len(), input, &self.config)?;
        self.fragments.push(fragment);

        if !relocators.is_empty() {
            debug!("Working with new relocators: {:?}", relocators);
            self.relocators.extend(relocators.iter().cloned());
        }
        Ok(())
    }

    /// Whether finalizing would produce something other than the input
    ///
    /// A single fragment with no relocators passes through unchanged, so
    /// it does not count. Two fragments always count, even identical ones.
    pub fn has_pending_work(&self) -> bool {
        let multiple_fragments = self.fragments.len() > 1;
        let fragment_and_relocator = !self.fragments.is_empty() && !self.relocators.is_empty();
        multiple_fragments || fragment_and_relocator
    }

    /// Staged fragments in ingestion order
    pub fn fragments(&self) -> &[StagedFragment] {
        &self.fragments
    }

    /// Accumulated relocators in supply order
    pub fn relocators(&self) -> &[RelocatorRef] {
        &self.relocators
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn rule_count(&self) -> usize {
        self.relocators.len()
    }

    /// Total bytes across staged fragments
    pub fn staged_bytes(&self) -> u64 {
        self.fragments.iter().map(StagedFragment::len).sum()
    }

    /// Release every fragment and forget all relocators
    pub fn reset(&mut self) {
        if !self.fragments.is_empty() || !self.relocators.is_empty() {
            debug!(
                "Releasing {} staged fragments and {} relocators",
                self.fragments.len(),
                self.relocators.len()
            );
        }
        self.fragments.clear();
        self.relocators.clear();
    }
}

impl Default for FragmentAccumulator {
    fn default() -> Self {
        Self::new(StagingConfig::default())
    }
}
