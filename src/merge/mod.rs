//! Merge engine
//!
//! Combines every staged plugin cache fragment into one registry, relocates
//! the class names it references, and writes the result to the host's
//! output stream.
//!
//! # States
//!
//! | State | Entered by | Left by |
//! |-------|------------|---------|
//! | Idle | construction, end of `finalize` | `ingest` |
//! | Accumulating | `ingest` | `finalize` |
//! | Finalizing | `finalize` | end of `finalize` (success or error) |

pub mod shield;

pub use shield::CloseShield;

use crate::config::StagingConfig;
use crate::error::{PlugcacheError, PlugcacheResult};
use crate::registry::{codec, Registry};
use crate::relocation::{relocate_first, RelocatorRef};
use crate::staging::{format_bytes, FragmentAccumulator};
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, info};

/// Where the engine is in its build pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Idle,
    Accumulating,
    Finalizing,
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Accumulating => "accumulating",
            Self::Finalizing => "finalizing",
        };
        write!(f, "{}", name)
    }
}

/// Summary of one finalize pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Fragments decoded and merged
    pub fragments: usize,
    /// Categories in the output
    pub categories: usize,
    /// Entries in the output
    pub entries: usize,
    /// Entries replaced by a later fragment with the same category and key
    pub overridden: usize,
    /// Entries whose class name changed
    pub relocated: usize,
    /// Bytes written to the destination
    pub bytes_written: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fragments -> {} entries in {} categories ({} overridden, {} relocated, {})",
            self.fragments,
            self.entries,
            self.categories,
            self.overridden,
            self.relocated,
            format_bytes(self.bytes_written as u64)
        )
    }
}

/// Merges plugin cache fragments for one archive build
///
/// Not shared between builds: give each concurrent build its own engine.
pub struct MergeEngine {
    accumulator: FragmentAccumulator,
    state: MergeState,
}

impl MergeEngine {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            accumulator: FragmentAccumulator::new(config),
            state: MergeState::Idle,
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Staged fragments and relocators
    pub fn accumulator(&self) -> &FragmentAccumulator {
        &self.accumulator
    }

    /// Stage one fragment read from `input`
    pub fn ingest(
        &mut self,
        input: &mut dyn Read,
        relocators: &[RelocatorRef],
    ) -> PlugcacheResult<()> {
        self.accumulator.ingest(input, relocators)?;
        self.state = MergeState::Accumulating;
        Ok(())
    }

    /// Stage one fragment already held in memory
    pub fn ingest_bytes(
        &mut self,
        bytes: &[u8],
        relocators: &[RelocatorRef],
    ) -> PlugcacheResult<()> {
        let mut input = bytes;
        self.ingest(&mut input, relocators)
    }

    /// See [`FragmentAccumulator::has_pending_work`]
    pub fn has_pending_work(&self) -> bool {
        let pending = self.accumulator.has_pending_work();
        debug!("Has pending work: {}", pending);
        pending
    }

    /// Merge everything staged so far and write it to `destination`
    ///
    /// The destination is flushed but stays open. Staged fragments and
    /// relocators are released whether or not the merge succeeds. When a
    /// fragment is corrupt or the registry cannot be encoded, nothing is
    /// written.
    pub fn finalize<W: Write + ?Sized>(
        &mut self,
        destination: &mut W,
    ) -> PlugcacheResult<MergeReport> {
        self.state = MergeState::Finalizing;
        let result = self.merge_into(destination);
        self.accumulator.reset();
        self.state = MergeState::Idle;

        if let Ok(report) = &result {
            info!("Merged plugin cache: {}", report);
        }
        result
    }

    fn merge_into<W: Write + ?Sized>(&self, destination: &mut W) -> PlugcacheResult<MergeReport> {
        let (merged, mut report) = self.merge_staged()?;
        let merged = self.relocate_all(merged, &mut report);

        report.categories = merged.len();
        report.entries = merged.entry_count();

        let mut shield = CloseShield::new(destination);
        report.bytes_written = codec::write_registry(&merged, &mut shield)?;
        shield
            .close()
            .map_err(|e| PlugcacheError::destination("flushing destination", e))?;

        Ok(report)
    }

    /// Decode all fragments in staging order, later ones winning
    fn merge_staged(&self) -> PlugcacheResult<(Registry, MergeReport)> {
        let fragments = self.accumulator.fragments();
        let mut report = MergeReport {
            fragments: fragments.len(),
            ..MergeReport::default()
        };
        let mut merged = Registry::new();

        for fragment in fragments {
            let bytes = fragment.read()?;
            let registry = codec::decode(&bytes).map_err(|e| e.in_fragment(fragment.index()))?;
            debug!(
                "Decoded fragment #{}: {} entries in {} categories",
                fragment.index(),
                registry.entry_count(),
                registry.len()
            );
            report.overridden += merged.merge(registry);
        }

        Ok((merged, report))
    }

    fn relocate_all(&self, merged: Registry, report: &mut MergeReport) -> Registry {
        let rules = self.accumulator.relocators();
        if rules.is_empty() {
            return merged;
        }

        merged.map_entries(|entry| match relocate_first(&entry.class_name, rules) {
            Some(class_name) if class_name != entry.class_name => {
                debug!("Relocated {} -> {}", entry.class_name, class_name);
                report.relocated += 1;
                entry.with_class_name(class_name)
            }
            _ => entry,
        })
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(StagingConfig::default())
    }
}
