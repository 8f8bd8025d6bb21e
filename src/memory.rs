//! Memory budget heuristics.
//!
//! Available memory is sampled once when the advisor is created. The configured in-memory sort
//! threshold and chunk size are then clamped so that neither can ask for more memory than the
//! machine reported as available.

use anyhow::anyhow;
use sysinfo::System;

use crate::notifier::Notifier;

pub const MB: u64 = 1024 * 1024;

/// Used when available memory cannot be determined
pub const FALLBACK_AVAILABLE_MEMORY_MB: f64 = 2048.0;

const IN_MEMORY_FRACTION: f64 = 0.8;
const CHUNK_FRACTION: f64 = 0.95;
const MIN_IN_MEMORY_THRESHOLD_MB: u64 = 10;
const MIN_CHUNK_SIZE_MB: u64 = 1;

/// Source of the available memory figure.
pub trait MemoryProbe {
    /// Available physical memory in bytes.
    fn available_memory_bytes(&self) -> Result<u64, anyhow::Error>;
}

/// [MemoryProbe] backed by `sysinfo`
#[derive(Clone, Copy, Debug, Default)]
pub struct SysinfoProbe;

impl MemoryProbe for SysinfoProbe {
    fn available_memory_bytes(&self) -> Result<u64, anyhow::Error> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(anyhow!("memory introspection is not supported on this platform"));
        }
        let mut system = System::new();
        system.refresh_memory();
        match system.available_memory() {
            0 => {
                Err(anyhow!("available memory reported as 0 bytes"))
            }
            bytes => {
                Ok(bytes)
            }
        }
    }
}

/// Derives memory bounds for one sort operation.
pub struct MemoryBudgetAdvisor<'a> {
    probe: &'a dyn MemoryProbe,
    available_mb: f64,
    warned: bool,
}

impl<'a> MemoryBudgetAdvisor<'a> {
    /// Create an advisor and sample available memory through `probe`. A failing probe results in
    /// [FALLBACK_AVAILABLE_MEMORY_MB] and a single warning.
    pub fn new(probe: &'a dyn MemoryProbe, notifier: &dyn Notifier) -> MemoryBudgetAdvisor<'a> {
        let mut advisor = MemoryBudgetAdvisor {
            probe,
            available_mb: FALLBACK_AVAILABLE_MEMORY_MB,
            warned: false,
        };
        advisor.available_mb = advisor.query_available_memory_mb(notifier);
        advisor
    }

    /// Query the probe again. Failures fall back to [FALLBACK_AVAILABLE_MEMORY_MB]; the warning is
    /// only emitted for the first failure of this advisor.
    pub fn query_available_memory_mb(&mut self, notifier: &dyn Notifier) -> f64 {
        match self.probe.available_memory_bytes() {
            Ok(bytes) => {
                bytes as f64 / MB as f64
            }
            Err(e) => {
                if !self.warned {
                    self.warned = true;
                    notifier.warning(
                        format!(
                            "Error determining available memory, assuming {} MB: {}",
                            FALLBACK_AVAILABLE_MEMORY_MB,
                            e
                        ).as_str()
                    );
                }
                FALLBACK_AVAILABLE_MEMORY_MB
            }
        }
    }

    /// Available memory in MB as sampled at creation.
    pub fn available_memory_mb(&self) -> f64 {
        self.available_mb
    }

    /// min(requested, 80% of available), at least 10 MB
    pub fn clamp_in_memory_threshold_mb(&self, requested_mb: u64) -> u64 {
        let ceiling = (self.available_mb * IN_MEMORY_FRACTION) as u64;
        requested_mb.min(ceiling).max(MIN_IN_MEMORY_THRESHOLD_MB)
    }

    /// min(requested, 95% of available), at least 1 MB
    pub fn clamp_chunk_size_mb(&self, requested_mb: u64) -> u64 {
        let ceiling = (self.available_mb * CHUNK_FRACTION) as u64;
        requested_mb.min(ceiling).max(MIN_CHUNK_SIZE_MB)
    }

    /// Byte level in-memory threshold, capped at 80% of available memory without a floor.
    pub fn clamp_in_memory_threshold_bytes(&self, requested_bytes: u64) -> u64 {
        let ceiling = (self.available_mb * IN_MEMORY_FRACTION * MB as f64) as u64;
        requested_bytes.min(ceiling)
    }

    /// Byte level chunk size, capped at 95% of available memory, at least one byte.
    pub fn clamp_chunk_size_bytes(&self, requested_bytes: u64) -> u64 {
        let ceiling = (self.available_mb * CHUNK_FRACTION * MB as f64) as u64;
        requested_bytes.min(ceiling).max(1)
    }
}
