//! Storage quota accounting
//!
//! Sizes are byte lengths of each collection's serialized JSON, compared
//! against a fixed capacity. Everything here is a pure computation over
//! record lists; nothing is persisted.

use serde::Serialize;

/// Default storage budget (100 MiB)
pub const DEFAULT_CAPACITY_BYTES: u64 = 100 * 1024 * 1024;

/// Default "nearly full" threshold of available bytes (10 MiB)
pub const DEFAULT_LOW_WATER_BYTES: u64 = 10 * 1024 * 1024;

/// Count and serialized size of one collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub count: usize,
    pub total_size: u64,
}

impl CollectionStats {
    /// Measure a record list by serializing it
    pub fn measure<R: Serialize>(records: &[R]) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(records)?;
        Ok(Self {
            count: records.len(),
            total_size: bytes.len() as u64,
        })
    }
}

/// Usage across all collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub sermons: CollectionStats,
    pub journals: CollectionStats,
    pub chats: CollectionStats,
    pub total_size: u64,
    /// Remaining budget; negative when over capacity
    pub available: i64,
}

/// Coarse usage bands for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageHealth {
    /// Under half the budget used
    Healthy,
    /// Under 80% used
    Warning,
    Critical,
}

/// Fixed capacity and low-water mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    capacity: u64,
    low_water: u64,
}

impl Default for Quota {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES, DEFAULT_LOW_WATER_BYTES)
    }
}

impl Quota {
    pub fn new(capacity: u64, low_water: u64) -> Self {
        Self {
            capacity,
            low_water,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn low_water(&self) -> u64 {
        self.low_water
    }

    /// Combine per-collection measurements into overall usage
    pub fn stats(
        &self,
        sermons: CollectionStats,
        journals: CollectionStats,
        chats: CollectionStats,
    ) -> StorageStats {
        let total_size = sermons.total_size + journals.total_size + chats.total_size;
        StorageStats {
            sermons,
            journals,
            chats,
            total_size,
            available: self.capacity as i64 - total_size as i64,
        }
    }

    /// True once available bytes fall below the low-water mark
    pub fn is_full(&self, stats: &StorageStats) -> bool {
        stats.available < self.low_water as i64
    }

    /// Share of the capacity in use, rounded to a whole percent
    pub fn used_percentage(&self, stats: &StorageStats) -> u32 {
        if self.capacity == 0 {
            return 100;
        }
        (stats.total_size as f64 / self.capacity as f64 * 100.0).round() as u32
    }

    pub fn health(&self, stats: &StorageStats) -> StorageHealth {
        match self.used_percentage(stats) {
            p if p < 50 => StorageHealth::Healthy,
            p if p < 80 => StorageHealth::Warning,
            _ => StorageHealth::Critical,
        }
    }
}

/// Format a byte count with 1024-based units, e.g. `1.5 KB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
