//! Tuning knobs for the backing stores.

use crate::error::Error;
use crate::error::Result;

/// Smallest capacity the contiguous store allocates once it holds anything.
pub const MIN_BLOCK: usize = 8;

/// Hard cap on the number of items a single list may hold.
/// Node indices are `u32`, with the top values reserved for sentinels.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Nodes per tag group before a group has to split.
pub const GROUP_CAPACITY: usize = 32;

/// A tag group at or below this size is merged into a neighbour.
pub const GROUP_LOW: usize = GROUP_CAPACITY / 8;

/// Trim only shrinks a store filled below this ratio.
pub const TRIM_RATIO: f64 = 0.9;

/// Whether a list keeps a secondary item index.
///
/// A hashed list has set semantics: it never holds two equal items, and
/// membership queries are answered from the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Indexing {
    #[default]
    Plain,
    Hashed,
}

/// Configuration shared by both list engines.
///
/// ```
/// use viewlist::Config;
///
/// let config = Config::default().with_min_block(64).with_group_capacity(16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Lower bound on capacity growth for the contiguous store.
    pub min_block: usize,
    /// Upper bound on the number of items.
    pub max_capacity: usize,
    /// Maximum nodes per tag group (linked store).
    pub group_capacity: usize,
    /// Merge threshold for tag groups (linked store).
    pub group_low: usize,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            min_block: MIN_BLOCK,
            max_capacity: MAX_CAPACITY,
            group_capacity: GROUP_CAPACITY,
            group_low: GROUP_LOW,
        };
    }
}

impl Config {
    pub fn with_min_block(mut self, min_block: usize) -> Config {
        self.min_block = min_block;
        return self;
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Config {
        self.max_capacity = max_capacity;
        return self;
    }

    /// Sets the group capacity and derives the merge threshold from it.
    pub fn with_group_capacity(mut self, group_capacity: usize) -> Config {
        self.group_capacity = group_capacity;
        self.group_low = group_capacity / 8;
        return self;
    }

    pub fn with_group_low(mut self, group_low: usize) -> Config {
        self.group_low = group_low;
        return self;
    }

    /// Rejects combinations the stores cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.min_block == 0 {
            return Err(Error::InvalidConfig("min_block must be positive"));
        }
        if self.max_capacity < self.min_block {
            return Err(Error::InvalidConfig("max_capacity must be at least min_block"));
        }
        if self.max_capacity > MAX_CAPACITY {
            return Err(Error::InvalidConfig("max_capacity exceeds the addressable node count"));
        }
        if self.group_capacity < 4 || self.group_capacity > 1 << 16 {
            return Err(Error::InvalidConfig("group_capacity must be within 4..=65536"));
        }
        if self.group_low * 2 >= self.group_capacity {
            return Err(Error::InvalidConfig("group_low must be below half of group_capacity"));
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::default().with_min_block(0).validate().is_err());
        assert!(Config::default().with_max_capacity(4).validate().is_err());
        assert!(Config::default().with_max_capacity(MAX_CAPACITY + 1).validate().is_err());
        assert!(Config::default().with_group_capacity(2).validate().is_err());
        assert!(Config::default().with_group_low(16).validate().is_err());
    }

    #[test]
    fn group_capacity_derives_low() {
        let config = Config::default().with_group_capacity(64);
        assert_eq!(config.group_low, 8);
        assert!(config.validate().is_ok());
    }
}
