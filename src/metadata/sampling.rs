//! How many rows to pull when sampling a table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "active", rename_all = "lowercase")]
pub enum RecordSampling {
    Absolute { value: u64 },
    Relative { percent: f64 },
}

impl Default for RecordSampling {
    fn default() -> Self {
        RecordSampling::Absolute { value: 1000 }
    }
}

impl RecordSampling {
    /// Row limit for a table holding `count` rows. Never below one.
    pub fn limit(&self, count: u64) -> u64 {
        let size = match *self {
            RecordSampling::Absolute { value } => value,
            RecordSampling::Relative { percent } => (count as f64 * percent / 100.0).round() as u64,
        };
        size.max(1)
    }
}
