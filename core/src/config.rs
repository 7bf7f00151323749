//! Engine configuration.
//!
//! Defaults match production behavior; deployments may override them from a
//! JSON file. The 30-day installment cadence and the 10-hop chain bound are
//! compatibility constants — changing them changes payout schedules and
//! visibility outcomes for existing data.

use crate::error::EngineResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard bound on superior-chain walks. A chain longer than this is
    /// treated as unresolvable and visibility fails closed.
    pub max_chain_depth: usize,

    /// Days between installment due dates. Fixed cadence, not
    /// calendar-month-aware.
    pub installment_interval_days: i64,

    /// Ceiling applied to a series created without an explicit
    /// max_commission_percent.
    pub default_max_commission_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 10,
            installment_interval_days: 30,
            default_max_commission_percent: 5.0,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.as_ref().display()))?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }
}
