//! Bank configuration

use chrono::Duration;
use rpbank_risk::RiskConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Score given to every newly registered ledger
    #[serde(default = "default_baseline_credit_score")]
    pub baseline_credit_score: i32,

    /// Read-plan-apply cycles before a decision reports contention
    #[serde(default = "default_max_apply_attempts")]
    pub max_apply_attempts: u32,

    /// After this long an unfinished claim may be taken over
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: i64,

    #[serde(default)]
    pub risk: RiskConfig,
}

fn default_baseline_credit_score() -> i32 {
    600
}

fn default_max_apply_attempts() -> u32 {
    3
}

fn default_claim_ttl_secs() -> i64 {
    300
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            baseline_credit_score: default_baseline_credit_score(),
            max_apply_attempts: default_max_apply_attempts(),
            claim_ttl_secs: default_claim_ttl_secs(),
            risk: RiskConfig::default(),
        }
    }
}

impl BankConfig {
    pub fn claim_ttl(&self) -> Duration {
        Duration::seconds(self.claim_ttl_secs)
    }

    /// Load config from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
