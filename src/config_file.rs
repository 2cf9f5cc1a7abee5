//! Engine configuration file.
//!
//! A small JSON document holding the defaults the engine falls back to when
//! an opportunity carries none of its own. Every field is optional in the
//! file; missing fields take the defaults below.
//!
//! ```json
//! {
//!   "financing": { "apr": 6.99, "termLength": 60 },
//!   "clampNegativePrices": true,
//!   "currencySymbol": "$",
//!   "shareBaseUrl": "http://localhost:3000"
//! }
//! ```

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::format::DEFAULT_CURRENCY_SYMBOL;
use crate::engine::pricing::PricingContext;
use crate::model::FinancingTerms;

pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:3000";

/// Upper bound for a sensible APR, in percent
pub const MAX_APR: Decimal = Decimal::ONE_HUNDRED;

/// Upper bound for a loan term, in months (50 years)
pub const MAX_TERM_MONTHS: u32 = 600;

/// Engine defaults that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Financing terms for groups and opportunities without their own
    pub financing: FinancingTerms,
    /// Floor effective prices at 0 when a discount exceeds the price
    pub clamp_negative_prices: bool,
    pub currency_symbol: String,
    /// Origin the public compare/show links are built on
    pub share_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            financing: FinancingTerms::default(),
            clamp_negative_prices: true,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize engine configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let apr = self.financing.apr;
        if !(Decimal::ZERO..=MAX_APR).contains(&apr) {
            anyhow::bail!("APR must be between 0 and {}%, got {}", MAX_APR, apr);
        }

        let term = self.financing.term_length;
        if term == 0 || term > MAX_TERM_MONTHS {
            anyhow::bail!(
                "Term length must be 1-{} months, got {}",
                MAX_TERM_MONTHS,
                term
            );
        }

        if self.currency_symbol.trim().is_empty() {
            anyhow::bail!("Currency symbol must be specified");
        }

        let url = self.share_base_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("Share base URL must start with http:// or https://");
        }

        Ok(())
    }

    /// Base pricing context for every opportunity
    pub fn pricing_context(&self) -> PricingContext {
        PricingContext::new(self.financing).with_clamping(self.clamp_negative_prices)
    }
}
