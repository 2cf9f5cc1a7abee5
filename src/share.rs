//! Share payloads
//!
//! The public compare and show pages are rendered from a payload carried in
//! the link itself, so a customer can open it without an account:
//!
//! ```text
//! {base}/public/compare/{opportunity_id}?data={payload}
//! {base}/public/show/{option_id}?data={payload}
//! ```
//!
//! `payload` is the JSON `{ options, operators, packageNames }` encoded as
//! URL-safe base64 without padding. Decoding runs the JSON back through
//! [`crate::boundary`], so links produced by older builds still open.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::boundary::{normalize_operators, normalize_options, RawOperator, RawOption};
use crate::engine::grouper::group;
use crate::error::{OppBoardError, Result};
use crate::model::{DealOption, Opportunity, Operator};

pub const COMPARE_PATH: &str = "public/compare";
pub const SHOW_PATH: &str = "public/show";

/// Display name for a package without a custom name (1-based)
pub fn default_package_name(index: usize) -> String {
    format!("Package {}", index + 1)
}

/// Options, operators and package names for the public pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub options: Vec<DealOption>,
    pub operators: Vec<Operator>,
    /// Group index → display name
    #[serde(default)]
    pub package_names: BTreeMap<usize, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSharePayload {
    options: Vec<RawOption>,
    operators: Vec<RawOperator>,
    package_names: BTreeMap<String, String>,
}

impl SharePayload {
    /// Payload for the compare page: every option, with a default name per
    /// package.
    pub fn from_opportunity(opportunity: &Opportunity) -> Self {
        let package_names = (0..group(&opportunity.options, &opportunity.operators).len())
            .map(|i| (i, default_package_name(i)))
            .collect();
        Self {
            options: opportunity.options.clone(),
            operators: opportunity.operators.clone(),
            package_names,
        }
    }

    /// Payload for the show page: a single option named after its content.
    pub fn single_option(option: &DealOption) -> Self {
        Self {
            options: vec![option.clone()],
            operators: Vec::new(),
            package_names: BTreeMap::from([(0, option.content.clone())]),
        }
    }

    /// Name of package `index`, falling back to "Package N".
    pub fn package_name(&self, index: usize) -> String {
        self.package_names
            .get(&index)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| default_package_name(index))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Read a payload from loose JSON; package-name keys that are not
    /// indexes are dropped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawSharePayload::deserialize(value)?;
        let package_names = raw
            .package_names
            .into_iter()
            .filter_map(|(key, name)| key.trim().parse::<usize>().ok().map(|i| (i, name)))
            .collect();
        Ok(Self {
            options: normalize_options(&raw.options),
            operators: normalize_operators(&raw.operators),
            package_names,
        })
    }

    /// JSON → URL-safe base64, no padding
    pub fn encode(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_json()?))
    }

    pub fn decode(data: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(data.trim().trim_end_matches('='))
            .map_err(|e| OppBoardError::share(format!("invalid share data: {}", e)))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| OppBoardError::share(format!("share data is not JSON: {}", e)))?;
        let payload = Self::from_value(&value)?;
        debug!(options = payload.options.len(), "decoded share payload");
        Ok(payload)
    }
}

fn link(base_url: &str, path: &str, id: &str, payload: &SharePayload) -> Result<String> {
    Ok(format!(
        "{}/{}/{}?data={}",
        base_url.trim_end_matches('/'),
        path,
        id,
        payload.encode()?
    ))
}

/// Public compare link for a whole opportunity
pub fn compare_link(base_url: &str, opportunity: &Opportunity) -> Result<String> {
    link(
        base_url,
        COMPARE_PATH,
        &opportunity.id,
        &SharePayload::from_opportunity(opportunity),
    )
}

/// Public show link for one option
pub fn show_link(base_url: &str, option: &DealOption) -> Result<String> {
    link(
        base_url,
        SHOW_PATH,
        &option.id.to_string(),
        &SharePayload::single_option(option),
    )
}

/// Pull the `data` parameter out of a share link.
pub fn data_param(link: &str) -> Option<&str> {
    let (_, query) = link.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("data="))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FinancingTerms, Promotion};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn opportunity() -> Opportunity {
        let mut opp = Opportunity::new("opp-7", "Roof");
        opp.options = vec![
            DealOption::new(1, "Shingles").with_price(dec!(100)).complete(),
            DealOption::new(2, "Gutters")
                .with_price(dec!(200))
                .with_promotion(
                    Promotion::new("Spring", "10%")
                        .valid_until(NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date")), // test: known-good input
                ),
            DealOption::new(3, "Metal roof")
                .with_price(dec!(300))
                .with_financing(FinancingTerms::new(dec!(3.9), 48))
                .approved(true),
        ];
        opp.operators = vec![Operator::and(1), Operator::or(2)];
        opp
    }

    #[test]
    fn test_from_opportunity_names_each_package() {
        let payload = SharePayload::from_opportunity(&opportunity());
        assert_eq!(payload.package_names.len(), 2);
        assert_eq!(payload.package_name(1), "Package 2");
        assert_eq!(payload.package_name(5), "Package 6");
    }

    #[test]
    fn test_single_option_payload() {
        let opp = opportunity();
        let payload = SharePayload::single_option(&opp.options[2]);
        assert_eq!(payload.options.len(), 1);
        assert!(payload.operators.is_empty());
        assert_eq!(payload.package_name(0), "Metal roof");
    }

    #[test]
    fn test_json_uses_package_names_key() {
        let payload = SharePayload::single_option(&DealOption::new(1, "A"));
        let value: Value = serde_json::from_str(&payload.to_json().expect("serializable")) // test: known-good input
            .expect("valid json"); // test: known-good input
        assert_eq!(value["packageNames"]["0"], json!("A"));
    }

    #[test]
    fn test_encode_decode_preserves_payload() {
        let payload = SharePayload::from_opportunity(&opportunity());
        let encoded = payload.encode().expect("encodable"); // test: known-good input
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(SharePayload::decode(&encoded).expect("decodable"), payload); // test: known-good input
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(SharePayload::decode("%%%"), Err(OppBoardError::Share(_))));
        let not_json = URL_SAFE_NO_PAD.encode("hello");
        assert!(matches!(SharePayload::decode(&not_json), Err(OppBoardError::Share(_))));
    }

    #[test]
    fn test_decode_accepts_legacy_shapes() {
        let legacy = json!({
            "options": [{ "id": "1", "content": "A", "details": { "price": "$1,000" } }],
            "operators": [],
            "packageNames": { "0": "Best", "x": "ignored" }
        });
        let encoded = URL_SAFE_NO_PAD.encode(legacy.to_string());
        let payload = SharePayload::decode(&encoded).expect("legacy payload"); // test: known-good input
        assert_eq!(payload.options[0].price, dec!(1000));
        assert_eq!(payload.package_names.len(), 1);
        assert_eq!(payload.package_name(0), "Best");
    }

    #[test]
    fn test_links() {
        let opp = opportunity();
        let compare = compare_link("https://example.com/", &opp).expect("link"); // test: known-good input
        assert!(compare.starts_with("https://example.com/public/compare/opp-7?data="));
        let data = data_param(&compare).expect("data parameter"); // test: known-good input
        assert_eq!(SharePayload::decode(data).expect("decodable").options.len(), 3); // test: known-good input

        let show = show_link("http://localhost:3000", &opp.options[0]).expect("link"); // test: known-good input
        assert!(show.starts_with("http://localhost:3000/public/show/1?data="));
    }
}
