//! oppboard library
//!
//! Groups the options of a sales opportunity into packages using AND/OR
//! operators, prices each package (promotions, approval, "as low as" monthly
//! estimates) and rolls the results up for cards, columns, the whole board
//! and public share links.

pub mod boundary;
pub mod cli;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod logic;
pub mod model;
pub mod share;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use config_file::EngineConfig;
pub use error::OppBoardError;
pub use model::{Column, DealOption, FinancingTerms, Operator, Opportunity, Promotion};
pub use types::{DiscountKind, OperatorKind};

// Engine
pub use engine::format::{format_amount, format_currency, parse_leading_number};
pub use engine::grouper::{group, Group};
pub use engine::pricing::{aggregate, aggregate_with, price_groups, GroupTotal, LineItem, PricingContext};
pub use engine::summary::{comparison_label, summarize, OpportunitySummary, PriceRollup};

// Board, sharing and storage
pub use logic::board::Board;
pub use share::SharePayload;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, OpportunityRepository};
