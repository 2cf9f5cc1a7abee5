use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Default board store, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "oppboard.json";

/// oppboard - price and compare the options on a sales-opportunity board
#[derive(Parser, Debug)]
#[command(name = "oppboard")]
#[command(about = "Group, price and share the options of sales opportunities")]
#[command(version)]
pub struct Cli {
    /// Board store file (a JSON object of key → document)
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Engine configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the price range and approved total for the board or one column
    Summary {
        /// Restrict the rollup to one column id
        #[arg(short, long)]
        column: Option<String>,
    },
    /// Print the package breakdown of one opportunity
    Show {
        /// Opportunity id
        id: String,
    },
    /// Print a public link for an opportunity, or for one of its options
    Share {
        /// Opportunity id
        id: String,
        /// Share a single option on the show page instead
        #[arg(short, long)]
        option: Option<u64>,
    },
    /// Create an empty opportunity in the drafts column
    Create {
        /// Opportunity title
        title: Option<String>,
    },
    /// Append an option to an opportunity
    AddOption {
        /// Opportunity id
        id: String,
        /// Option label
        #[arg(short, long)]
        content: Option<String>,
        /// Base price
        #[arg(short, long)]
        price: Option<Decimal>,
    },
    /// Move an opportunity to another column
    Move {
        /// Opportunity id
        id: String,
        /// Target column id
        column: String,
    },
    /// Validate an engine configuration file
    ValidateConfig {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
