//! oppboard - Main entry point
//!
//! A thin host over the library: load the board from a JSON store, derive
//! packages and prices through the engine, print the result.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use oppboard::cli::{Cli, Commands};
use oppboard::config_file::EngineConfig;
use oppboard::engine::format::format_amount;
use oppboard::engine::pricing::GroupTotal;
use oppboard::engine::summary::OpportunitySummary;
use oppboard::logic::editor::NEW_OPTION_CONTENT;
use oppboard::share::{compare_link, show_link, SharePayload};
use oppboard::storage::{JsonFileStore, OpportunityRepository};
use oppboard::{Board, Opportunity};

/// Initialize the logger; `RUST_LOG` overrides the `info` default
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application entry point
fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse_args();
    debug!(?cli, "CLI arguments parsed");

    if let Commands::ValidateConfig { config } = &cli.command {
        return validate_config(config);
    }

    let config = match &cli.config {
        Some(path) => {
            let config = EngineConfig::load_from_file(path)?;
            config
                .validate()
                .with_context(|| format!("Invalid configuration in {:?}", path))?;
            config
        }
        None => EngineConfig::default(),
    };

    let store = JsonFileStore::open(&cli.store)
        .with_context(|| format!("Failed to open store {:?}", cli.store))?;
    let mut repo = OpportunityRepository::new(store);
    let mut board = repo.load_board()?;
    info!(
        store = %cli.store.display(),
        opportunities = board.opportunities.len(),
        "loaded board"
    );

    match cli.command {
        Commands::Summary { column } => print_summary(&board, column.as_deref(), &config)?,
        Commands::Show { id } => print_opportunity(find(&board, &id)?, &config),
        Commands::Share { id, option } => {
            let opportunity = find(&board, &id)?;
            let link = match option {
                Some(option_id) => {
                    let option = opportunity.option(option_id).with_context(|| {
                        format!("Option {} not found in opportunity {}", option_id, id)
                    })?;
                    repo.cache_show(&option_id.to_string(), &SharePayload::single_option(option))?;
                    show_link(&config.share_base_url, option)?
                }
                None => compare_link(&config.share_base_url, opportunity)?,
            };
            println!("{}", link);
        }
        Commands::Create { title } => {
            let id = board.create_opportunity(title.as_deref());
            repo.save_board(&board)?;
            println!("{}", id);
        }
        Commands::AddOption { id, content, price } => {
            let opportunity = board
                .opportunity_mut(&id)
                .with_context(|| format!("Opportunity {} not found", id))?;
            let option_id =
                opportunity.add_option(content.as_deref().unwrap_or(NEW_OPTION_CONTENT));
            if let Some(price) = price {
                opportunity.set_price(option_id, price)?;
            }
            repo.save_board(&board)?;
            println!("{}", option_id);
        }
        Commands::Move { id, column } => {
            if board.move_opportunity(&id, &column)? {
                repo.save_board(&board)?;
                println!("✓ Moved {} to {}", id, column);
            } else {
                println!("{} is already in {}", id, column);
            }
        }
        Commands::ValidateConfig { .. } => {}
    }

    Ok(())
}

fn validate_config(path: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", path);
    match EngineConfig::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(_) => {
                info!("Configuration validation successful");
                println!("✓ Configuration file is valid: {:?}", config);
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to load configuration file: {:#}", e);
            eprintln!("✗ Failed to load configuration file: {:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn find<'a>(board: &'a Board, id: &str) -> Result<&'a Opportunity> {
    board
        .opportunity(id)
        .with_context(|| format!("Opportunity {} not found", id))
}

fn print_summary(board: &Board, column: Option<&str>, config: &EngineConfig) -> Result<()> {
    let ctx = config.pricing_context();
    let (scope, rollup) = match column {
        Some(column_id) => {
            let column = board
                .column(column_id)
                .with_context(|| format!("Column {} not found", column_id))?;
            (column.title.clone(), board.column_summary(column_id, &ctx))
        }
        None => ("Board".to_string(), board.board_summary(&ctx)),
    };

    println!("{}", scope);
    if rollup.is_empty() {
        println!("  no priced packages");
    }
    for line in rollup.lines(&config.currency_symbol) {
        println!("  {}", line);
    }
    Ok(())
}

fn print_opportunity(opportunity: &Opportunity, config: &EngineConfig) {
    let symbol = config.currency_symbol.as_str();
    let summary = OpportunitySummary::build(opportunity, &config.pricing_context());
    let today = Utc::now().date_naive();

    println!("{} ({}) [{}]", summary.title, summary.id, summary.column);
    if let Some(comparison) = &summary.comparison {
        println!("  {}", comparison);
    }
    for total in &summary.groups {
        print_group(total, symbol);
    }
    for option in &opportunity.options {
        if let Some(promotion) = option.promotion.as_ref().filter(|p| p.is_expired(today)) {
            println!("  ! promotion '{}' on {} has expired", promotion.kind, option.content);
        }
    }
    for line in summary.rollup.lines(symbol) {
        println!("  {}", line);
    }
}

fn print_group(total: &GroupTotal, symbol: &str) {
    let approved = if total.all_approved { " (approved)" } else { "" };
    println!(
        "  Package {}: {}{}",
        total.index + 1,
        format_amount(total.total, symbol),
        approved
    );
    if let Some(monthly) = total.monthly_payment {
        println!(
            "    as low as {}/mo ({}% APR, {} months)",
            format_amount(monthly, symbol),
            total.financing.apr,
            total.financing.term_length
        );
    }
    for line in &total.lines {
        let discount = if line.discount > Decimal::ZERO {
            format!(" (-{})", format_amount(line.discount, symbol))
        } else {
            String::new()
        };
        println!(
            "    - {} {}{}",
            line.content,
            format_amount(line.effective_price, symbol),
            discount
        );
    }
}
