//! Kanban board
//!
//! Columns are workflow stages; every opportunity sits in exactly one of
//! them by column id. Column ids are derived once from the title and never
//! change, so renaming a column leaves its opportunities in place.
//!
//! # What This Explicitly Refuses To Do
//!
//! - Persist anything: the repository in [`crate::storage`] owns that
//! - Reorder cards within a column: ordering is a presentation concern

use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::pricing::PricingContext;
use crate::engine::summary::{summarize, OpportunitySummary, PriceRollup};
use crate::error::{OppBoardError, Result};
use crate::model::{default_columns, Column, Opportunity};

/// Title given to opportunities created without one
pub const NEW_OPPORTUNITY_TITLE: &str = "New Opportunity";

/// Column id for a title: trimmed, lower-cased, whitespace runs become `-`.
pub fn column_id_for(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Columns plus the opportunities placed in them
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub columns: Vec<Column>,
    pub opportunities: Vec<Opportunity>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Empty board with the default columns
    pub fn new() -> Self {
        Self {
            columns: default_columns(),
            opportunities: Vec::new(),
        }
    }

    pub fn with_opportunities(mut self, opportunities: Vec<Opportunity>) -> Self {
        self.opportunities = opportunities;
        self
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn opportunity(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    pub fn opportunity_mut(&mut self, id: &str) -> Option<&mut Opportunity> {
        self.opportunities.iter_mut().find(|o| o.id == id)
    }

    pub fn opportunities_in<'a>(&'a self, column_id: &'a str) -> impl Iterator<Item = &'a Opportunity> {
        self.opportunities.iter().filter(move |o| o.column == column_id)
    }

    // ========================================================================
    // Opportunities
    // ========================================================================

    /// Create an empty opportunity in the drafts column and return its id.
    pub fn create_opportunity(&mut self, title: Option<&str>) -> String {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NEW_OPPORTUNITY_TITLE);
        let id = Uuid::new_v4().simple().to_string();
        self.opportunities.push(Opportunity::new(id.clone(), title));
        info!(opportunity = %id, "created opportunity");
        id
    }

    pub fn delete_opportunity(&mut self, id: &str) -> Result<Opportunity> {
        let index = self
            .opportunities
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| OppBoardError::not_found(format!("opportunity {}", id)))?;
        info!(opportunity = %id, "deleted opportunity");
        Ok(self.opportunities.remove(index))
    }

    /// Move an opportunity to another column. Returns false when it was
    /// already there.
    pub fn move_opportunity(&mut self, id: &str, column_id: &str) -> Result<bool> {
        if self.column(column_id).is_none() {
            return Err(OppBoardError::not_found(format!("column {}", column_id)));
        }
        let opportunity = self
            .opportunity_mut(id)
            .ok_or_else(|| OppBoardError::not_found(format!("opportunity {}", id)))?;
        if opportunity.column == column_id {
            return Ok(false);
        }
        debug!(opportunity = %id, from = %opportunity.column, to = column_id, "moved opportunity");
        opportunity.column = column_id.to_string();
        opportunity.touch();
        Ok(true)
    }

    // ========================================================================
    // Columns
    // ========================================================================

    pub fn add_column(&mut self, title: &str) -> Result<&Column> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OppBoardError::validation("column title must not be blank"));
        }
        let id = column_id_for(title);
        if self.column(&id).is_some() {
            return Err(OppBoardError::validation(format!("column '{}' already exists", id)));
        }
        self.columns.push(Column::new(id, title));
        Ok(&self.columns[self.columns.len() - 1])
    }

    /// Change a column's title; its id stays the same.
    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OppBoardError::validation("column title must not be blank"));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| OppBoardError::not_found(format!("column {}", column_id)))?;
        column.title = title.to_string();
        Ok(())
    }

    /// Remove a column and every opportunity in it; returns the removed
    /// opportunities.
    pub fn delete_column(&mut self, column_id: &str) -> Result<Vec<Opportunity>> {
        let index = self
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| OppBoardError::not_found(format!("column {}", column_id)))?;
        self.columns.remove(index);

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.opportunities)
            .into_iter()
            .partition(|o| o.column == column_id);
        self.opportunities = kept;
        info!(column = column_id, removed = removed.len(), "deleted column");
        Ok(removed)
    }

    // ========================================================================
    // Rollups
    // ========================================================================

    pub fn column_summary(&self, column_id: &str, ctx: &PricingContext) -> PriceRollup {
        summarize(self.opportunities_in(column_id), ctx)
    }

    pub fn board_summary(&self, ctx: &PricingContext) -> PriceRollup {
        summarize(&self.opportunities, ctx)
    }

    /// Card view models in board order
    pub fn card_summaries(&self, ctx: &PricingContext) -> Vec<OpportunitySummary> {
        self.opportunities
            .iter()
            .map(|o| OpportunitySummary::build(o, ctx))
            .collect()
    }
}
