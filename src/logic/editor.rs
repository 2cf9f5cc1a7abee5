//! Opportunity editing
//!
//! The edits the opportunity page makes: adding and removing options,
//! flipping operators, binding a job, approving, pricing. Every successful
//! edit refreshes `last_updated`.
//!
//! # Alignment
//!
//! Edits keep `operators.len() == options.len() - 1`:
//!
//! | Edit          | Operator change |
//! |---------------|-----------------|
//! | add option    | appends an `and` unless the list was empty |
//! | delete option | drops the operator after it (before it, for the last option) |
//!
//! Lists that arrive misaligned from storage are repaired with
//! [`Opportunity::normalize_operators`].

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

use crate::engine::grouper::align_operators;
use crate::error::{OppBoardError, Result};
use crate::model::{sanitize_price, DealOption, FinancingTerms, Opportunity, Operator, Promotion};
use crate::types::OperatorKind;

/// Content of a freshly added option until a job is bound to it
pub const NEW_OPTION_CONTENT: &str = "New option";

impl Opportunity {
    /// Refresh `last_updated`
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// One past the largest option id (1 for an empty opportunity)
    pub fn next_option_id(&self) -> u64 {
        self.options.iter().map(|o| o.id).max().unwrap_or(0) + 1
    }

    fn next_operator_id(&self) -> u64 {
        self.operators.iter().map(|o| o.id).max().unwrap_or(0) + 1
    }

    fn option_mut(&mut self, option_id: u64) -> Result<&mut DealOption> {
        let opportunity = self.id.clone();
        self.options
            .iter_mut()
            .find(|o| o.id == option_id)
            .ok_or_else(|| {
                OppBoardError::not_found(format!("option {} in opportunity {}", option_id, opportunity))
            })
    }

    /// Append an incomplete option and return its id.
    pub fn add_option(&mut self, content: impl Into<String>) -> u64 {
        let id = self.next_option_id();
        if !self.options.is_empty() {
            let op_id = self.next_operator_id();
            self.operators.push(Operator::and(op_id));
        }
        self.options.push(DealOption::new(id, content));
        self.touch();
        debug!(opportunity = %self.id, option = id, "added option");
        id
    }

    /// Remove an option together with one adjacent operator.
    pub fn delete_option(&mut self, option_id: u64) -> Result<DealOption> {
        let index = self
            .options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or_else(|| OppBoardError::not_found(format!("option {}", option_id)))?;

        let last = self.options.len() - 1;
        if index < last {
            if index < self.operators.len() {
                self.operators.remove(index);
            }
        } else if index > 0 && index - 1 < self.operators.len() {
            self.operators.remove(index - 1);
        }

        let removed = self.options.remove(index);
        self.touch();
        debug!(opportunity = %self.id, option = option_id, "deleted option");
        Ok(removed)
    }

    pub fn set_operator(&mut self, operator_id: u64, kind: OperatorKind) -> Result<()> {
        let op = self
            .operators
            .iter_mut()
            .find(|op| op.id == operator_id)
            .ok_or_else(|| OppBoardError::not_found(format!("operator {}", operator_id)))?;
        op.kind = kind;
        self.touch();
        Ok(())
    }

    /// Bind a measured job to an option: its name becomes the content and the
    /// option is complete.
    pub fn bind_job(&mut self, option_id: u64, job_name: impl Into<String>) -> Result<()> {
        let option = self.option_mut(option_id)?;
        option.content = job_name.into();
        option.is_complete = true;
        self.touch();
        Ok(())
    }

    pub fn set_approval(&mut self, option_id: u64, approved: bool) -> Result<()> {
        self.option_mut(option_id)?.is_approved = Some(approved);
        self.touch();
        Ok(())
    }

    /// Negative prices are stored as 0.
    pub fn set_price(&mut self, option_id: u64, price: Decimal) -> Result<()> {
        self.option_mut(option_id)?.price = sanitize_price(price);
        self.touch();
        Ok(())
    }

    pub fn set_promotion(&mut self, option_id: u64, promotion: Option<Promotion>) -> Result<()> {
        self.option_mut(option_id)?.promotion = promotion;
        self.touch();
        Ok(())
    }

    pub fn set_financing(&mut self, option_id: u64, terms: Option<FinancingTerms>) -> Result<()> {
        self.option_mut(option_id)?.financing_option = terms;
        self.touch();
        Ok(())
    }

    /// Pad with `and` or truncate to `options.len() - 1` operators.
    ///
    /// Returns true when the list changed. Does not touch `last_updated`.
    pub fn normalize_operators(&mut self) -> bool {
        if self.operators_aligned() {
            return false;
        }
        let before = self.operators.len();
        self.operators = align_operators(self.options.len(), &self.operators);
        debug!(
            opportunity = %self.id,
            before,
            after = self.operators.len(),
            "realigned operators"
        );
        true
    }
}
