//! Journal entries and the double-entry invariant.
//!
//! Callers submit a [`NewJournalEntry`] with amounts as decimal strings.
//! [`NewJournalEntry::validate`] parses every amount exactly and checks the
//! aggregate balance; only a [`ValidatedEntry`] can be turned into a
//! [`JournalEntry`] for persistence.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tally_core::{AccountId, JournalEntryId, JournalLineId, TenantId};

use crate::balance::BalanceDelta;
use crate::error::ValidationError;

/// Minimum number of lines in a journal entry.
pub const MIN_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Debit,
    Credit,
}

impl core::fmt::Display for EntrySide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntrySide::Debit => f.write_str("debit"),
            EntrySide::Credit => f.write_str("credit"),
        }
    }
}

/// One requested line. Amounts are unparsed decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalLine {
    pub account_id: AccountId,
    pub debit: String,
    pub credit: String,
    pub description: String,
}

impl NewJournalLine {
    pub fn debit(account_id: AccountId, amount: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: amount.into(),
            credit: "0".to_string(),
            description: String::new(),
        }
    }

    pub fn credit(account_id: AccountId, amount: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: "0".to_string(),
            credit: amount.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Parameters for recording a journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub reference_number: String,
    pub description: String,
    pub entry_date: DateTime<Utc>,
    pub metadata: Option<JsonValue>,
    pub lines: Vec<NewJournalLine>,
}

impl NewJournalEntry {
    pub fn new(
        reference_number: impl Into<String>,
        description: impl Into<String>,
        entry_date: DateTime<Utc>,
        lines: Vec<NewJournalLine>,
    ) -> Self {
        Self {
            reference_number: reference_number.into(),
            description: description.into(),
            entry_date,
            metadata: None,
            lines,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Parse and check the entry without touching any store.
    ///
    /// Rejections, in evaluation order:
    /// - fewer than [`MIN_LINES`] lines
    /// - an amount that is not a decimal, or is negative (first offending line wins)
    /// - metadata that is not a JSON object
    /// - `sum(debit) != sum(credit)`
    pub fn validate(self) -> Result<ValidatedEntry, ValidationError> {
        if self.lines.len() < MIN_LINES {
            return Err(ValidationError::TooFewLines(self.lines.len()));
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        for (idx, line) in self.lines.into_iter().enumerate() {
            let debit = parse_amount(&line.debit, idx, EntrySide::Debit)?;
            let credit = parse_amount(&line.credit, idx, EntrySide::Credit)?;
            lines.push(ValidatedLine {
                account_id: line.account_id,
                debit,
                credit,
                description: line.description,
            });
        }

        let metadata = match self.metadata {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Object(map)) => Some(JsonValue::Object(map)),
            Some(_) => return Err(ValidationError::MetadataNotObject),
        };

        let debits = total(&lines, EntrySide::Debit)?;
        let credits = total(&lines, EntrySide::Credit)?;
        if debits != credits {
            return Err(ValidationError::Unbalanced { debits, credits });
        }

        Ok(ValidatedEntry {
            reference_number: self.reference_number,
            description: self.description,
            entry_date: self.entry_date,
            metadata,
            lines,
            total: debits,
        })
    }
}

/// Parse a non-negative exact decimal. Blank input counts as zero.
///
/// Amounts that do not fit a 96-bit decimal with at most 28 fractional digits
/// are rejected rather than rounded.
fn parse_amount(raw: &str, line: usize, side: EntrySide) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let amount = Decimal::from_str_exact(trimmed).map_err(|e| ValidationError::InvalidAmount {
        line,
        side,
        reason: e.to_string(),
    })?;

    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { line, side });
    }
    Ok(amount)
}

fn total(lines: &[ValidatedLine], side: EntrySide) -> Result<Decimal, ValidationError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        let amount = match side {
            EntrySide::Debit => line.debit,
            EntrySide::Credit => line.credit,
        };
        acc.checked_add(amount)
            .ok_or(ValidationError::AmountOverflow(side))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedLine {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
}

/// A journal entry that satisfies the double-entry invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedEntry {
    reference_number: String,
    description: String,
    entry_date: DateTime<Utc>,
    metadata: Option<JsonValue>,
    lines: Vec<ValidatedLine>,
    total: Decimal,
}

impl ValidatedEntry {
    pub fn lines(&self) -> &[ValidatedLine] {
        &self.lines
    }

    /// Sum of debits (equal to the sum of credits).
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Distinct accounts referenced by the entry, ascending.
    pub fn account_ids(&self) -> BTreeSet<AccountId> {
        self.lines.iter().map(|l| l.account_id).collect()
    }

    /// Per-account balance changes, one per distinct account, ascending by id.
    ///
    /// Applying deltas in a fixed order keeps concurrent commits that touch
    /// overlapping accounts from deadlocking on row locks.
    pub fn balance_deltas(&self) -> Vec<BalanceDelta> {
        let mut by_account: BTreeMap<AccountId, (Decimal, Decimal)> = BTreeMap::new();
        for line in &self.lines {
            let e = by_account
                .entry(line.account_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            e.0 += line.debit;
            e.1 += line.credit;
        }

        by_account
            .into_iter()
            .map(|(account_id, (debit, credit))| BalanceDelta {
                account_id,
                debit,
                credit,
            })
            .collect()
    }

    /// Assign identifiers and timestamps, producing the row set to persist.
    pub fn into_entry(self, tenant_id: TenantId, now: DateTime<Utc>) -> JournalEntry {
        let id = JournalEntryId::new();
        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, l)| JournalEntryLine {
                id: JournalLineId::new(),
                journal_entry_id: id,
                account_id: l.account_id,
                line_number: idx as i32 + 1,
                debit: l.debit,
                credit: l.credit,
                description: l.description,
                created_at: now,
            })
            .collect();

        JournalEntry {
            id,
            tenant_id,
            reference_number: self.reference_number,
            description: self.description,
            entry_date: self.entry_date,
            metadata: self.metadata,
            lines,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A committed, immutable journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub tenant_id: TenantId,
    pub reference_number: String,
    pub description: String,
    pub entry_date: DateTime<Utc>,
    pub metadata: Option<JsonValue>,
    /// In creation order.
    pub lines: Vec<JournalEntryLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn touches(&self, account_id: AccountId) -> bool {
        self.lines.iter().any(|l| l.account_id == account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub id: JournalLineId,
    pub journal_entry_id: JournalEntryId,
    pub account_id: AccountId,
    /// 1-based position within the entry.
    pub line_number: i32,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
