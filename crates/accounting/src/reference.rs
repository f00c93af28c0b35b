//! Global reference data (not tenant-scoped).
//!
//! Account types and currencies are read-only at runtime. The normal balance
//! of an account type is descriptive metadata for callers; the engine does
//! not enforce it.

use serde::{Deserialize, Serialize};

/// Side on which an account type's balance conventionally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalBalance::Debit => "DEBIT",
            NormalBalance::Credit => "CREDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEBIT" => Some(NormalBalance::Debit),
            "CREDIT" => Some(NormalBalance::Credit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountType {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub normal_balance: NormalBalance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Number of minor-unit digits (2 for USD, 0 for JPY).
    pub precision: u32,
}

fn account_type(id: i32, code: &str, name: &str, normal_balance: NormalBalance) -> AccountType {
    AccountType {
        id,
        code: code.to_string(),
        name: name.to_string(),
        normal_balance,
    }
}

fn currency(id: i32, code: &str, name: &str, symbol: &str, precision: u32) -> Currency {
    Currency {
        id,
        code: code.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        precision,
    }
}

/// Seeded account type catalogue, ordered by id.
///
/// Mirrors the rows inserted by the Postgres schema migration.
pub fn builtin_account_types() -> Vec<AccountType> {
    vec![
        account_type(1, "ASSET", "Asset", NormalBalance::Debit),
        account_type(2, "LIABILITY", "Liability", NormalBalance::Credit),
        account_type(3, "EQUITY", "Equity", NormalBalance::Credit),
        account_type(4, "REVENUE", "Revenue", NormalBalance::Credit),
        account_type(5, "EXPENSE", "Expense", NormalBalance::Debit),
    ]
}

/// Seeded currency catalogue, ordered by code.
pub fn builtin_currencies() -> Vec<Currency> {
    vec![
        currency(2, "EUR", "Euro", "€", 2),
        currency(3, "GBP", "British Pound", "£", 2),
        currency(5, "IRR", "Iranian Rial", "﷼", 0),
        currency(4, "JPY", "Japanese Yen", "¥", 0),
        currency(1, "USD", "US Dollar", "$", 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_account_types_are_ordered_by_id() {
        let types = builtin_account_types();
        let ids: Vec<i32> = types.iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(types[0].code, "ASSET");
        assert_eq!(types[0].normal_balance, NormalBalance::Debit);
    }

    #[test]
    fn builtin_currencies_are_ordered_by_code() {
        let codes: Vec<String> = builtin_currencies().into_iter().map(|c| c.code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn normal_balance_round_trips_through_wire_code() {
        for nb in [NormalBalance::Debit, NormalBalance::Credit] {
            assert_eq!(NormalBalance::parse(nb.as_str()), Some(nb));
        }
        assert_eq!(NormalBalance::parse("debit"), None);
        assert_eq!(
            serde_json::to_string(&NormalBalance::Credit).unwrap(),
            "\"CREDIT\""
        );
    }
}
