//! Ledger account domain model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of an uploaded ledger or reference chart.
///
/// Accounts are immutable once constructed: the upload layer builds one per
/// file row and every later stage (prompt construction, mapping results)
/// only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account code as it appears in the source system (e.g. "1010").
    pub code: String,
    /// Human-readable account description.
    pub description: String,
    /// Account type/class (Asset, Liability, ...) when the source file has one.
    #[serde(default)]
    pub account_type: Option<String>,
    /// Sub-class or category when the source file has one.
    #[serde(default)]
    pub category: Option<String>,
    /// Any remaining columns of the source row, keyed by column name.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Account {
    /// Creates an account with just a code and description.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            account_type: None,
            category: None,
            metadata: HashMap::new(),
        }
    }

    /// Sets the account type/class.
    pub fn with_account_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = Some(account_type.into());
        self
    }

    /// Sets the sub-class/category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attaches a metadata column.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
