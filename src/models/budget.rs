use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

/// Monthly spending limit for one category. The category is the key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Budget {
    pub(crate) category: String,
    pub(crate) limit: Decimal,
}

impl Budget {
    pub(crate) fn new(category: &str, limit: Decimal) -> Result<Self> {
        let category = category.trim();
        if category.is_empty() {
            anyhow::bail!("Budget category must not be empty");
        }
        if limit < Decimal::ZERO {
            anyhow::bail!("Budget limit must not be negative: {limit}");
        }
        Ok(Self {
            category: category.to_string(),
            limit,
        })
    }
}
