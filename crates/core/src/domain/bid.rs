use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::rates::TradeCategory;

/// Markup applied to material cost when the input does not specify one.
pub fn default_markup_factor() -> Decimal {
    Decimal::new(12, 1)
}

/// Single material / labor line in a bid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    #[serde(alias = "mto_cost_unit")]
    pub unit_material_cost: Decimal,
    pub minutes_per_unit: u32,
    #[serde(alias = "mto_mu", default = "default_markup_factor")]
    pub material_markup_factor: Decimal,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        unit_material_cost: Decimal,
        minutes_per_unit: u32,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_material_cost,
            minutes_per_unit,
            material_markup_factor: default_markup_factor(),
        }
    }

    pub fn with_markup(mut self, material_markup_factor: Decimal) -> Self {
        self.material_markup_factor = material_markup_factor;
        self
    }
}

/// Complete bid request as produced by extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidInput {
    pub bid_type: String,
    pub tax_percent: Decimal,
    pub items: Vec<LineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("bid input failed validation: {}", render_issues(.issues))]
pub struct InputValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl BidInput {
    /// Checks every schema rule and reports all violations at once.
    pub fn validate(&self) -> Result<(), InputValidationError> {
        let mut issues = Vec::new();

        if self.bid_type.parse::<TradeCategory>().is_err() {
            issues.push(ValidationIssue {
                field: "bid_type".to_string(),
                message: format!(
                    "`{}` is not supported (expected one of {})",
                    self.bid_type,
                    TradeCategory::names().join(", ")
                ),
            });
        }

        if self.tax_percent < Decimal::ZERO {
            issues.push(ValidationIssue {
                field: "tax_percent".to_string(),
                message: format!("must be >= 0 (got {})", self.tax_percent),
            });
        }

        for (index, item) in self.items.iter().enumerate() {
            validate_item(index, item, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(InputValidationError { issues })
        }
    }
}

fn validate_item(index: usize, item: &LineItem, issues: &mut Vec<ValidationIssue>) {
    let mut push = |field: &str, message: String| {
        issues.push(ValidationIssue { field: format!("items[{index}].{field}"), message });
    };

    if item.name.trim().is_empty() {
        push("name", "must not be empty".to_string());
    }
    if item.quantity == 0 {
        push("quantity", "must be >= 1".to_string());
    }
    if item.minutes_per_unit == 0 {
        push("minutes_per_unit", "must be >= 1".to_string());
    }
    if item.unit_material_cost < Decimal::ZERO {
        push("unit_material_cost", format!("must be >= 0 (got {})", item.unit_material_cost));
    }
    if item.material_markup_factor <= Decimal::ZERO {
        push(
            "material_markup_factor",
            format!("must be > 0 (got {})", item.material_markup_factor),
        );
    }
}
