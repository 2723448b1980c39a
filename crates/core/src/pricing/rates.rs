use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::PricingError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeCategory {
    Regular,
    Communication,
    Electrical,
    Plumbing,
}

impl TradeCategory {
    pub const ALL: [TradeCategory; 4] =
        [Self::Regular, Self::Communication, Self::Electrical, Self::Plumbing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Communication => "Communication",
            Self::Electrical => "Electrical",
            Self::Plumbing => "Plumbing",
        }
    }

    pub fn names() -> [&'static str; 4] {
        Self::ALL.map(|category| category.as_str())
    }
}

impl fmt::Display for TradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names must match exactly; no case folding.
impl FromStr for TradeCategory {
    type Err = PricingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|category| category.as_str() == value).ok_or_else(|| {
            PricingError::UnsupportedCategory {
                category: value.to_string(),
                supported: Self::names().iter().map(ToString::to_string).collect(),
            }
        })
    }
}

/// Per-man-hour dollar rates for one trade.
///
/// Only `sell_rate_per_hour` feeds the sale price. Burden and fringe are carried
/// for cost audits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub burden_cost_per_hour: Decimal,
    pub fringe_per_hour: Decimal,
    pub sell_rate_per_hour: Decimal,
}

impl Rate {
    pub fn new(
        burden_cost_per_hour: Decimal,
        fringe_per_hour: Decimal,
        sell_rate_per_hour: Decimal,
    ) -> Self {
        Self { burden_cost_per_hour, fringe_per_hour, sell_rate_per_hour }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub category: TradeCategory,
    #[serde(flatten)]
    pub rate: Rate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateTable {
    entries: Vec<RateEntry>,
}

static STANDARD_RATES: OnceLock<RateTable> = OnceLock::new();

impl RateTable {
    /// Builds a table from explicit entries. A later entry for the same
    /// category replaces the earlier one.
    pub fn new(entries: impl IntoIterator<Item = (TradeCategory, Rate)>) -> Self {
        let mut table = Self { entries: Vec::new() };
        for (category, rate) in entries {
            match table.entries.iter_mut().find(|entry| entry.category == category) {
                Some(existing) => existing.rate = rate,
                None => table.entries.push(RateEntry { category, rate }),
            }
        }
        table
    }

    /// The master rate table, built on first use and shared for the life of
    /// the process.
    pub fn standard() -> &'static RateTable {
        STANDARD_RATES.get_or_init(|| {
            Self::new([
                (
                    TradeCategory::Regular,
                    Rate::new(Decimal::new(4000, 2), Decimal::new(0, 2), Decimal::new(5747, 2)),
                ),
                (
                    TradeCategory::Communication,
                    Rate::new(Decimal::new(7715, 2), Decimal::new(3200, 2), Decimal::new(11044, 2)),
                ),
                (
                    TradeCategory::Electrical,
                    Rate::new(Decimal::new(8913, 2), Decimal::new(3600, 2), Decimal::new(12753, 2)),
                ),
                (
                    TradeCategory::Plumbing,
                    Rate::new(Decimal::new(9384, 2), Decimal::new(3600, 2), Decimal::new(13425, 2)),
                ),
            ])
        })
    }

    pub fn lookup(&self, category: &str) -> Result<Rate, PricingError> {
        self.entries
            .iter()
            .find(|entry| entry.category.as_str() == category)
            .map(|entry| entry.rate)
            .ok_or_else(|| PricingError::UnsupportedCategory {
                category: category.to_string(),
                supported: self.categories().iter().map(ToString::to_string).collect(),
            })
    }

    pub fn categories(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.category.as_str()).collect()
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Rate, RateTable, TradeCategory};
    use crate::errors::PricingError;

    #[test]
    fn standard_table_carries_every_trade_in_fixed_order() {
        let table = RateTable::standard();

        assert_eq!(table.categories(), vec!["Regular", "Communication", "Electrical", "Plumbing"]);
        assert!(std::ptr::eq(table, RateTable::standard()));
    }

    #[test]
    fn lookup_returns_all_three_rates() {
        let rate = RateTable::standard().lookup("Electrical").expect("electrical is supported");

        assert_eq!(rate.burden_cost_per_hour, Decimal::new(8913, 2));
        assert_eq!(rate.fringe_per_hour, Decimal::new(36, 0));
        assert_eq!(rate.sell_rate_per_hour, Decimal::new(12753, 2));

        let plumbing = RateTable::standard().lookup("Plumbing").expect("plumbing is supported");
        assert_eq!(plumbing.sell_rate_per_hour, Decimal::new(13425, 2));
    }

    #[test]
    fn lookup_is_case_sensitive_and_lists_alternatives() {
        let error = RateTable::standard().lookup("electrical").expect_err("lowercase is rejected");

        assert_eq!(
            error,
            PricingError::UnsupportedCategory {
                category: "electrical".to_string(),
                supported: vec![
                    "Regular".to_string(),
                    "Communication".to_string(),
                    "Electrical".to_string(),
                    "Plumbing".to_string(),
                ],
            }
        );
        assert!(error.to_string().contains("Regular, Communication, Electrical, Plumbing"));
    }

    #[test]
    fn custom_table_only_supports_its_own_rows() {
        let table = RateTable::new([(
            TradeCategory::Regular,
            Rate::new(Decimal::ONE, Decimal::ZERO, Decimal::TEN),
        )]);

        assert!(table.lookup("Regular").is_ok());
        assert!(matches!(
            table.lookup("Plumbing"),
            Err(PricingError::UnsupportedCategory { ref supported, .. }) if supported == &vec!["Regular".to_string()]
        ));
    }

    #[test]
    fn category_parsing_round_trips_names() {
        for category in TradeCategory::ALL {
            assert_eq!(category.as_str().parse::<TradeCategory>(), Ok(category));
        }
        assert!("Nonexistent".parse::<TradeCategory>().is_err());
    }
}
