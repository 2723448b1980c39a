use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bid::LineItem;
use crate::errors::PricingError;
use crate::pricing::rates::{Rate, RateTable};

const MINUTES_PER_HOUR: u32 = 60;
const BID_TOTALS: &str = "bid totals";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub name: String,
    pub quantity: u32,
    pub labor_unit_sale: Decimal,
    pub labor_total_sale: Decimal,
    pub man_hours: Decimal,
    pub material_cost: Decimal,
    pub material_sale: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidSummary {
    pub lines: Vec<PricedLine>,
    pub labor: Decimal,
    pub material: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub bid_type: String,
    pub tax_percent: Decimal,
}

/// Cost / sale breakdown for one line item. Values are left unrounded.
pub fn price_line(item: &LineItem, rate: &Rate) -> Result<PricedLine, PricingError> {
    let quantity = Decimal::from(item.quantity);
    let line = item.name.as_str();

    let labor_unit_hours = Decimal::from(item.minutes_per_unit) / Decimal::from(MINUTES_PER_HOUR);
    let labor_unit_sale =
        checked(labor_unit_hours.checked_mul(rate.sell_rate_per_hour), line, "labor_unit_sale")?;
    let labor_total_sale =
        checked(labor_unit_sale.checked_mul(quantity), line, "labor_total_sale")?;

    let man_hours = checked(labor_unit_hours.checked_mul(quantity), line, "man_hours")?;

    let material_cost =
        checked(item.unit_material_cost.checked_mul(quantity), line, "material_cost")?;
    let material_sale_unit = checked(
        item.unit_material_cost.checked_mul(item.material_markup_factor),
        line,
        "material_sale",
    )?;
    let material_sale = checked(material_sale_unit.checked_mul(quantity), line, "material_sale")?;

    Ok(PricedLine {
        name: item.name.clone(),
        quantity: item.quantity,
        labor_unit_sale,
        labor_total_sale,
        man_hours,
        material_cost,
        material_sale,
    })
}

fn checked(value: Option<Decimal>, line: &str, field: &'static str) -> Result<Decimal, PricingError> {
    value.ok_or_else(|| PricingError::AmountOverflow { line: line.to_string(), field })
}

fn checked_sum<'a>(
    mut amounts: impl Iterator<Item = &'a Decimal>,
    field: &'static str,
) -> Result<Decimal, PricingError> {
    amounts.try_fold(Decimal::ZERO, |total, amount| {
        checked(total.checked_add(*amount), BID_TOTALS, field)
    })
}

/// Prices a bid against the standard rate table.
pub fn price_bid(
    items: &[LineItem],
    bid_type: &str,
    tax_percent: Decimal,
) -> Result<BidSummary, PricingError> {
    price_bid_with(RateTable::standard(), items, bid_type, tax_percent)
}

pub fn price_bid_with(
    rates: &RateTable,
    items: &[LineItem],
    bid_type: &str,
    tax_percent: Decimal,
) -> Result<BidSummary, PricingError> {
    let rate = rates.lookup(bid_type)?;
    if tax_percent < Decimal::ZERO {
        return Err(PricingError::InvalidTaxRate { tax_percent });
    }

    let lines = items.iter().map(|item| price_line(item, &rate)).collect::<Result<Vec<_>, _>>()?;

    let labor = checked_sum(lines.iter().map(|line| &line.labor_total_sale), "labor")?;
    let material = checked_sum(lines.iter().map(|line| &line.material_sale), "material")?;
    // Tax is charged on material only.
    let tax = checked(material.checked_mul(tax_percent), BID_TOTALS, "tax")?;
    let total = checked(
        labor.checked_add(material).and_then(|subtotal| subtotal.checked_add(tax)),
        BID_TOTALS,
        "total",
    )?;

    Ok(BidSummary {
        lines,
        labor,
        material,
        tax,
        total,
        bid_type: bid_type.to_string(),
        tax_percent,
    })
}
