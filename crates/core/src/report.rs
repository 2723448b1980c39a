//! Human-readable renderings of a [`BidSummary`].
//!
//! Rounding here is for display only; callers that need the engine values use
//! the summary directly.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::pricing::engine::BidSummary;

const HEADERS: [&str; 6] =
    ["Line Item", "Qty", "Labor $/u", "Labor Total", "Material Total", "M-Hrs"];

pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn rows(summary: &BidSummary) -> Vec<[String; 6]> {
    let mut rows = summary
        .lines
        .iter()
        .map(|line| {
            [
                line.name.clone(),
                line.quantity.to_string(),
                money(line.labor_unit_sale),
                money(line.labor_total_sale),
                money(line.material_sale),
                money(line.man_hours),
            ]
        })
        .collect::<Vec<_>>();

    rows.push([
        "Totals".to_string(),
        String::new(),
        String::new(),
        money(summary.labor),
        money(summary.material),
        String::new(),
    ]);
    rows.push([
        "Tax".to_string(),
        String::new(),
        String::new(),
        String::new(),
        money(summary.tax),
        String::new(),
    ]);
    rows.push([
        "Grand Total".to_string(),
        String::new(),
        String::new(),
        money(summary.total),
        String::new(),
        String::new(),
    ]);
    rows
}

pub fn render_text_table(summary: &BidSummary) -> String {
    let rows = rows(summary);
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(column, (cell, &width))| {
                if column == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header = HEADERS.map(str::to_string);
    let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("  ");
    let total_rows = rows.len();

    let mut lines =
        vec![format!("Bid Summary - {}", summary.bid_type), render_row(&header[..]), rule.clone()];
    for (index, row) in rows.iter().enumerate() {
        if index == total_rows - 3 {
            lines.push(rule.clone());
        }
        lines.push(render_row(&row[..]));
    }

    lines.join("\n")
}

pub fn render_markdown_table(summary: &BidSummary) -> String {
    let mut lines = vec![
        format!("**Bid Summary - {}**", summary.bid_type),
        String::new(),
        format!("| {} |", HEADERS.join(" | ")),
        "|---|---:|---:|---:|---:|---:|".to_string(),
    ];

    let rows = rows(summary);
    let line_count = summary.lines.len();
    for (index, row) in rows.iter().enumerate() {
        let cells = if index < line_count {
            row.clone()
        } else {
            row.clone().map(|cell| if cell.is_empty() { cell } else { format!("**{cell}**") })
        };
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}
