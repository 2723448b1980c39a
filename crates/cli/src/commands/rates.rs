use bidwright_core::{report::money, RateTable};

use crate::commands::{to_pretty_json, CommandResult};

pub fn run(json_output: bool) -> CommandResult {
    let table = RateTable::standard();
    if json_output {
        return to_pretty_json("rates", &table.entries());
    }

    let mut lines = vec![format!(
        "{:<14}  {:>10}  {:>10}  {:>10}",
        "Category", "Burden $/h", "Fringe $/h", "Sell $/h"
    )];
    for entry in table.entries() {
        lines.push(format!(
            "{:<14}  {:>10}  {:>10}  {:>10}",
            entry.category.as_str(),
            money(entry.rate.burden_cost_per_hour),
            money(entry.rate.fringe_per_hour),
            money(entry.rate.sell_rate_per_hour),
        ));
    }
    CommandResult::ok(lines.join("\n"))
}
