use bidwright_core::{report, BidInput, DeterministicPricingEngine, PricingEngine};

use crate::commands::{read_source, to_pretty_json, CommandResult, EXIT_INVALID_INPUT};

const COMMAND: &str = "price";

pub fn run(input: &str, json_output: bool) -> CommandResult {
    match read_source(input) {
        Ok(raw) => run_with_source(&raw, json_output),
        Err(error) => CommandResult::failure(
            COMMAND,
            "input_read",
            format!("could not read bid input `{input}`: {error}"),
            EXIT_INVALID_INPUT,
        ),
    }
}

pub fn run_with_source(raw: &str, json_output: bool) -> CommandResult {
    let bid: BidInput = match serde_json::from_str(raw) {
        Ok(bid) => bid,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "input_decode",
                format!("bid input is not valid JSON for the BidInput schema: {error}"),
                EXIT_INVALID_INPUT,
            );
        }
    };

    // Category and tax rate are the engine's own contract; the remaining
    // schema rules are enforced here before anything is printed.
    let summary = match DeterministicPricingEngine::default().price(&bid) {
        Ok(summary) => summary,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };
    if let Err(error) = bid.validate() {
        return CommandResult::from_application(COMMAND, error.into());
    }

    if json_output {
        return to_pretty_json(COMMAND, &summary);
    }
    CommandResult::ok(report::render_text_table(&summary))
}
