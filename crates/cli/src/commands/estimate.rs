use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use bidwright_agent::{BidExtractor, OpenAiCompatibleClient};
use bidwright_core::config::{AppConfig, LoadOptions};
use bidwright_core::{
    logging, report, ApplicationError, BidInput, BidSummary, DeterministicPricingEngine,
    PricingEngine,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{to_pretty_json, CommandResult, EXIT_EMPTY_INPUT, EXIT_INVALID_INPUT};

const COMMAND: &str = "estimate";

#[derive(Debug, Serialize)]
struct EstimateOutput<'a> {
    input: &'a BidInput,
    summary: &'a BidSummary,
}

pub fn run(file: Option<&Path>, json_output: bool) -> CommandResult {
    let text = match read_description(file) {
        Ok(text) => text,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "input_read",
                format!("could not read project description: {error}"),
                EXIT_INVALID_INPUT,
            );
        }
    };
    if text.trim().is_empty() {
        return CommandResult::failure(
            COMMAND,
            "empty_input",
            "No input provided.",
            EXIT_EMPTY_INPUT,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::from_application(
                COMMAND,
                ApplicationError::Configuration(error.to_string()),
            );
        }
    };
    logging::init(&config.logging);

    let client = match OpenAiCompatibleClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::from_application(
                COMMAND,
                ApplicationError::Configuration(format!("{error:#}")),
            );
        }
    };
    info!(
        event_name = "cli.estimate.start",
        model = %client.model(),
        max_attempts = config.llm.max_retries,
        "extracting bid from description"
    );

    let extractor = BidExtractor::new(Arc::new(client), config.llm.max_retries);
    run_with_extractor(&extractor, &text, json_output)
}

/// Extracts and prices `text` with an already-built extractor.
pub fn run_with_extractor(
    extractor: &BidExtractor,
    text: &str,
    json_output: bool,
) -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let bid = match runtime.block_on(extractor.extract(text)) {
        Ok(bid) => bid,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };

    let summary = match DeterministicPricingEngine::default().price(&bid) {
        Ok(summary) => summary,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };

    if json_output {
        return to_pretty_json(COMMAND, &EstimateOutput { input: &bid, summary: &summary });
    }

    let extracted = serde_json::to_string_pretty(&bid).unwrap_or_else(|_| format!("{bid:?}"));
    CommandResult::ok(format!(
        "Extraction successful\n{extracted}\n\n{}",
        report::render_text_table(&summary)
    ))
}

fn read_description(file: Option<&Path>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => read_until_blank_line(io::stdin().lock()),
    }
}

/// Collects lines until the first blank line or EOF.
pub fn read_until_blank_line(reader: impl BufRead) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::read_until_blank_line;

    #[test]
    fn stdin_reading_stops_at_the_first_blank_line() {
        let text = read_until_blank_line(Cursor::new("10 outlets\nelectrical\n\nignored\n"))
            .expect("cursor reads");

        assert_eq!(text, "10 outlets\nelectrical");
    }

    #[test]
    fn stdin_reading_accepts_eof_without_blank_line() {
        let text = read_until_blank_line(Cursor::new("one line")).expect("cursor reads");

        assert_eq!(text, "one line");
    }
}
