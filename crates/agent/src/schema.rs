use bidwright_core::TradeCategory;
use serde_json::{json, Value};

use crate::llm::FunctionSpec;

pub const SUBMIT_FUNCTION_NAME: &str = "submit_bid_input";

/// JSON schema of `BidInput` as advertised to the model.
pub fn bid_input_schema() -> Value {
    json!({
        "type": "object",
        "title": "BidInput",
        "description": "Complete bid request parsed from user text.",
        "required": ["bid_type", "tax_percent", "items"],
        "properties": {
            "bid_type": {
                "type": "string",
                "enum": TradeCategory::names(),
                "description": "Trade category that sets the labor sell rate."
            },
            "tax_percent": {
                "type": "number",
                "minimum": 0,
                "description": "Tax rate as a fraction, e.g. 0.07 for 7%. Applied to material only."
            },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "title": "LineItem",
                    "description": "Single material / labor line item.",
                    "required": ["name", "quantity", "unit_material_cost", "minutes_per_unit"],
                    "properties": {
                        "name": {"type": "string", "minLength": 1},
                        "quantity": {"type": "integer", "minimum": 1},
                        "unit_material_cost": {"type": "number", "minimum": 0},
                        "minutes_per_unit": {"type": "integer", "minimum": 1},
                        "material_markup_factor": {
                            "type": "number",
                            "exclusiveMinimum": 0,
                            "default": 1.2,
                            "description": "Material markup factor"
                        }
                    }
                }
            }
        }
    })
}

pub fn submit_function() -> FunctionSpec {
    FunctionSpec {
        name: SUBMIT_FUNCTION_NAME.to_string(),
        description: "Structured bid data extracted from user text.".to_string(),
        parameters: bid_input_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::{bid_input_schema, submit_function, SUBMIT_FUNCTION_NAME};

    #[test]
    fn schema_enumerates_supported_categories() {
        let schema = bid_input_schema();

        assert_eq!(
            schema["properties"]["bid_type"]["enum"],
            serde_json::json!(["Regular", "Communication", "Electrical", "Plumbing"])
        );
        assert_eq!(schema["properties"]["items"]["items"]["properties"]["quantity"]["minimum"], 1);
    }

    #[test]
    fn submit_function_wraps_the_schema() {
        let function = submit_function();

        assert_eq!(function.name, SUBMIT_FUNCTION_NAME);
        assert_eq!(function.parameters, bid_input_schema());
    }
}
