//! Clarifying question tool
//!
//! The `ask_clarifying_question` tool maps a question type to a
//! natural-sounding question the assistant can put to the traveller when a
//! detail is missing. Keeping the phrasing here rather than in the model
//! keeps the voice consistent across providers.

use crate::error::Result;
use crate::tools::{Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};

const QUESTION_TYPES: [&str; 7] = [
    "budget",
    "group_size",
    "arrival_time",
    "departure_time",
    "dietary",
    "accessibility",
    "accommodation",
];

fn question_for(question_type: &str) -> &'static str {
    match question_type {
        "budget" => "What's your rough budget for this trip, so I can pick places that fit?",
        "group_size" => "How many people are travelling, and are any of them children?",
        "arrival_time" => "What time do you arrive on your first day?",
        "departure_time" => "What time do you leave on your last day?",
        "dietary" => "Do you have any dietary preferences or restrictions I should plan around?",
        "accessibility" => {
            "Are there any accessibility needs I should keep in mind when choosing places?"
        }
        "accommodation" => "Where are you staying, or which area are you considering?",
        _ => "Could you tell me a bit more about what you're looking for?",
    }
}

/// The `ask_clarifying_question` tool
pub struct AskClarifyingQuestionTool;

#[async_trait]
impl ToolExecutor for AskClarifyingQuestionTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "ask_clarifying_question".to_string(),
            description: "Ask the traveller one clarifying question when a detail needed for \
                          planning is missing. Use at most one per reply."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question_type": {
                        "type": "string",
                        "enum": QUESTION_TYPES,
                        "description": "Which missing detail to ask about"
                    },
                    "context": {
                        "type": "string",
                        "description": "Optional context to append to the question"
                    }
                },
                "required": ["question_type"]
            }),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult> {
        let question_type = args["question_type"].as_str().unwrap_or_default();
        let mut question = question_for(question_type).to_string();

        if let Some(context) = args["context"].as_str() {
            if !context.trim().is_empty() {
                question = format!("{} ({})", question, context.trim());
            }
        }

        Ok(ToolResult::ok(json!({"question": question})))
    }
}
