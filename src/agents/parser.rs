//! Parsing of ReAct-style worker responses.
//!
//! A response either asks for a tool (`Action:` / `Action Input:`) or ends
//! the loop (`Final Answer:`). Anything else is a format error that the
//! executor feeds back to the model.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// The text prefix for a final answer.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

const MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE: &str =
    "I just got this: I couldn't find an Action after the Thought.";

const MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE: &str =
    "I just got this: I found an Action but couldn't find a valid Action Input right after it.";

static ACTION_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.+?)\s*(?:\n|\r\n?)Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .expect("Invalid regex")
});
static ACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Action\s*\d*\s*:").expect("Invalid regex"));
static ACTION_INPUT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").expect("Invalid regex"));

/// A tool call requested by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    /// The worker's reasoning before the action.
    pub thought: String,
    /// Name of the tool to use.
    pub tool: String,
    /// Raw input for the tool.
    pub tool_input: String,
    /// The raw text that was parsed.
    pub text: String,
}

impl AgentAction {
    /// Tool input as JSON. Non-JSON input is wrapped as `{"input": ...}`.
    pub fn arguments(&self) -> Value {
        match serde_json::from_str::<Value>(&self.tool_input) {
            Ok(value @ Value::Object(_)) => value,
            _ => serde_json::json!({ "input": self.tool_input }),
        }
    }
}

/// The worker's final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFinish {
    pub thought: String,
    pub output: String,
    pub text: String,
}

/// Raised when a response matches neither format.
#[derive(Debug, Clone)]
pub struct OutputParserError {
    pub error: String,
}

impl OutputParserError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl fmt::Display for OutputParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputParserError: {}", self.error)
    }
}

impl std::error::Error for OutputParserError {}

/// Result of parsing a worker response.
#[derive(Debug, Clone)]
pub enum ParseResult {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// Parse worker output into an action or a final answer.
///
/// **Action format**:
/// ```text
/// Thought: I should look this up
/// Action: web_search
/// Action Input: {"search_query": "stacks nakamoto"}
/// ```
///
/// **Final answer format**:
/// ```text
/// Thought: I know enough
/// Final Answer: Nakamoto ships fast blocks.
/// ```
///
/// When both appear, the final answer wins.
pub fn parse(text: &str) -> Result<ParseResult, OutputParserError> {
    let thought = extract_thought(text);

    if text.contains(FINAL_ANSWER_ACTION) {
        return Ok(ParseResult::Finish(AgentFinish {
            thought,
            output: final_answer_text(text),
            text: text.to_string(),
        }));
    }

    if let Some(caps) = ACTION_INPUT_RE.captures(text) {
        let action = caps.get(1).map_or("", |m| m.as_str());
        let action_input = caps.get(2).map_or("", |m| m.as_str());
        // Models sometimes hallucinate the observation themselves.
        let action_input = action_input
            .split("\nObservation")
            .next()
            .unwrap_or_default()
            .trim();
        let tool_input = action_input.trim_matches('"');

        return Ok(ParseResult::Action(AgentAction {
            thought,
            tool: clean_action(action),
            tool_input: safe_repair_json(tool_input),
            text: text.to_string(),
        }));
    }

    if !ACTION_RE.is_match(text) {
        return Err(OutputParserError::new(format!(
            "{}\nYou MUST use the following format:\n\
             Thought: [your thought]\n\
             Final Answer: [your final answer]",
            MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE
        )));
    }

    if !ACTION_INPUT_ONLY_RE.is_match(text) {
        return Err(OutputParserError::new(
            MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE,
        ));
    }

    Err(OutputParserError::new(
        "Could not parse the output. Please use the correct format.",
    ))
}

/// Text after the last `Final Answer:`, or the whole response trimmed when
/// the marker is absent.
pub fn final_answer_text(text: &str) -> String {
    let answer = text.rsplit(FINAL_ANSWER_ACTION).next().unwrap_or(text).trim();
    clean_trailing_backticks(answer)
}

fn extract_thought(text: &str) -> String {
    let thought_index = text.find("\nAction").or_else(|| text.find("\nFinal Answer"));
    match thought_index {
        Some(idx) => text[..idx].replace("```", "").trim().to_string(),
        None => String::new(),
    }
}

fn clean_action(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}

fn clean_trailing_backticks(text: &str) -> String {
    let mut result = text.to_string();
    // An odd count means an unmatched trailing fence.
    if result.ends_with("```") && result.matches("```").count() % 2 != 0 {
        result.truncate(result.len() - 3);
        result = result.trim_end().to_string();
    }
    result
}

/// Replace triple quotes when that makes the input valid JSON.
fn safe_repair_json(tool_input: &str) -> String {
    if tool_input.starts_with('[') && tool_input.ends_with(']') {
        return tool_input.to_string();
    }
    let cleaned = tool_input.replace("\"\"\"", "\"");
    if serde_json::from_str::<Value>(&cleaned).is_ok() {
        return cleaned;
    }
    tool_input.to_string()
}
