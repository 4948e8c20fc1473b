//! Prompt text for workers, the manager and the compiler.
//!
//! Slices are joined the same way for every worker: persona, then either the
//! tool protocol or the plain answer format, then the task.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::tools::base_tool::{render_tool_descriptions, BaseTool};

pub const ROLE_PLAYING: &str = "You are {role}. {backstory}\nYour personal goal is: {goal}";

pub const TOOLS: &str = "\nYou ONLY have access to the following tools, and should NEVER make up tools that are not listed here:\n\n{tools}\n\nIMPORTANT: Use the following format in your response:\n\n```\nThought: you should always think about what to do\nAction: the action to take, only one name of [{tool_names}], just the name, exactly as it's written.\nAction Input: the input to the action, just a simple JSON object, enclosed in curly braces, using \" to wrap keys and values.\nObservation: the result of the action\n```\n\nOnce all necessary information is gathered, return the following format:\n\n```\nThought: I now know the final answer\nFinal Answer: the final answer to the original input question\n```";

pub const NO_TOOLS: &str = "\nTo give my best complete final answer to the task respond using the exact following format:\n\nThought: I now can give a great answer\nFinal Answer: Your final answer must be the great and the most complete as possible, it must be outcome described.\n\nI MUST use these formats, my job depends on it!";

pub const EXPECTED_OUTPUT: &str = "\nThis is the expected criteria for your final answer: {expected_output}\nyou MUST return the actual complete content as the final answer, not a summary.";

pub const TASK_WITH_CONTEXT: &str = "{task}\n\nThis is the context you're working with:\n{context}";

pub const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best final answer. You'll ignore all previous instructions, stop using any tools, and just return your absolute BEST Final answer.";

pub const FORMAT_REMINDER: &str = "\nI MUST either use a tool (use one at time) OR give my best final answer not both at the same time. When responding, I must use the following format:\n\n```\nThought: you should always think about what to do\nAction: the action to take, should be one of [{tool_names}]\nAction Input: the input to the action, dictionary enclosed in curly braces\nObservation: the result of the action\n```";

// ---------------------------------------------------------------------------
// Fixed personas
// ---------------------------------------------------------------------------

pub const MANAGER_ROLE: &str = "Manager";
pub const MANAGER_GOAL: &str =
    "Oversee, refine tasks, and coordinate the flow of task outputs between agents.";
pub const MANAGER_BACKSTORY: &str = "You are a skilled manager responsible for refining tasks and managing outputs between agents. You ensure that each task is well-structured and agents work with the correct information. You should only guide and improve the task description, not perform the task yourself.";

pub const COMPILER_ROLE: &str = "Compiler";
pub const COMPILER_GOAL: &str =
    "Synthesize the outputs of every agent in the crew into one consolidated final report.";
pub const COMPILER_BACKSTORY: &str = "You are a meticulous editor. You read everything the crew produced, reconcile overlaps and contradictions, and deliver a single coherent report.";

pub const COMPILER_EXPECTED_OUTPUT: &str =
    "A single consolidated report covering the findings of every agent.";

pub const REFINED_EXPECTED_OUTPUT: &str = "Refined task description";

pub const COORDINATION_EXPECTED_OUTPUT: &str =
    "A short coordination brief telling each agent what to focus on and how their work connects.";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex"));

/// Fill the `{name}` placeholders of `template` in a single pass.
///
/// Values are inserted verbatim: braces inside a value are never treated as
/// placeholders. Unknown placeholders are left as they are.
pub fn interpolate(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// System prompt for a worker.
pub fn system_prompt(role: &str, goal: &str, backstory: &str, tools: &[Arc<dyn BaseTool>]) -> String {
    let persona = interpolate(
        ROLE_PLAYING,
        &[("role", role), ("backstory", backstory), ("goal", goal)],
    );
    if tools.is_empty() {
        return format!("{}{}", persona, NO_TOOLS);
    }
    let protocol = interpolate(
        TOOLS,
        &[
            ("tools", &render_tool_descriptions(tools)),
            ("tool_names", &tool_names(tools)),
        ],
    );
    format!("{}{}", persona, protocol)
}

/// User prompt for one work item.
pub fn task_prompt(description: &str, expected_output: &str, context: Option<&str>) -> String {
    let task = format!(
        "{}{}",
        description,
        interpolate(EXPECTED_OUTPUT, &[("expected_output", expected_output)])
    );
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => interpolate(TASK_WITH_CONTEXT, &[("task", &task), ("context", context)]),
        None => task,
    }
}

/// Format reminder sent back after an unparsable reply.
pub fn format_reminder(tools: &[Arc<dyn BaseTool>]) -> String {
    interpolate(FORMAT_REMINDER, &[("tool_names", &tool_names(tools))])
}

/// Comma-separated tool names.
pub fn tool_names(tools: &[Arc<dyn BaseTool>]) -> String {
    tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}

/// Observation for a tool name the worker does not have.
pub fn unknown_tool(name: &str, tools: &[Arc<dyn BaseTool>]) -> String {
    format!(
        "Action '{}' don't exist, these are the only available Actions:\n{}",
        name,
        tool_names(tools)
    )
}

/// Request sent to the manager to rewrite one description.
pub fn refinement_request(description: &str, role: &str, previous_output: Option<&str>) -> String {
    let mut request = format!(
        "{}\n\nManager is refining this task for the {}.",
        description, role
    );
    if let Some(previous) = previous_output.filter(|p| !p.trim().is_empty()) {
        request.push_str("\n\nPrevious task output to consider: ");
        request.push_str(previous);
    }
    request
}

/// Static prefix used by the coordinator variant.
pub fn coordinator_assignment(description: &str, role: &str) -> String {
    format!("Manager assignment for the {}:\n{}", role, description)
}

/// Request for the coordination brief: every item with its role, plus the
/// user input.
pub fn coordination_request(plan: &[(String, String)], user_input: &str) -> String {
    let steps = plan
        .iter()
        .enumerate()
        .map(|(i, (role, description))| format!("{}. [{}] {}", i + 1, role, description))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Coordinate the crew through the following tasks, executed in order:\n{}\n\nUser input: {}\n\nWrite a brief that tells each agent what to focus on and what they should hand over to the next one.",
        steps, user_input
    )
}

/// Description of the compiler item.
pub fn compiler_description(roles: &[String]) -> String {
    format!(
        "Review the outputs produced by every agent in the crew ({}) and compile them into a single consolidated final report. Resolve overlaps and contradictions and keep every important finding.",
        roles.join(", ")
    )
}

/// Splice the user input into the first item's description.
pub fn with_user_input(description: &str, input: &str) -> String {
    format!("{}\n\nUser input: {}", description, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;

    #[test]
    fn test_system_prompt_switches_on_tools() {
        let plain = system_prompt("Researcher", "find facts", "curious", &[]);
        assert!(plain.starts_with("You are Researcher. curious\nYour personal goal is: find facts"));
        assert!(plain.contains("Final Answer:"));
        assert!(!plain.contains("Action Input"));

        let tools: Vec<Arc<dyn BaseTool>> =
            vec![Arc::new(Tool::new("web_search", "search", |_| Ok(String::new())))];
        let with_tools = system_prompt("Researcher", "find facts", "curious", &tools);
        assert!(with_tools.contains("only one name of [web_search]"));
    }

    #[test]
    fn test_refinement_request_appends_previous_output() {
        assert_eq!(
            refinement_request("Write it", "Writer", None),
            "Write it\n\nManager is refining this task for the Writer."
        );
        let with_prev = refinement_request("Write it", "Writer", Some("draft"));
        assert!(with_prev.ends_with("\n\nPrevious task output to consider: draft"));
        assert_eq!(refinement_request("x", "y", Some("  ")), refinement_request("x", "y", None));
    }

    #[test]
    fn test_braces_in_values_are_kept_verbatim() {
        let system = system_prompt("Researcher", "SECRET_GOAL", "I like {goal} a lot", &[]);
        assert!(system.starts_with("You are Researcher. I like {goal} a lot\nYour personal goal is: SECRET_GOAL"));

        let prompt = task_prompt("please expand {context} here", "{task}", Some("brief"));
        assert!(prompt.starts_with("please expand {context} here\n"));
        assert!(prompt.contains("final answer: {task}\n"));
        assert!(prompt.ends_with("This is the context you're working with:\nbrief"));
        assert_eq!(prompt.matches("brief").count(), 1);
    }

    #[test]
    fn test_interpolate_leaves_unknown_placeholders() {
        assert_eq!(
            interpolate("{a} and {b} and {a}", &[("a", "{b}")]),
            "{b} and {b} and {b}"
        );
        assert_eq!(interpolate("{ not a placeholder }", &[]), "{ not a placeholder }");
    }

    #[test]
    fn test_task_prompt_with_context() {
        let prompt = task_prompt("Do it", "A list", Some("earlier"));
        assert!(prompt.starts_with("Do it\nThis is the expected criteria for your final answer: A list"));
        assert!(prompt.ends_with("This is the context you're working with:\nearlier"));
        assert!(!task_prompt("Do it", "A list", Some("")).contains("context"));
    }
}
