//! Agent executor for crew workers.
//!
//! Drives one task execution: prompt formatting, LLM calls, tool execution
//! and memory. The loop follows the ReAct text protocol parsed by
//! [`parser`](super::parser).

use std::fmt;

use crate::agent::core::Agent;
use crate::llms::base_llm::{LLMMessage, LLMResponse};
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::CrewError;
use crate::utilities::prompts;

use super::parser::{self, ParseResult};

/// Outcome of one task execution.
#[derive(Debug, Clone, Default)]
pub struct AgentExecution {
    /// Final answer text.
    pub output: String,
    /// Tools invoked during the execution, in call order.
    pub tools_used: Vec<String>,
    /// Usage of this execution only.
    pub usage: UsageMetrics,
    /// Number of LLM calls made.
    pub iterations: u32,
}

/// Executor for one task of one agent.
pub struct CrewAgentExecutor<'a> {
    agent: &'a Agent,
    /// User prompt for the task, context included.
    pub prompt: String,
    /// Conversation message history.
    pub messages: Vec<LLMMessage>,
    /// Current iteration count.
    pub iterations: u32,
    tools_used: Vec<String>,
    usage: UsageMetrics,
}

impl fmt::Debug for CrewAgentExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewAgentExecutor")
            .field("role", &self.agent.role)
            .field("max_iter", &self.agent.max_iter)
            .field("iterations", &self.iterations)
            .field("messages_count", &self.messages.len())
            .field("tools_count", &self.agent.tools.len())
            .finish()
    }
}

impl<'a> CrewAgentExecutor<'a> {
    pub fn new(agent: &'a Agent, prompt: String) -> Self {
        Self {
            agent,
            prompt,
            messages: Vec::new(),
            iterations: 0,
            tools_used: Vec::new(),
            usage: UsageMetrics::new(),
        }
    }

    /// Run the loop until a final answer is produced.
    pub async fn invoke(&mut self) -> Result<AgentExecution, CrewError> {
        let agent = self.agent;
        self.messages.push(LLMMessage::system(prompts::system_prompt(
            &agent.role,
            &agent.goal,
            &agent.backstory,
            &agent.tools,
        )));
        self.messages.extend(agent.memory_messages());
        self.messages.push(LLMMessage::user(self.prompt.clone()));

        let output = self.invoke_loop().await?;
        agent.remember(&self.prompt, &output);

        Ok(AgentExecution {
            output,
            tools_used: std::mem::take(&mut self.tools_used),
            usage: self.usage.clone(),
            iterations: self.iterations,
        })
    }

    async fn invoke_loop(&mut self) -> Result<String, CrewError> {
        let agent = self.agent;

        // Without tools there is nothing to loop over.
        if agent.tools.is_empty() {
            let response = self.call_llm().await?;
            return Ok(parser::final_answer_text(&response.content));
        }

        while self.iterations < agent.max_iter {
            let response = self.call_llm().await?;
            let text = response.content;

            match parser::parse(&text) {
                Ok(ParseResult::Finish(finish)) => return Ok(finish.output),
                Ok(ParseResult::Action(action)) => {
                    let observation = match agent.find_tool(&action.tool) {
                        Some(tool) => {
                            log::debug!("Agent '{}' using tool '{}'", agent.role, tool.name());
                            let result = tool.run(action.arguments()).await.map_err(|source| {
                                CrewError::CapabilityInvocation {
                                    capability: tool.name().to_string(),
                                    source,
                                }
                            })?;
                            self.tools_used.push(tool.name().to_string());
                            result
                        }
                        None => {
                            log::debug!(
                                "Agent '{}' asked for unknown tool '{}'",
                                agent.role,
                                action.tool
                            );
                            prompts::unknown_tool(&action.tool, &agent.tools)
                        }
                    };
                    self.messages.push(LLMMessage::assistant(text));
                    self.messages
                        .push(LLMMessage::user(format!("Observation: {}", observation)));
                }
                Err(e) => {
                    log::debug!("Agent '{}' output did not parse: {}", agent.role, e);
                    self.messages.push(LLMMessage::assistant(text));
                    self.messages.push(LLMMessage::user(format!(
                        "{}{}",
                        e.error,
                        prompts::format_reminder(&agent.tools)
                    )));
                }
            }
        }

        log::warn!(
            "Agent '{}' hit max_iter={}, forcing a final answer",
            agent.role,
            agent.max_iter
        );
        self.messages
            .push(LLMMessage::user(prompts::FORCE_FINAL_ANSWER));
        let response = self.call_llm().await?;
        Ok(parser::final_answer_text(&response.content))
    }

    async fn call_llm(&mut self) -> Result<LLMResponse, CrewError> {
        let agent = self.agent;
        self.iterations += 1;
        let response = agent
            .llm
            .call(self.messages.clone())
            .await
            .map_err(|source| CrewError::Execution {
                role: agent.role.clone(),
                source,
            })?;
        self.usage.add_usage_metrics(&response.usage);
        agent.record_usage(&response.usage);
        Ok(response)
    }
}
