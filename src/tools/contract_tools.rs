//! Stacks smart-contract lookups through the Hiro API.
//!
//! Both tools take `contract_address` and `contract_name`, or a single
//! `"address.name"` string.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::base_tool::{string_arg, BaseTool};
use crate::utilities::errors::ToolError;

/// Default Hiro API endpoint.
pub const HIRO_BASE_URL: &str = "https://api.hiro.so";

/// Which contract resource to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractResource {
    Source,
    Interface,
}

impl ContractResource {
    fn path_segment(self) -> &'static str {
        match self {
            ContractResource::Source => "source",
            ContractResource::Interface => "interface",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ContractResource::Source => "Source",
            ContractResource::Interface => "Interface",
        }
    }
}

/// Fetches one contract resource.
#[derive(Debug, Clone)]
pub struct ContractFetchTool {
    resource: ContractResource,
    base_url: String,
    client: reqwest::Client,
}

impl ContractFetchTool {
    pub fn new(resource: ContractResource, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            resource,
            base_url: base_url
                .unwrap_or_else(|| HIRO_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }

    /// `fetch_contract_code` tool.
    pub fn contract_code() -> Self {
        Self::new(ContractResource::Source, None)
    }

    /// `fetch_interface_data` tool.
    pub fn interface_data() -> Self {
        Self::new(ContractResource::Interface, None)
    }

    fn contract_id(args: &Value) -> Result<(String, String), ToolError> {
        let address = args.get("contract_address").and_then(Value::as_str);
        let name = args.get("contract_name").and_then(Value::as_str);
        if let (Some(address), Some(name)) = (address, name) {
            return Ok((address.trim().to_string(), name.trim().to_string()));
        }

        string_arg(args, "contract_id")
            .and_then(|id| {
                id.trim()
                    .split_once('.')
                    .map(|(a, n)| (a.to_string(), n.to_string()))
            })
            .filter(|(a, n)| !a.is_empty() && !n.is_empty())
            .ok_or_else(|| {
                ToolError::InvalidArguments(
                    "expected contract_address and contract_name, or \"address.name\"".to_string(),
                )
            })
    }
}

#[async_trait]
impl BaseTool for ContractFetchTool {
    fn name(&self) -> &str {
        match self.resource {
            ContractResource::Source => "fetch_contract_code",
            ContractResource::Interface => "fetch_interface_data",
        }
    }

    fn description(&self) -> &str {
        match self.resource {
            ContractResource::Source => "Fetches the contract code for a given address and name.",
            ContractResource::Interface => {
                "Fetches the interface data for a given contract address and name."
            }
        }
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_address": {"type": "string"},
                "contract_name": {"type": "string"}
            },
            "required": ["contract_address", "contract_name"]
        })
    }

    async fn run(&self, args: Value) -> Result<String, ToolError> {
        let (address, name) = Self::contract_id(&args)?;
        let url = format!(
            "{}/v2/contracts/{}/{}/{}",
            self.base_url,
            self.resource.path_segment(),
            address,
            name
        );
        log::debug!("{}: GET {}", self.name(), url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(format!(
                "Failed to fetch {} data: {}",
                self.resource.path_segment(),
                status.as_u16()
            ));
        }
        let body: Value = response.json().await?;
        Ok(format!("{} Data: {}", self.resource.title(), body))
    }
}
