use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use anyhow::{Result, anyhow};

/// Wire shape the agent expects: `{"message":{"text":"<command>"}}`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub message: MessageBody,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    pub text: String,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            message: MessageBody { text: text.into() },
        }
    }
}

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    endpoint: String,
}

impl AgentClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// POST one command to the agent and reduce the reply to display text.
    /// A string `text` field is shown verbatim; anything else is shown as
    /// pretty-printed JSON.
    pub async fn send(&self, command: &str) -> Result<String> {
        let payload = OutboundMessage::new(command);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Agent request failed with status: {}",
                response.status()
            ));
        }

        let body: Value = response.json().await?;
        match body.get("text").and_then(Value::as_str) {
            Some(text) => Ok(text.to_string()),
            None => Ok(serde_json::to_string_pretty(&body)?),
        }
    }
}
