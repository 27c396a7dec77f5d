//! Adapter for agent frameworks that expect "list tools" and "call tool" hooks.

use pocket_types::ToolSchema;
use serde_json::Value;

use crate::client::PocketClient;
use crate::error::Result;

/// Borrows a [`PocketClient`] and exposes its tools in framework form
#[derive(Debug)]
pub struct ToolAdapter<'a> {
    client: &'a mut PocketClient,
}

impl<'a> ToolAdapter<'a> {
    #[must_use]
    pub fn new(client: &'a mut PocketClient) -> Self {
        Self { client }
    }

    /// Tool catalogue with descriptions and input schemas always present.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`PocketClient::list_tools`].
    pub async fn tool_schemas(&mut self) -> Result<Vec<ToolSchema>> {
        Ok(self
            .client
            .list_tools()
            .await?
            .into_iter()
            .map(ToolSchema::from)
            .collect())
    }

    /// # Errors
    ///
    /// Same failure modes as [`PocketClient::call_tool`].
    pub async fn call(&mut self, name: &str, arguments: Option<Value>) -> Result<Value> {
        self.client.call_tool(name, arguments).await
    }
}
