use anyhow::Result;

use super::Command;
use crate::config::config;
use crate::server;

pub struct ServeCommand {
    pub bind: Option<String>,
}

impl ServeCommand {
    pub fn new(bind: Option<String>) -> Self {
        Self { bind }
    }
}

impl Command for ServeCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let bind = self
            .bind
            .clone()
            .unwrap_or_else(|| config.server.bind_address.clone());

        println!("🌐 Starting OmniLens API on {bind}");
        server::serve(config, &bind).await
    }
}
