//! Command submission: the single entry point for running code on the cluster.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{
    connection::ConnectionInfo,
    context::{ContextRegistry, Language},
    error::{Error, Result},
    poller::Poller,
    transport::{self, Transport},
};

/// Everything needed to poll one submitted command. Only valid while the
/// owning context is live.
#[derive(Debug, Clone)]
pub struct CommandHandle {
    pub query: Url,
    pub language: Language,
    pub context_id: String,
    pub command_id: String,
}

#[derive(Debug, Deserialize)]
struct CommandSubmitted {
    id: String,
}

#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    registry: Arc<ContextRegistry>,
    poll_interval: Duration,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<ContextRegistry>) -> Self {
        Self {
            transport,
            registry,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Run `command` in the `language` context and wait for its result.
    pub async fn execute(
        &self,
        conn: &ConnectionInfo,
        command: &str,
        language: Language,
    ) -> Result<Value> {
        let handle = self.submit(conn, command, language).await?;
        self.wait(conn, &handle).await
    }

    pub async fn submit(
        &self,
        conn: &ConnectionInfo,
        command: &str,
        language: Language,
    ) -> Result<CommandHandle> {
        let context_id = self
            .registry
            .ensure(self.transport.as_ref(), conn, language)
            .await?;

        let url = conn.endpoint("/api/1.2/commands/execute")?;
        let body = json!({
            "language": language,
            "clusterId": conn.cluster_id,
            "contextId": context_id,
            "command": command,
        });
        let text =
            transport::post_body(self.transport.as_ref(), url, &conn.access_token, &body).await?;
        let submitted: CommandSubmitted = transport::decode(&text)?;
        tracing::debug!(%language, %context_id, command_id = %submitted.id, "submitted command");

        let query = conn.endpoint_with_params(
            "/api/1.2/commands/status",
            [
                ("clusterId", conn.cluster_id.as_str()),
                ("contextId", context_id.as_str()),
                ("commandId", submitted.id.as_str()),
            ],
        )?;
        Ok(CommandHandle {
            query,
            language,
            context_id,
            command_id: submitted.id,
        })
    }

    pub async fn wait(&self, conn: &ConnectionInfo, handle: &CommandHandle) -> Result<Value> {
        Poller::new(self.transport.as_ref(), &self.registry, self.poll_interval)
            .wait(conn, handle)
            .await
    }

    pub async fn destroy_active_contexts(&self) -> Vec<Error> {
        self.registry.destroy_all(self.transport.as_ref()).await
    }
}
