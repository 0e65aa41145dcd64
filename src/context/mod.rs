//! Remote execution contexts and the registry that caches them.
//!
//! A context is a language-scoped interpreter session on the cluster. The
//! registry keeps at most one live context per [`Language`] and must be
//! drained with [`ContextRegistry::destroy_all`] before the process exits,
//! otherwise the remote sessions leak.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    connection::ConnectionInfo,
    error::{Error, Result},
    transport::{self, Transport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Scala,
    Sql,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Scala => "scala",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub id: String,
    pub language: Language,
    pub connection: ConnectionInfo,
}

#[derive(Debug, Deserialize)]
struct ContextCreated {
    id: String,
}

#[derive(Debug, Default)]
pub struct ContextRegistry {
    active: Mutex<HashMap<Language, ExecutionContext>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the live context for `language`, creating one if needed.
    ///
    /// The lock is held across the create call, so concurrent callers on the
    /// same language share one remote context.
    pub async fn ensure(
        &self,
        transport: &dyn Transport,
        conn: &ConnectionInfo,
        language: Language,
    ) -> Result<String> {
        let mut active = self.active.lock().await;
        if let Some(ctx) = active.get(&language) {
            return Ok(ctx.id.clone());
        }

        let url = conn.endpoint("/api/1.2/contexts/create")?;
        let body = json!({
            "language": language,
            "clusterId": conn.cluster_id,
        });
        let text = transport::post_body(transport, url, &conn.access_token, &body).await?;
        let created: ContextCreated = transport::decode(&text)?;
        tracing::debug!(%language, context_id = %created.id, "created execution context");

        active.insert(
            language,
            ExecutionContext {
                id: created.id.clone(),
                language,
                connection: conn.clone(),
            },
        );
        Ok(created.id)
    }

    /// Best-effort remote teardown. The cached entry is dropped even when the
    /// remote call fails; the failure is still returned.
    pub async fn destroy(
        &self,
        transport: &dyn Transport,
        conn: &ConnectionInfo,
        context_id: &str,
    ) -> Result<()> {
        self.active.lock().await.retain(|_, ctx| ctx.id != context_id);
        destroy_remote(transport, conn, context_id).await
    }

    /// Destroy every cached context. The registry is empty afterwards; the
    /// failures of individual destroy calls are returned.
    pub async fn destroy_all(&self, transport: &dyn Transport) -> Vec<Error> {
        let drained: Vec<ExecutionContext> = {
            let mut active = self.active.lock().await;
            active.drain().map(|(_, ctx)| ctx).collect()
        };

        let mut failures = Vec::new();
        for ctx in drained {
            if let Err(e) = destroy_remote(transport, &ctx.connection, &ctx.id).await {
                tracing::warn!(language = %ctx.language, context_id = %ctx.id, error = %e, "failed to destroy context");
                failures.push(e);
            }
        }
        failures
    }

    pub async fn is_live(&self, language: Language, context_id: &str) -> bool {
        self.active
            .lock()
            .await
            .get(&language)
            .is_some_and(|ctx| ctx.id == context_id)
    }

    pub async fn context_id(&self, language: Language) -> Option<String> {
        self.active.lock().await.get(&language).map(|ctx| ctx.id.clone())
    }

    pub async fn len(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.active.lock().await.is_empty()
    }
}

async fn destroy_remote(
    transport: &dyn Transport,
    conn: &ConnectionInfo,
    context_id: &str,
) -> Result<()> {
    let url = conn.endpoint("/api/1.2/contexts/destroy")?;
    let body = json!({
        "contextId": context_id,
        "clusterId": conn.cluster_id,
    });
    let text = transport::post_body(transport, url, &conn.access_token, &body).await?;
    if !text.trim().is_empty() {
        transport::decode::<Value>(&text)?;
    }
    tracing::debug!(context_id, "destroyed execution context");
    Ok(())
}
