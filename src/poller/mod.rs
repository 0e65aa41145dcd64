//! Polls a submitted command until it reaches a terminal status.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    command::CommandHandle,
    connection::ConnectionInfo,
    context::ContextRegistry,
    error::{Error, Result},
    transport::{self, Transport},
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum CommandStatus {
    Queued,
    Running,
    Cancelling,
    Finished,
    Cancelled,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandResults {
    #[serde(rename = "resultType", default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub results: Option<CommandResults>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Pending,
    Done(Value),
}

/// One step of the status state machine.
pub fn interpret(resp: StatusResponse) -> Result<PollOutcome> {
    match resp.status {
        CommandStatus::Finished => match resp.results {
            Some(results) if results.result_type.as_deref() == Some("error") => {
                Err(Error::RemoteExecution { message: error_message(results) })
            }
            Some(results) => Ok(PollOutcome::Done(results.data)),
            // results not attached yet
            None => Ok(PollOutcome::Pending),
        },
        CommandStatus::Error => Err(Error::RemoteExecution {
            message: "Error during receiving command result".into(),
        }),
        CommandStatus::Cancelled => Err(Error::RemoteExecution {
            message: "Command was cancelled".into(),
        }),
        CommandStatus::Queued
        | CommandStatus::Running
        | CommandStatus::Cancelling
        | CommandStatus::Unknown => Ok(PollOutcome::Pending),
    }
}

// data when present, otherwise cause
fn error_message(results: CommandResults) -> String {
    match results.data {
        Value::String(s) if !s.is_empty() => s,
        Value::Null | Value::String(_) => results
            .cause
            .unwrap_or_else(|| "remote command failed without a cause".into()),
        other => other.to_string(),
    }
}

pub struct Poller<'a> {
    transport: &'a dyn Transport,
    registry: &'a ContextRegistry,
    interval: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(transport: &'a dyn Transport, registry: &'a ContextRegistry, interval: Duration) -> Self {
        Self { transport, registry, interval }
    }

    /// Poll until terminal. There is no attempt cap; wrap the call in
    /// [`crate::guard::with_deadline`] to bound it.
    pub async fn wait(&self, conn: &ConnectionInfo, handle: &CommandHandle) -> Result<Value> {
        let mut attempts: u64 = 0;
        loop {
            if !self.registry.is_live(handle.language, &handle.context_id).await {
                return Err(Error::ContextDestroyed {
                    language: handle.language,
                    context_id: handle.context_id.clone(),
                });
            }

            attempts += 1;
            let body =
                transport::get_body(self.transport, handle.query.clone(), &conn.access_token).await?;
            let resp: StatusResponse = transport::decode(&body)?;
            tracing::trace!(command_id = %handle.command_id, status = ?resp.status, attempts, "polled command");

            match interpret(resp)? {
                PollOutcome::Done(data) => {
                    tracing::debug!(command_id = %handle.command_id, attempts, "command finished");
                    return Ok(data);
                }
                PollOutcome::Pending if self.interval.is_zero() => tokio::task::yield_now().await,
                PollOutcome::Pending => tokio::time::sleep(self.interval).await,
            }
        }
    }
}
