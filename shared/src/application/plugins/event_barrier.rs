//! Event-barrier plugin: notify an external service, then wait for its
//! callback to complete the node.
//!
//! The notification runs in a detached task with its own deadline so
//! cancelling the originating request does not abort it. Connection
//! errors, HTTP 5xx and 429 are retried with exponential backoff; any
//! other 4xx leaves the node in InProgress for operator intervention.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{config_error, ExecuteOutcome, ExecuteRequest, Plugin, PluginContainer, RenderInfo};
use crate::domain::entities::{NodeState, NodeType};
use crate::domain::state_machine::{PluginFsm, PLUGIN_STATE_INITIAL};
use crate::shared::AppResult;

pub mod states {
    pub const AWAITING_CALLBACK: &str = "AwaitingCallback";
    pub const EVENT_RECEIVED: &str = "EventReceived";
}

pub mod actions {
    pub const NOTIFY: &str = "NOTIFY";
    pub const COMPLETE: &str = "COMPLETE";

    /// Wire action the external service sends to release the barrier.
    pub const PUBLIC_COMPLETE: &str = "complete";
}

/// Overall ceiling for one notification attempt run.
const NOTIFY_DEADLINE: Duration = Duration::from_secs(120);
/// Retries after the first attempt.
const NOTIFY_MAX_RETRIES: u32 = 3;
/// Initial backoff, doubled per retry.
const NOTIFY_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// The event-barrier transition table.
pub fn barrier_fsm() -> PluginFsm {
    use actions::*;
    use states::*;
    use NodeState::{Completed, InProgress};

    PluginFsm::new("event-barrier")
        .edge(PLUGIN_STATE_INITIAL, NOTIFY, AWAITING_CALLBACK, Some(InProgress))
        .edge(PLUGIN_STATE_INITIAL, COMPLETE, EVENT_RECEIVED, Some(Completed))
        .edge(AWAITING_CALLBACK, NOTIFY, AWAITING_CALLBACK, Some(InProgress))
        .edge(AWAITING_CALLBACK, COMPLETE, EVENT_RECEIVED, Some(Completed))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarrierConfig {
    pub external_service_url: String,
}

pub struct EventBarrierPlugin {
    config: BarrierConfig,
}

impl EventBarrierPlugin {
    pub fn from_config(config: &Value) -> AppResult<Self> {
        let config: BarrierConfig = serde_json::from_value(config.clone())
            .map_err(|e| config_error(&format!("event-barrier node: {}", e)))?;
        Ok(Self { config })
    }

    async fn notify(&self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome> {
        let report = ctx.transition(actions::NOTIFY).await?;
        spawn_notifier(
            self.config.external_service_url.clone(),
            ctx.workflow_id(),
            ctx.task_id(),
        );
        Ok(ExecuteOutcome {
            content: json!({"notified": self.config.external_service_url}),
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }

    async fn complete(&self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome> {
        if ctx.get_plugin_state() == states::EVENT_RECEIVED {
            // The external service may call back more than once.
            return Ok(ExecuteOutcome {
                content: Value::Null,
                state: ctx.get_task_state(),
                plugin_state: ctx.get_plugin_state(),
                new_ready_node_ids: vec![],
                workflow_finished: false,
            });
        }
        let report = ctx.transition(actions::COMPLETE).await?;
        info!(node_id = %ctx.task_id(), "Event barrier released");
        Ok(ExecuteOutcome {
            content: Value::Null,
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }
}

#[async_trait]
impl Plugin for EventBarrierPlugin {
    async fn start(&mut self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome> {
        self.notify(ctx).await
    }

    async fn get_render_info(&mut self, ctx: &mut PluginContainer) -> AppResult<RenderInfo> {
        Ok(RenderInfo {
            node_type: NodeType::EventBarrier,
            plugin_state: ctx.get_plugin_state(),
            state: ctx.get_task_state(),
            content: json!({"externalServiceUrl": self.config.external_service_url}),
        })
    }

    async fn execute(
        &mut self,
        ctx: &mut PluginContainer,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome> {
        if req.action == actions::PUBLIC_COMPLETE {
            self.complete(ctx).await
        } else {
            self.notify(ctx).await
        }
    }
}

/// Fire-and-forget notification on a detached task with an independent
/// deadline. The client is instantiated per retry loop and reused across
/// its own retries for connection reuse.
pub fn spawn_notifier(url: String, workflow_id: Uuid, task_id: Uuid) {
    tokio::spawn(async move {
        let run = notify_with_retries(&url, workflow_id, task_id);
        if tokio::time::timeout(NOTIFY_DEADLINE, run).await.is_err() {
            error!(%url, %task_id, "Event-barrier notification timed out");
        }
    });
}

async fn notify_with_retries(url: &str, workflow_id: Uuid, task_id: Uuid) {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!(%url, error = %e, "Event-barrier client construction failed");
            return;
        }
    };
    let payload = json!({"workflowId": workflow_id, "taskId": task_id});

    let mut backoff = NOTIFY_INITIAL_BACKOFF;
    for attempt in 0..=NOTIFY_MAX_RETRIES {
        match client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(%url, %task_id, attempt, "Event-barrier notification delivered");
                return;
            }
            Ok(response) if !retryable_status(response.status()) => {
                // Non-retryable 4xx: the node stays InProgress awaiting
                // operator intervention.
                error!(
                    %url, %task_id,
                    status = %response.status(),
                    "Event-barrier notification rejected"
                );
                return;
            }
            Ok(response) => {
                warn!(
                    %url, %task_id, attempt,
                    status = %response.status(),
                    "Event-barrier notification failed, will retry"
                );
            }
            Err(e) => {
                warn!(
                    %url, %task_id, attempt,
                    error = %e,
                    "Event-barrier notification errored, will retry"
                );
            }
        }

        if attempt < NOTIFY_MAX_RETRIES {
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }

    // Exhaustion is logged, never surfaced: the node sits in InProgress
    // awaiting manual resolution rather than losing the event.
    error!(%url, %task_id, "Event-barrier notification retries exhausted");
}

fn retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrier_fsm_edges() {
        let fsm = barrier_fsm();

        let notify = fsm.lookup(PLUGIN_STATE_INITIAL, actions::NOTIFY).unwrap();
        assert_eq!(notify.plugin_state, states::AWAITING_CALLBACK);
        assert_eq!(notify.node_state, Some(NodeState::InProgress));

        let complete = fsm
            .lookup(states::AWAITING_CALLBACK, actions::COMPLETE)
            .unwrap();
        assert_eq!(complete.plugin_state, states::EVENT_RECEIVED);
        assert_eq!(complete.node_state, Some(NodeState::Completed));

        // a callback can win the race with the first notify
        assert!(fsm.can_transition(PLUGIN_STATE_INITIAL, actions::COMPLETE));
        // the barrier never re-opens
        assert!(!fsm.can_transition(states::EVENT_RECEIVED, actions::NOTIFY));
        assert!(!fsm.can_transition(states::EVENT_RECEIVED, actions::COMPLETE));
    }

    #[test]
    fn test_retryable_statuses() {
        use reqwest::StatusCode;
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::BAD_GATEWAY));
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!retryable_status(StatusCode::BAD_REQUEST));
        assert!(!retryable_status(StatusCode::NOT_FOUND));
        assert!(!retryable_status(StatusCode::CONFLICT));
    }

    #[test]
    fn test_config_requires_external_service_url() {
        assert!(EventBarrierPlugin::from_config(&json!({})).is_err());
        let plugin = EventBarrierPlugin::from_config(
            &json!({"externalServiceUrl": "http://localhost:9090/release-orders"}),
        )
        .unwrap();
        assert_eq!(
            plugin.config.external_service_url,
            "http://localhost:9090/release-orders"
        );
    }
}
