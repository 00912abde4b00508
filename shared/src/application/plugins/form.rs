//! Form plugin: draft / submit / external-agency (OGA) verification.
//!
//! Nested FSM (node-state side effects in brackets):
//!
//! ```text
//! ""               -- START ----------------> Initialized
//! Initialized      -- SAVE_AS_DRAFT --------> Draft            [InProgress]
//! Initialized      -- SUBMIT_COMPLETE ------> Submitted        [Completed]
//! Initialized      -- SUBMIT_AWAIT_OGA -----> OGA_Acknowledged [InProgress]
//! Initialized      -- SUBMIT_FAILED --------> SubmissionFailed [InProgress]
//! Draft            -- SAVE_AS_DRAFT --------> Draft            [InProgress]
//! Draft            -- SUBMIT_COMPLETE ------> Submitted        [Completed]
//! Draft            -- SUBMIT_AWAIT_OGA -----> OGA_Acknowledged [InProgress]
//! Draft            -- SUBMIT_FAILED --------> SubmissionFailed [InProgress]
//! SubmissionFailed -- SAVE_AS_DRAFT --------> Draft            [InProgress]
//! SubmissionFailed -- SUBMIT_COMPLETE ------> Submitted        [Completed]
//! SubmissionFailed -- SUBMIT_AWAIT_OGA -----> OGA_Acknowledged [InProgress]
//! OGA_Acknowledged -- OGA_APPROVED ---------> OGA_Reviewed     [Completed]
//! OGA_Acknowledged -- OGA_REJECTED ---------> OGA_Reviewed     [Failed]
//! ```
//!
//! Public actions (`SAVE_AS_DRAFT`, `SUBMIT`, `OGA_VERIFICATION`)
//! resolve to FSM edges before the table is consulted.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{error, info};
use uuid::Uuid;

use super::{config_error, local_keys, ExecuteOutcome, ExecuteRequest, Plugin, PluginContainer, RenderInfo};
use crate::domain::emission::{self, EmissionConfig};
use crate::domain::entities::{NodeState, NodeType};
use crate::domain::state_machine::{PluginFsm, PLUGIN_STATE_INITIAL};
use crate::shared::json_path::{get_value_by_path, set_value_by_path, traverse_schema};
use crate::shared::{AppError, AppResult};

pub mod states {
    pub const INITIALIZED: &str = "Initialized";
    pub const DRAFT: &str = "Draft";
    pub const SUBMITTED: &str = "Submitted";
    pub const OGA_ACKNOWLEDGED: &str = "OGA_Acknowledged";
    pub const SUBMISSION_FAILED: &str = "SubmissionFailed";
    pub const OGA_REVIEWED: &str = "OGA_Reviewed";
}

pub mod actions {
    // FSM edge actions
    pub const START: &str = "START";
    pub const SAVE_AS_DRAFT: &str = "SAVE_AS_DRAFT";
    pub const SUBMIT_COMPLETE: &str = "SUBMIT_COMPLETE";
    pub const SUBMIT_AWAIT_OGA: &str = "SUBMIT_AWAIT_OGA";
    pub const SUBMIT_FAILED: &str = "SUBMIT_FAILED";
    pub const OGA_APPROVED: &str = "OGA_APPROVED";
    pub const OGA_REJECTED: &str = "OGA_REJECTED";

    // Public API actions
    pub const SUBMIT: &str = "SUBMIT";
    pub const OGA_VERIFICATION: &str = "OGA_VERIFICATION";
}

/// The form plugin's transition table.
pub fn form_fsm() -> PluginFsm {
    use actions::*;
    use states::*;
    use NodeState::{Completed, Failed, InProgress};

    PluginFsm::new("form")
        .edge(PLUGIN_STATE_INITIAL, START, INITIALIZED, None)
        .edge(INITIALIZED, SAVE_AS_DRAFT, DRAFT, Some(InProgress))
        .edge(INITIALIZED, SUBMIT_COMPLETE, SUBMITTED, Some(Completed))
        .edge(INITIALIZED, SUBMIT_AWAIT_OGA, OGA_ACKNOWLEDGED, Some(InProgress))
        .edge(INITIALIZED, SUBMIT_FAILED, SUBMISSION_FAILED, Some(InProgress))
        .edge(DRAFT, SAVE_AS_DRAFT, DRAFT, Some(InProgress))
        .edge(DRAFT, SUBMIT_COMPLETE, SUBMITTED, Some(Completed))
        .edge(DRAFT, SUBMIT_AWAIT_OGA, OGA_ACKNOWLEDGED, Some(InProgress))
        .edge(DRAFT, SUBMIT_FAILED, SUBMISSION_FAILED, Some(InProgress))
        .edge(SUBMISSION_FAILED, SAVE_AS_DRAFT, DRAFT, Some(InProgress))
        .edge(SUBMISSION_FAILED, SUBMIT_COMPLETE, SUBMITTED, Some(Completed))
        .edge(SUBMISSION_FAILED, SUBMIT_AWAIT_OGA, OGA_ACKNOWLEDGED, Some(InProgress))
        .edge(OGA_ACKNOWLEDGED, OGA_APPROVED, OGA_REVIEWED, Some(Completed))
        .edge(OGA_ACKNOWLEDGED, OGA_REJECTED, OGA_REVIEWED, Some(Failed))
}

// ----------------------------------------------------------------------
// Node config
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormNodeConfig {
    pub form_id: Option<Uuid>,
    pub requires_oga_verification: bool,
    pub submission: Option<SubmissionConfig>,
    pub callback: Option<CallbackConfig>,
    pub emission: Option<EmissionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionConfig {
    pub url: Option<String>,
    pub response: Option<ResponseMapping>,
    pub meta: Option<Value>,
}

/// `responsePath -> contextKey` copies from an external response into
/// the workflow-level context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMapping {
    pub mapping: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallbackConfig {
    pub transition: Option<CallbackTransition>,
    pub response: Option<ResponseMapping>,
}

/// Picks the OGA edge from a field of the verification payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackTransition {
    pub field: String,
    #[serde(default)]
    pub mapping: HashMap<String, String>,
    pub default: Option<String>,
}

pub struct FormPlugin {
    config: FormNodeConfig,
    /// Form definition cache for the lifetime of this container.
    cached_schema: Option<Value>,
}

impl FormPlugin {
    pub fn from_config(config: &Value) -> AppResult<Self> {
        let config: FormNodeConfig = serde_json::from_value(config.clone())
            .map_err(|e| config_error(&format!("form node: {}", e)))?;
        Ok(Self {
            config,
            cached_schema: None,
        })
    }

    /// `SUBMIT` resolves to the await-OGA edge when the node expects an
    /// external verification, otherwise it completes synchronously.
    fn submit_edge(&self) -> &'static str {
        if self.config.callback.is_some() || self.config.requires_oga_verification {
            actions::SUBMIT_AWAIT_OGA
        } else {
            actions::SUBMIT_COMPLETE
        }
    }

    async fn schema(&mut self, ctx: &PluginContainer) -> AppResult<Option<&Value>> {
        if self.cached_schema.is_none() {
            if let Some(form_id) = self.config.form_id {
                let form = ctx.get_form_definition(form_id).await?;
                self.cached_schema = Some(form.schema.0);
            }
        }
        Ok(self.cached_schema.as_ref())
    }

    async fn ensure_started(&self, ctx: &mut PluginContainer) -> AppResult<()> {
        if ctx.get_plugin_state() == PLUGIN_STATE_INITIAL {
            ctx.transition(actions::START).await?;
        }
        Ok(())
    }

    async fn handle_save_as_draft(
        &mut self,
        ctx: &mut PluginContainer,
        content: &Value,
    ) -> AppResult<ExecuteOutcome> {
        ctx.write_to_local_store(local_keys::TRADER_FORM, content.clone());
        let report = ctx.transition(actions::SAVE_AS_DRAFT).await?;

        Ok(ExecuteOutcome {
            content: content.clone(),
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }

    async fn handle_submit(
        &mut self,
        ctx: &mut PluginContainer,
        content: &Value,
    ) -> AppResult<ExecuteOutcome> {
        if !content.is_object() {
            return Err(AppError::Validation(
                "Form submission content must be a JSON object".to_string(),
            ));
        }
        ctx.write_to_local_store(local_keys::TRADER_FORM, content.clone());

        // Collect writeTo annotations into the global-context patch.
        let mut patch = Map::new();
        if let Some(schema) = self.schema(ctx).await? {
            collect_write_patch(schema, content, &mut patch);
        }

        let edge = self.submit_edge();
        let mut response_body = Value::Null;

        if let Some(url) = self
            .config
            .submission
            .as_ref()
            .and_then(|s| s.url.as_deref())
        {
            match self.post_submission(ctx, url, content).await {
                Ok(body) => {
                    ctx.write_to_local_store(local_keys::SUBMISSION_RESPONSE, body.clone());
                    if let Some(mapping) = self
                        .config
                        .submission
                        .as_ref()
                        .and_then(|s| s.response.as_ref())
                    {
                        map_response_fields(&mapping.mapping, &body, &mut patch);
                    }
                    response_body = body;
                }
                Err(err) => {
                    // Leave the node retryable; no global-context writes.
                    if ctx.can_transition(actions::SUBMIT_FAILED) {
                        ctx.transition(actions::SUBMIT_FAILED).await?;
                    }
                    error!(node_id = %ctx.task_id(), error = %err, "Form submission failed");
                    return Err(err);
                }
            }
        }

        let report = ctx.transition_with(edge, None, patch).await?;
        info!(
            node_id = %ctx.task_id(),
            plugin_state = %report.plugin_state,
            "Form submitted"
        );

        Ok(ExecuteOutcome {
            content: json!({
                "form": content,
                "submissionResponse": response_body,
            }),
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }

    async fn post_submission(
        &self,
        ctx: &PluginContainer,
        url: &str,
        data: &Value,
    ) -> AppResult<Value> {
        let mut payload = json!({
            "data": data,
            "taskId": ctx.task_id(),
            "workflowId": ctx.workflow_id(),
            "serviceUrl": ctx.service_url(),
        });
        if let Some(meta) = self.config.submission.as_ref().and_then(|s| s.meta.as_ref()) {
            payload["meta"] = meta.clone();
        }

        let response = ctx
            .http_client()
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::SubmissionFailure(format!("POST {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SubmissionFailure(format!(
                "POST {} returned {}",
                url, status
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::SubmissionFailure(format!("POST {}: invalid body: {}", url, e)))
    }

    async fn handle_oga_verification(
        &mut self,
        ctx: &mut PluginContainer,
        payload: &Value,
    ) -> AppResult<ExecuteOutcome> {
        let edge = choose_oga_action(self.config.callback.as_ref(), payload)?;
        ctx.write_to_local_store(local_keys::OGA_RESPONSE, payload.clone());

        let mut patch = Map::new();
        if let Some(mapping) = self
            .config
            .callback
            .as_ref()
            .and_then(|c| c.response.as_ref())
        {
            map_response_fields(&mapping.mapping, payload, &mut patch);
        }

        // Emission runs over the composite terminal-state context.
        let mut composite = Map::new();
        for key in [local_keys::TRADER_FORM, local_keys::SUBMISSION_RESPONSE] {
            composite.insert(
                key.to_string(),
                ctx.read_from_local_store(key).cloned().unwrap_or(Value::Null),
            );
        }
        composite.insert(local_keys::OGA_RESPONSE.to_string(), payload.clone());
        let composite = Value::Object(composite);
        let outcome = self
            .config
            .emission
            .as_ref()
            .and_then(|config| emission::evaluate(&config.rules, &composite));

        let report = ctx.transition_with(&edge, outcome.clone(), patch).await?;
        info!(
            node_id = %ctx.task_id(),
            edge = %edge,
            outcome = outcome.as_deref().unwrap_or("-"),
            "OGA verification applied"
        );

        Ok(ExecuteOutcome {
            content: payload.clone(),
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }
}

#[async_trait]
impl Plugin for FormPlugin {
    async fn start(&mut self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome> {
        let report = ctx.transition(actions::START).await?;
        Ok(ExecuteOutcome {
            content: Value::Null,
            state: report.node_state,
            plugin_state: report.plugin_state,
            new_ready_node_ids: report.new_ready_node_ids,
            workflow_finished: report.workflow_finished,
        })
    }

    async fn get_render_info(&mut self, ctx: &mut PluginContainer) -> AppResult<RenderInfo> {
        let mut content = ctx
            .read_from_local_store(local_keys::TRADER_FORM)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        // Before first user input, pre-populate readFrom defaults from
        // the workflow context. Existing form data wins.
        let plugin_state = ctx.get_plugin_state();
        if plugin_state == PLUGIN_STATE_INITIAL || plugin_state == states::INITIALIZED {
            let global = Value::Object(ctx.global_context().clone());
            if let Some(schema) = self.schema(ctx).await? {
                apply_read_from_defaults(schema, &global, &mut content);
            }
        }

        Ok(RenderInfo {
            node_type: NodeType::SimpleForm,
            plugin_state: ctx.get_plugin_state(),
            state: ctx.get_task_state(),
            content,
        })
    }

    async fn execute(
        &mut self,
        ctx: &mut PluginContainer,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome> {
        self.ensure_started(ctx).await?;
        let content = req.content.clone().unwrap_or_else(|| json!({}));

        match req.action.as_str() {
            actions::SAVE_AS_DRAFT => self.handle_save_as_draft(ctx, &content).await,
            actions::SUBMIT => self.handle_submit(ctx, &content).await,
            actions::OGA_VERIFICATION => self.handle_oga_verification(ctx, &content).await,
            other => Err(AppError::Validation(format!(
                "Unknown form action: {}",
                other
            ))),
        }
    }
}

// ----------------------------------------------------------------------
// Pure helpers
// ----------------------------------------------------------------------

/// Collect `writeTo`-annotated submitted values into a context patch.
fn collect_write_patch(schema: &Value, data: &Value, patch: &mut Map<String, Value>) {
    traverse_schema(schema, &mut |path, node, _parent| {
        if let Some(context_key) = node.get("writeTo").and_then(Value::as_str) {
            if let Some(value) = get_value_by_path(data, path) {
                patch.insert(context_key.to_string(), value.clone());
            }
        }
    });
}

/// Fill `readFrom` defaults from the workflow context into form data.
fn apply_read_from_defaults(schema: &Value, global: &Value, data: &mut Value) {
    let mut defaults = Vec::new();
    traverse_schema(schema, &mut |path, node, _parent| {
        if let Some(context_key) = node.get("readFrom").and_then(Value::as_str) {
            if get_value_by_path(data, path).is_none() {
                if let Some(value) = get_value_by_path(global, context_key) {
                    defaults.push((path.to_string(), value.clone()));
                }
            }
        }
    });
    for (path, value) in defaults {
        set_value_by_path(data, &path, value);
    }
}

/// Copy `responsePath -> contextKey` mapped fields into the patch.
fn map_response_fields(
    mapping: &HashMap<String, String>,
    response: &Value,
    patch: &mut Map<String, Value>,
) {
    for (response_path, context_key) in mapping {
        if let Some(value) = get_value_by_path(response, response_path) {
            patch.insert(context_key.clone(), value.clone());
        }
    }
}

/// Pick the OGA edge: the configured transition rule when present, the
/// case-insensitive `decision == "APPROVED"` default otherwise.
fn choose_oga_action(callback: Option<&CallbackConfig>, payload: &Value) -> AppResult<String> {
    if let Some(rule) = callback.and_then(|c| c.transition.as_ref()) {
        let observed = get_value_by_path(payload, &rule.field)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if let Some(action) = rule.mapping.get(observed) {
            return Ok(action.clone());
        }
        return rule.default.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "Verification value {:?} has no mapped action and no default",
                observed
            ))
        });
    }

    let decision = payload
        .get("decision")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if decision.eq_ignore_ascii_case("APPROVED") {
        Ok(actions::OGA_APPROVED.to_string())
    } else {
        Ok(actions::OGA_REJECTED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fsm_has_every_specified_edge() {
        let fsm = form_fsm();
        let expect = |from: &str, action: &str, to: &str, node: Option<NodeState>| {
            let outcome = fsm
                .lookup(from, action)
                .unwrap_or_else(|| panic!("missing edge ({}, {})", from, action));
            assert_eq!(outcome.plugin_state, to);
            assert_eq!(outcome.node_state, node);
        };
        use NodeState::{Completed, Failed, InProgress};

        expect(PLUGIN_STATE_INITIAL, actions::START, states::INITIALIZED, None);
        for from in [states::INITIALIZED, states::DRAFT] {
            expect(from, actions::SAVE_AS_DRAFT, states::DRAFT, Some(InProgress));
            expect(from, actions::SUBMIT_COMPLETE, states::SUBMITTED, Some(Completed));
            expect(
                from,
                actions::SUBMIT_AWAIT_OGA,
                states::OGA_ACKNOWLEDGED,
                Some(InProgress),
            );
            expect(
                from,
                actions::SUBMIT_FAILED,
                states::SUBMISSION_FAILED,
                Some(InProgress),
            );
        }
        expect(
            states::SUBMISSION_FAILED,
            actions::SAVE_AS_DRAFT,
            states::DRAFT,
            Some(InProgress),
        );
        expect(
            states::SUBMISSION_FAILED,
            actions::SUBMIT_COMPLETE,
            states::SUBMITTED,
            Some(Completed),
        );
        expect(
            states::SUBMISSION_FAILED,
            actions::SUBMIT_AWAIT_OGA,
            states::OGA_ACKNOWLEDGED,
            Some(InProgress),
        );
        expect(
            states::OGA_ACKNOWLEDGED,
            actions::OGA_APPROVED,
            states::OGA_REVIEWED,
            Some(Completed),
        );
        expect(
            states::OGA_ACKNOWLEDGED,
            actions::OGA_REJECTED,
            states::OGA_REVIEWED,
            Some(Failed),
        );
    }

    #[test]
    fn test_fsm_rejects_unlisted_edges() {
        let fsm = form_fsm();
        assert!(!fsm.can_transition(states::SUBMITTED, actions::SAVE_AS_DRAFT));
        assert!(!fsm.can_transition(states::OGA_REVIEWED, actions::SUBMIT_COMPLETE));
        assert!(!fsm.can_transition(states::OGA_ACKNOWLEDGED, actions::SAVE_AS_DRAFT));
        assert!(!fsm.can_transition(PLUGIN_STATE_INITIAL, actions::SUBMIT_COMPLETE));
    }

    #[test]
    fn test_submit_edge_resolution() {
        let plain = FormPlugin::from_config(&json!({})).unwrap();
        assert_eq!(plain.submit_edge(), actions::SUBMIT_COMPLETE);

        let oga = FormPlugin::from_config(&json!({"requiresOgaVerification": true})).unwrap();
        assert_eq!(oga.submit_edge(), actions::SUBMIT_AWAIT_OGA);

        let callback = FormPlugin::from_config(&json!({"callback": {}})).unwrap();
        assert_eq!(callback.submit_edge(), actions::SUBMIT_AWAIT_OGA);
    }

    #[test]
    fn test_choose_oga_action_default_decision() {
        assert_eq!(
            choose_oga_action(None, &json!({"decision": "APPROVED"})).unwrap(),
            actions::OGA_APPROVED
        );
        assert_eq!(
            choose_oga_action(None, &json!({"decision": "approved"})).unwrap(),
            actions::OGA_APPROVED
        );
        assert_eq!(
            choose_oga_action(None, &json!({"decision": "REJECTED"})).unwrap(),
            actions::OGA_REJECTED
        );
        assert_eq!(
            choose_oga_action(None, &json!({})).unwrap(),
            actions::OGA_REJECTED
        );
    }

    #[test]
    fn test_choose_oga_action_configured_transition() {
        let callback: CallbackConfig = serde_json::from_value(json!({
            "transition": {
                "field": "review.status",
                "mapping": {"CLEARED": "OGA_APPROVED", "DENIED": "OGA_REJECTED"},
                "default": "OGA_REJECTED"
            }
        }))
        .unwrap();

        assert_eq!(
            choose_oga_action(Some(&callback), &json!({"review": {"status": "CLEARED"}})).unwrap(),
            actions::OGA_APPROVED
        );
        // unmapped value falls back to the default
        assert_eq!(
            choose_oga_action(Some(&callback), &json!({"review": {"status": "PENDING"}})).unwrap(),
            actions::OGA_REJECTED
        );

        let no_default: CallbackConfig = serde_json::from_value(json!({
            "transition": {"field": "review.status", "mapping": {}}
        }))
        .unwrap();
        assert!(choose_oga_action(Some(&no_default), &json!({})).is_err());
    }

    #[test]
    fn test_collect_write_patch_walks_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "consignmentValue": {"type": "number", "writeTo": "permit:consignmentValue"},
                "origin": {
                    "type": "object",
                    "properties": {
                        "country": {"type": "string", "writeTo": "permit:countryOfOrigin"}
                    }
                },
                "notes": {"type": "string"}
            }
        });
        let data = json!({
            "consignmentValue": 1200,
            "origin": {"country": "LK"},
            "notes": "ignored"
        });

        let mut patch = Map::new();
        collect_write_patch(&schema, &data, &mut patch);

        assert_eq!(patch.len(), 2);
        assert_eq!(patch["permit:consignmentValue"], json!(1200));
        assert_eq!(patch["permit:countryOfOrigin"], json!("LK"));
    }

    #[test]
    fn test_collect_write_patch_skips_missing_values() {
        let schema = json!({
            "properties": {"tin": {"type": "string", "writeTo": "trader:tin"}}
        });
        let mut patch = Map::new();
        collect_write_patch(&schema, &json!({}), &mut patch);
        assert!(patch.is_empty());
    }

    #[test]
    fn test_read_from_defaults_respect_existing_data() {
        let schema = json!({
            "properties": {
                "importerName": {"type": "string", "readFrom": "trader:name"},
                "importerTin": {"type": "string", "readFrom": "trader:tin"}
            }
        });
        let global = json!({"trader:name": "Acme Exports", "trader:tin": "TIN-7"});

        let mut data = json!({"importerTin": "TIN-OVERRIDE"});
        apply_read_from_defaults(&schema, &global, &mut data);

        assert_eq!(data["importerName"], json!("Acme Exports"));
        // existing form data wins
        assert_eq!(data["importerTin"], json!("TIN-OVERRIDE"));
    }

    #[test]
    fn test_map_response_fields() {
        let mapping: HashMap<String, String> = [
            ("permit.number".to_string(), "permit:number".to_string()),
            ("missing.path".to_string(), "never:set".to_string()),
        ]
        .into_iter()
        .collect();
        let response = json!({"permit": {"number": "IMP-0042"}});

        let mut patch = Map::new();
        map_response_fields(&mapping, &response, &mut patch);

        assert_eq!(patch.len(), 1);
        assert_eq!(patch["permit:number"], json!("IMP-0042"));
    }
}
