//! The executor service object.

use crate::config::ExecutorConfig;
use crate::correlator::{Correlation, PendingRegistry};
use crate::error::ExecutionError;
use crate::request::{RequestBuilder, SignerSlot, normalize_arguments};
use relaycap_cache::{CacheKey, ExecutionCache};
use relaycap_protocol::{
    CapabilityCall, CapabilityIdentity, ExecutionId, PromptSpec, ResourceSpec, Signer, Target,
    ToolSpec, Transport,
};
use relaycap_state_memory::{ExecutionStateStore, StateCell};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Executes capability calls against providers on the relay network.
///
/// Owns the signer, the pending-execution registry, the observable state
/// store and optionally a result cache. Build one at the application root
/// and share it behind an `Arc`.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use relaycap_protocol::Transport;
/// # async fn demo(transport: Arc<dyn Transport>) -> Result<(), relaycap_exec::ExecutionError> {
/// use relaycap_exec::{Executor, ExecutorConfig};
/// use relaycap_protocol::{DurationMs, Target, ToolSpec};
///
/// let executor = Executor::new(transport)
///     .with_config(ExecutorConfig::default().with_timeout(DurationMs::from_secs(30)));
/// let mut args = serde_json::Map::new();
/// args.insert("a".into(), 1.into());
/// args.insert("b".into(), 2.into());
/// let result = executor
///     .execute_tool(&ToolSpec::new("add"), args, &Target::new("provider-pubkey"))
///     .await?;
/// # let _ = result;
/// # Ok(())
/// # }
/// ```
pub struct Executor {
    transport: Arc<dyn Transport>,
    signer: SignerSlot,
    config: ExecutorConfig,
    states: Arc<ExecutionStateStore>,
    cache: Option<Arc<ExecutionCache>>,
    pending: PendingRegistry,
}

impl Executor {
    /// An executor over `transport` with an ephemeral signer, default
    /// config, a fresh state store and no cache.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            signer: SignerSlot::ephemeral(),
            config: ExecutorConfig::default(),
            states: Arc::new(ExecutionStateStore::new()),
            cache: None,
            pending: PendingRegistry::default(),
        }
    }

    /// Sign requests with `signer` instead of an ephemeral key.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = SignerSlot::configured(signer);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a result cache. Used by [`execute_tool`](Self::execute_tool)
    /// when [`ExecutorConfig::cache_results`] is set.
    pub fn with_cache(mut self, cache: Arc<ExecutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share an existing state store.
    pub fn with_state_store(mut self, states: Arc<ExecutionStateStore>) -> Self {
        self.states = states;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The state store.
    pub fn states(&self) -> &Arc<ExecutionStateStore> {
        &self.states
    }

    /// The attached cache, if any.
    pub fn cache(&self) -> Option<&Arc<ExecutionCache>> {
        self.cache.as_ref()
    }

    /// Execute `call` against `target`.
    ///
    /// The identity's state goes to `loading`, then to `success` or
    /// `error` once the call ends.
    pub async fn execute(
        &self,
        call: CapabilityCall,
        target: &Target,
    ) -> Result<Value, ExecutionError> {
        self.execute_with_cancel(call, target, CancellationToken::new()).await
    }

    /// [`execute`](Self::execute) that also ends with
    /// [`ExecutionError::Cancelled`] when `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        call: CapabilityCall,
        target: &Target,
        cancel: CancellationToken,
    ) -> Result<Value, ExecutionError> {
        let identity = call.identity();
        let cell = self.states.get(&identity).await;
        cell.update(|state| state.begin(None));

        let signer = self.signer.get().await;
        let request = match RequestBuilder::new(self.config.request_kind)
            .sign(&call, target, signer.as_ref())
            .await
        {
            Ok(request) => request,
            Err(err) => {
                cell.update(|state| state.fail(err.to_string()));
                return Err(err);
            }
        };

        let execution_id = request.id.clone();
        cell.update(|state| state.begin(Some(execution_id.clone())));
        tracing::debug!(
            execution_id = %execution_id,
            capability = %identity,
            provider = %target.provider,
            "executing capability"
        );

        let pending = self.pending.register(execution_id.clone(), identity);
        let outcome = Correlation {
            transport: self.transport.as_ref(),
            config: &self.config,
            cell: &cell,
            registry_cancel: pending.token(),
            caller_cancel: &cancel,
        }
        .run(&request)
        .await;
        drop(pending);

        record_outcome(&cell, &execution_id, &outcome);
        outcome
    }

    /// Execute an arbitrary `{method, params}` request body.
    ///
    /// Bodies whose method is not a capability method fail before any
    /// subscription is opened.
    pub async fn execute_request(
        &self,
        body: Value,
        target: &Target,
    ) -> Result<Value, ExecutionError> {
        let call = CapabilityCall::from_value(body)?;
        self.execute(call, target).await
    }

    /// Call a tool.
    ///
    /// Optional arguments without a value are dropped first. With a cache
    /// attached and [`ExecutorConfig::cache_results`] set, a cached result
    /// is returned without touching the transport, and fresh results are
    /// stored.
    pub async fn execute_tool(
        &self,
        tool: &ToolSpec,
        arguments: Map<String, Value>,
        target: &Target,
    ) -> Result<Value, ExecutionError> {
        let arguments = normalize_arguments(arguments, &tool.input_schema);
        let call = CapabilityCall::tool(tool.name.clone(), arguments);

        let cache = self.cache.as_ref().filter(|_| self.config.cache_results);
        let Some(cache) = cache else {
            return self.execute(call, target).await;
        };

        let key = CacheKey::derive_with_id(&call, tool.id.as_deref(), target);
        if let Some(result) = cache.get(&key).await {
            tracing::debug!(
                capability = %call.identity(),
                key = %key,
                "serving tool result from cache"
            );
            let cell = self.states.get(&call.identity()).await;
            cell.update(|state| state.succeed(result.clone()));
            return Ok(result);
        }

        let result = self.execute(call, target).await?;
        cache.insert(key, result.clone()).await;
        Ok(result)
    }

    /// Read a resource.
    pub async fn execute_resource(
        &self,
        resource: &ResourceSpec,
        target: &Target,
    ) -> Result<Value, ExecutionError> {
        self.execute(CapabilityCall::resource(resource.uri.clone()), target)
            .await
    }

    /// Get a prompt.
    pub async fn execute_prompt(
        &self,
        prompt: &PromptSpec,
        arguments: BTreeMap<String, String>,
        target: &Target,
    ) -> Result<Value, ExecutionError> {
        self.execute(CapabilityCall::prompt(prompt.name.clone(), arguments), target)
            .await
    }

    /// The observable state cell for `identity`, created idle if new.
    pub async fn state(&self, identity: &CapabilityIdentity) -> StateCell {
        self.states.get(identity).await
    }

    /// Reset one identity to idle. In-flight calls keep running.
    pub async fn reset(&self, identity: &CapabilityIdentity) -> bool {
        self.states.reset(identity).await
    }

    /// Reset every known identity to idle.
    pub async fn reset_all(&self) {
        self.states.reset_all().await;
    }

    /// Cancel one in-flight execution. Returns `false` if it is not pending.
    pub fn cancel(&self, execution_id: &ExecutionId) -> bool {
        self.pending.cancel(execution_id)
    }

    /// Cancel every in-flight execution. The executor stays usable.
    pub fn shutdown(&self) {
        let cancelled = self.pending.cancel_all();
        tracing::info!(cancelled, "executor shutdown");
    }

    /// Ids of executions waiting for a terminal event.
    pub fn in_flight(&self) -> Vec<ExecutionId> {
        self.pending.ids()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("signer_provisioned", &self.signer.is_provisioned())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

fn record_outcome(
    cell: &StateCell,
    execution_id: &ExecutionId,
    outcome: &Result<Value, ExecutionError>,
) {
    let applied = match outcome {
        Ok(result) => {
            tracing::info!(
                execution_id = %execution_id,
                capability = %cell.identity(),
                "capability execution succeeded"
            );
            cell.update_owned(execution_id, |state| state.succeed(result.clone()))
        }
        Err(err) => {
            tracing::info!(
                execution_id = %execution_id,
                capability = %cell.identity(),
                error = %err,
                "capability execution failed"
            );
            cell.update_owned(execution_id, |state| state.fail(err.to_string()))
        }
    };
    if !applied {
        tracing::warn!(
            execution_id = %execution_id,
            capability = %cell.identity(),
            "newer execution owns the state, dropping result"
        );
    }
}
