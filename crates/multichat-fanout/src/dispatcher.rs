//! Provider fan-out dispatcher
//!
//! The Dispatcher sends one chat request to several providers at once:
//! 1. Resolve each requested id to a handle (unresolvable ids are recorded, not called)
//! 2. Spawn one task per handle, each timing its own call
//! 3. Wait for every task to finish (join-all, not a race)
//! 4. Convert each task's failure into a result record of its own
//!
//! Only "nothing could be called at all" fails the dispatch as a whole.

use crate::error::{DispatchError, Result, UnavailableProvider};
use crate::registry::ProviderSlot;
use crate::result::{DispatchResults, ProviderResult};
use multichat_llm::{ChatProvider, ProviderRequest, Turn};
use multichat_utils::AppConfig;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Sends the same request to many providers concurrently
pub struct Dispatcher {
    order: Vec<String>,
    slots: HashMap<String, ProviderSlot>,
    deadline: Option<Duration>,
}

impl Dispatcher {
    /// Create a builder
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Resolve every configured provider into a dispatcher
    ///
    /// Providers that cannot be built are kept as unavailable slots, so
    /// requesting them later yields an `unavailable` result instead of an error.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut builder = DispatcherBuilder::new();
        for settings in &config.providers {
            builder = builder.slot(&settings.id, ProviderSlot::resolve(settings));
        }
        if let Some(deadline) = config.deadline() {
            builder = builder.deadline(deadline);
        }

        let dispatcher = builder.build();
        info!(
            configured = dispatcher.order.len(),
            available = dispatcher.available_ids().len(),
            "Dispatcher ready"
        );
        dispatcher
    }

    /// Configured provider ids, in configuration order
    pub fn provider_ids(&self) -> &[String] {
        &self.order
    }

    /// Ids with a usable handle, in configuration order
    pub fn available_ids(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.slots.get(*id).is_some_and(ProviderSlot::is_ready))
            .map(String::as_str)
            .collect()
    }

    /// Ids without a handle, with the reason
    pub fn unavailable(&self) -> Vec<(&str, &str)> {
        self.order
            .iter()
            .filter_map(|id| match self.slots.get(id) {
                Some(ProviderSlot::Unavailable(reason)) => Some((id.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Overall deadline applied to each dispatch, if any
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Query every configured provider
    pub async fn dispatch_all(&self, prompt: &str, history: &[Turn]) -> Result<DispatchResults> {
        self.dispatch::<&str>(prompt, history, &[]).await
    }

    /// Send `prompt` with `history` to each requested provider concurrently
    ///
    /// An empty `requested` slice means every configured provider. The
    /// returned results hold exactly one entry per distinct requested id.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::EmptyPrompt`] if `prompt` is blank
    /// - [`DispatchError::TotalUnavailable`] if no requested id has a handle
    #[instrument(skip_all, fields(history = history.len(), requested = requested.len()))]
    pub async fn dispatch<S: AsRef<str>>(
        &self,
        prompt: &str,
        history: &[Turn],
        requested: &[S],
    ) -> Result<DispatchResults> {
        if prompt.trim().is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }

        let ids = self.requested_ids(requested);
        let request = Arc::new(ProviderRequest {
            prompt: prompt.to_string(),
            history: history.to_vec(),
        });

        let started = Instant::now();
        // A deadline too far out to represent is no deadline at all
        let deadline_at = self.deadline.and_then(|d| started.checked_add(d));

        let mut results = DispatchResults::default();
        let mut unavailable = Vec::new();
        let mut pending: Vec<(String, String, JoinHandle<ProviderResult>)> = Vec::new();

        for id in ids {
            match self.slots.get(&id) {
                Some(ProviderSlot::Ready(provider)) => {
                    debug!(provider = %id, model = %provider.model(), "Launching provider call");
                    let handle = tokio::spawn(run_unit(
                        id.clone(),
                        Arc::clone(provider),
                        Arc::clone(&request),
                        self.deadline.zip(deadline_at),
                    ));
                    pending.push((id, provider.model().to_string(), handle));
                }
                slot => {
                    let reason = match slot {
                        Some(ProviderSlot::Unavailable(reason)) => reason.clone(),
                        _ => format!("provider '{id}' is not configured"),
                    };
                    debug!(provider = %id, %reason, "Skipping unavailable provider");
                    unavailable.push(UnavailableProvider {
                        provider_id: id.clone(),
                        reason: reason.clone(),
                    });
                    results.insert(ProviderResult::unavailable(id, reason));
                }
            }
        }

        if pending.is_empty() {
            warn!(
                requested = unavailable.len(),
                "No requested provider is available"
            );
            return Err(DispatchError::TotalUnavailable {
                reasons: unavailable,
            });
        }

        info!(providers = pending.len(), "Querying providers in parallel");

        let (meta, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|(id, model, handle)| ((id, model), handle))
            .unzip();

        let joined = futures::future::join_all(handles).await;

        for ((id, model), outcome) in meta.into_iter().zip(joined) {
            let result = outcome.unwrap_or_else(|join_error| {
                warn!(provider = %id, error = %join_error, "Provider task failed");
                ProviderResult::error(
                    id,
                    Some(model),
                    format!("provider task failed: {join_error}"),
                    started.elapsed().as_secs_f64(),
                )
            });
            results.insert(result);
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            succeeded = results.count(crate::Status::Success),
            failed = results.count(crate::Status::Error),
            unavailable = results.count(crate::Status::Unavailable),
            "Dispatch complete"
        );

        Ok(results)
    }

    /// Distinct non-blank requested ids in request order, or all configured ids
    fn requested_ids<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = requested
            .iter()
            .map(|id| id.as_ref().trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .map(str::to_string)
            .collect();

        if ids.is_empty() {
            self.order.clone()
        } else {
            ids
        }
    }
}

/// One provider call: timed, with every failure turned into a result
async fn run_unit(
    id: String,
    provider: Arc<dyn ChatProvider>,
    request: Arc<ProviderRequest>,
    deadline: Option<(Duration, Instant)>,
) -> ProviderResult {
    let start = Instant::now();

    let outcome = match deadline {
        Some((limit, at)) => match tokio::time::timeout_at(at, provider.send(&request)).await {
            Ok(reply) => reply.map_err(|e| e.to_string()),
            Err(_) => Err(format!("timed out after {}s", limit.as_secs_f64())),
        },
        None => provider.send(&request).await.map_err(|e| e.to_string()),
    };

    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        Ok(reply) => {
            info!(
                provider = %id,
                model = %reply.model,
                elapsed_ms = (elapsed * 1000.0) as u64,
                tokens = reply.usage.map(|u| u.total_tokens),
                "Provider replied"
            );
            ProviderResult::success(id, reply, elapsed)
        }
        Err(detail) => {
            warn!(
                provider = %id,
                elapsed_ms = (elapsed * 1000.0) as u64,
                error = %detail,
                "Provider call failed"
            );
            ProviderResult::error(id, Some(provider.model().to_string()), detail, elapsed)
        }
    }
}

/// Builder for Dispatcher
///
/// Registering an id twice keeps its first position and the latest slot.
pub struct DispatcherBuilder {
    order: Vec<String>,
    slots: HashMap<String, ProviderSlot>,
    deadline: Option<Duration>,
}

impl DispatcherBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            slots: HashMap::new(),
            deadline: None,
        }
    }

    /// Register a slot under an id
    pub fn slot(mut self, id: impl Into<String>, slot: ProviderSlot) -> Self {
        let id = id.into();
        if !self.slots.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.slots.insert(id, slot);
        self
    }

    /// Register a ready provider handle
    pub fn provider(self, id: impl Into<String>, provider: Arc<dyn ChatProvider>) -> Self {
        self.slot(id, ProviderSlot::Ready(provider))
    }

    /// Register an id that has no handle
    pub fn unavailable(self, id: impl Into<String>, reason: impl Into<String>) -> Self {
        self.slot(id, ProviderSlot::Unavailable(reason.into()))
    }

    /// Set the overall deadline for each dispatch
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            order: self.order,
            slots: self.slots,
            deadline: self.deadline,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
