//! Per-tenant load orchestration
//!
//! Each tenant has one slot holding the latest classified stock or the
//! failure of the latest load. A refresh aborts the tenant's in-flight load;
//! plain reads join it instead. Only the newest generation may publish into
//! the slot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::TenantContext;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

use super::stock::{LoadedStock, StockService};
use crate::error::{AppError, AppResult};

/// Published state of a tenant's stock table. A failed load replaces the
/// previous rows, so stale stock is never served after a failure.
#[derive(Debug, Clone)]
pub enum BoardState {
    Loaded(Arc<LoadedStock>),
    Failed {
        message: String,
        failed_at: DateTime<Utc>,
    },
}

type Outcome = watch::Receiver<Option<BoardState>>;

struct InFlight {
    abort: AbortHandle,
    outcome: Outcome,
}

#[derive(Default)]
struct TenantSlot {
    generation: u64,
    in_flight: Option<InFlight>,
    state: Option<BoardState>,
}

type Slots = Arc<Mutex<HashMap<Uuid, TenantSlot>>>;

/// Load orchestration shared by all request handlers
#[derive(Clone)]
pub struct StockBoard {
    loader: StockService,
    slots: Slots,
}

impl StockBoard {
    pub fn new(loader: StockService) -> Self {
        Self {
            loader,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn loader(&self) -> &StockService {
        &self.loader
    }

    /// Latest published state for the tenant, if any load completed
    pub async fn state(&self, ctx: &TenantContext) -> Option<BoardState> {
        let slots = self.slots.lock().await;
        slots.get(&ctx.tenant_id).and_then(|slot| slot.state.clone())
    }

    /// Return the published stock, loading it first when the tenant has
    /// none or when the last load failed. A load already in flight is
    /// awaited rather than restarted. `force` behaves like [`Self::refresh`].
    pub async fn ensure_loaded(
        &self,
        ctx: &TenantContext,
        force: bool,
    ) -> AppResult<Arc<LoadedStock>> {
        if force {
            return self.refresh(ctx).await;
        }

        loop {
            let mut outcome = {
                let mut slots = self.slots.lock().await;
                let slot = slots.entry(ctx.tenant_id).or_default();

                // A load task that died without publishing leaves a closed channel
                if let Some(in_flight) = &slot.in_flight {
                    if in_flight.outcome.has_changed().is_err() {
                        slot.in_flight = None;
                    }
                }

                match (&slot.in_flight, &slot.state) {
                    (Some(in_flight), _) => in_flight.outcome.clone(),
                    (None, Some(BoardState::Loaded(loaded))) => return Ok(Arc::clone(loaded)),
                    (None, state) => {
                        if let Some(BoardState::Failed { message, failed_at }) = state {
                            tracing::debug!(
                                tenant_id = %ctx.tenant_id,
                                %failed_at,
                                "Retrying after failed stock load: {}",
                                message
                            );
                        }
                        self.start_load(slot, *ctx).1
                    }
                }
            };

            let published = match outcome.wait_for(Option::is_some).await {
                Ok(state) => (*state).clone(),
                Err(_) => None,
            };
            match published {
                Some(BoardState::Loaded(loaded)) => return Ok(loaded),
                Some(BoardState::Failed { message, .. }) => {
                    return Err(AppError::StoreUnavailable(message))
                }
                None => {
                    tracing::debug!(
                        tenant_id = %ctx.tenant_id,
                        "Awaited stock load was superseded, following the newer one"
                    );
                }
            }
        }
    }

    /// Start a new load cycle, aborting any in-flight one for the tenant,
    /// and wait for its outcome.
    pub async fn refresh(&self, ctx: &TenantContext) -> AppResult<Arc<LoadedStock>> {
        let ctx = *ctx;
        let handle = {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(ctx.tenant_id).or_default();

            if let Some(previous) = slot.in_flight.take() {
                previous.abort.abort();
                tracing::debug!(tenant_id = %ctx.tenant_id, "Aborted in-flight stock load");
            }
            self.start_load(slot, ctx).0
        };

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AppError::LoadSuperseded),
            Err(e) => {
                tracing::error!(tenant_id = %ctx.tenant_id, "Stock load task failed: {}", e);
                Err(AppError::Internal(format!("Stock load task failed: {}", e)))
            }
        }
    }

    /// Spawn a load under a new generation and record it as the slot's
    /// in-flight load. The caller must hold the slots lock.
    fn start_load(
        &self,
        slot: &mut TenantSlot,
        ctx: TenantContext,
    ) -> (JoinHandle<AppResult<Arc<LoadedStock>>>, Outcome) {
        slot.generation += 1;
        let generation = slot.generation;
        let (sender, outcome) = watch::channel(None);

        let loader = self.loader.clone();
        let slots = Arc::clone(&self.slots);
        let handle = tokio::spawn(async move {
            let result = loader.load(&ctx).await;
            publish(&slots, &ctx, generation, result, &sender).await
        });
        slot.in_flight = Some(InFlight {
            abort: handle.abort_handle(),
            outcome: outcome.clone(),
        });
        (handle, outcome)
    }
}

/// Replace the tenant's state with a load outcome and hand it to the
/// readers awaiting this load, unless a newer load started meanwhile.
async fn publish(
    slots: &Slots,
    ctx: &TenantContext,
    generation: u64,
    result: AppResult<LoadedStock>,
    outcome: &watch::Sender<Option<BoardState>>,
) -> AppResult<Arc<LoadedStock>> {
    let mut slots = slots.lock().await;
    let slot = slots.entry(ctx.tenant_id).or_default();

    if slot.generation != generation {
        tracing::debug!(
            tenant_id = %ctx.tenant_id,
            generation,
            latest = slot.generation,
            "Discarding superseded stock load"
        );
        return Err(AppError::LoadSuperseded);
    }
    slot.in_flight = None;

    let (state, result) = match result {
        Ok(loaded) => {
            let loaded = Arc::new(loaded);
            (BoardState::Loaded(Arc::clone(&loaded)), Ok(loaded))
        }
        Err(e) => {
            tracing::error!(tenant_id = %ctx.tenant_id, "Stock load failed: {}", e);
            let state = BoardState::Failed {
                message: e.to_string(),
                failed_at: Utc::now(),
            };
            (state, Err(e))
        }
    };
    slot.state = Some(state.clone());
    outcome.send_replace(Some(state));
    result
}
