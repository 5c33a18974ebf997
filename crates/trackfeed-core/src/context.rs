// ── Public application handle ──
//
// `AppContext` is what consumers hold: read access to the state and the
// tracker projection plus the dispatch entry point. It is only valid
// while the `FeedSync` scope that created it is running.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::store::{AppState, DataStore, FlatDeviceTracker, RawAction, StateAction, StoreView};
use crate::stream::StateStream;

tokio::task_local! {
    static CURRENT: AppContext;
}

/// Handle to a running feed scope. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<DataStore>,
    scope: CancellationToken,
}

impl AppContext {
    pub(crate) fn new(store: Arc<DataStore>, scope: CancellationToken) -> Self {
        Self { store, scope }
    }

    /// Whether the owning scope has ended.
    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    fn store(&self) -> Result<&DataStore, CoreError> {
        if self.is_closed() {
            return Err(CoreError::ContextClosed);
        }
        Ok(&self.store)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn state(&self) -> Result<Arc<AppState>, CoreError> {
        Ok(self.store()?.state())
    }

    pub fn trackers(&self) -> Result<Arc<[FlatDeviceTracker]>, CoreError> {
        Ok(self.store()?.trackers())
    }

    /// State and projection as one consistent value.
    pub fn view(&self) -> Result<Arc<StoreView>, CoreError> {
        Ok(self.store()?.view())
    }

    pub fn subscribe(&self) -> Result<StateStream, CoreError> {
        Ok(self.store()?.subscribe())
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn dispatch(&self, action: StateAction) -> Result<(), CoreError> {
        self.store()?.dispatch(action);
        Ok(())
    }

    pub fn dispatch_raw(&self, raw: RawAction) -> Result<(), CoreError> {
        self.store()?.dispatch_raw(raw)
    }

    // ── Scoped lookup ────────────────────────────────────────────────

    /// Run `fut` with this handle installed for [`app_context`].
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Run `f` synchronously with this handle installed for [`app_context`].
    pub fn enter<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }
}

/// The handle installed by the enclosing [`AppContext::scope`] or
/// [`AppContext::enter`].
pub fn app_context() -> Result<AppContext, CoreError> {
    CURRENT
        .try_with(AppContext::clone)
        .map_err(|_| CoreError::MissingContext)
}
