//! Sync engine: fetch, map, reconcile, persist.
//!
//! The engine is the single logical owner of all mutable sync state.
//! Observable state lives in an [`EngineState`] snapshot published
//! through a `tokio::sync::watch` channel: every mutation happens inside
//! `send_modify`, so consumers only ever observe complete snapshots —
//! never a partially-updated list mid-refresh.
//!
//! A refresh cycle walks Fetching -> Reconciling -> Persisted, falling
//! back to the local store when disconnected or when any step fails, so
//! the visible list is never left stale-empty while prior data exists.

use crate::network::{decode_json, ConnectivityMonitor, Endpoint, RemoteFetcher};
use crate::profiles::mapper::ProfileMapper;
use crate::profiles::store::ProfileStore;
use crate::profiles::types::{Profile, ProfileStatus};
use crate::profiles::wire::UserListResponse;
use crate::Result;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable engine state, published as a whole on every change.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Current visible projection of profiles.
    pub profiles: Vec<Profile>,
    /// True while a refresh cycle is running.
    pub is_loading: bool,
    /// Last known connectivity (connected until observed otherwise).
    pub is_connected: bool,
    /// Last refresh error, dismissible via
    /// [`SyncEngine::dismiss_error`].
    pub error: Option<String>,
    /// Active status filter. `None` means the inbox view: only
    /// `New`-status profiles are shown.
    pub filter: Option<ProfileStatus>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            is_loading: false,
            is_connected: true,
            error: None,
            filter: None,
        }
    }
}

/// Orchestrates fetch -> map -> reconcile-with-local -> persist while
/// preserving locally-made accept/decline decisions.
pub struct SyncEngine {
    fetcher: Arc<dyn RemoteFetcher>,
    mapper: ProfileMapper,
    store: Arc<ProfileStore>,
    state_tx: watch::Sender<EngineState>,
    /// Reentrancy guard: an overlapping refresh is dropped.
    refresh_in_flight: AtomicBool,
}

impl SyncEngine {
    /// Create an engine over an injected fetcher and store.
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, store: Arc<ProfileStore>) -> Self {
        let (state_tx, _) = watch::channel(EngineState::default());
        Self {
            mapper: ProfileMapper::new(Arc::clone(&fetcher)),
            fetcher,
            store,
            state_tx,
            refresh_in_flight: AtomicBool::new(false),
        }
    }

    // === Observation ===

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> EngineState {
        self.state_tx.borrow().clone()
    }

    /// Current visible profile list.
    pub fn profiles(&self) -> Vec<Profile> {
        self.state_tx.borrow().profiles.clone()
    }

    /// Last known connectivity.
    pub fn is_connected(&self) -> bool {
        self.state_tx.borrow().is_connected
    }

    // === Operations ===

    /// Run one sync cycle.
    ///
    /// Disconnected: loads the filtered view from the local store with
    /// zero network calls. Connected: fetches a batch of user records,
    /// maps them to candidates (image fetches run concurrently, request
    /// order is preserved), reconciles each candidate against the store
    /// so an existing entity's status wins, persists the batch
    /// atomically, and replaces the visible list with exactly that
    /// batch. Every failure is recorded in the observable error field
    /// and followed by a local-store fallback; the loading flag clears
    /// on all paths. An overlapping call is dropped.
    pub async fn refresh(&self) {
        if self.refresh_in_flight.swap(true, Ordering::SeqCst) {
            debug!("Refresh already in flight, dropping this one");
            return;
        }

        if !self.is_connected() {
            debug!("Offline, loading profiles from local store");
            self.load_from_local();
            self.refresh_in_flight.store(false, Ordering::SeqCst);
            return;
        }

        self.state_tx.send_modify(|s| s.is_loading = true);

        match self.sync_cycle().await {
            Ok(batch) => {
                info!("Sync cycle persisted {} profiles", batch.len());
                self.state_tx.send_modify(|s| {
                    s.profiles = batch;
                    s.error = None;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Sync cycle failed, falling back to local store: {}", e);
                self.state_tx
                    .send_modify(|s| s.error = Some(e.to_string()));
                self.load_from_local();
            }
        }

        self.refresh_in_flight.store(false, Ordering::SeqCst);
    }

    /// Load the filtered view from the local store into the visible
    /// list.
    ///
    /// With a filter set, only matching profiles are shown. Without
    /// one, the inbox convention applies: only `New`-status profiles,
    /// not all statuses.
    pub fn load_from_local(&self) {
        let filter = self.state_tx.borrow().filter;
        let result = match filter {
            Some(status) => self.store.fetch_by_status(status),
            None => self.store.fetch_by_status(ProfileStatus::New),
        };

        match result {
            Ok(profiles) => {
                debug!("Loaded {} profiles from local store", profiles.len());
                self.state_tx.send_modify(|s| {
                    s.profiles = profiles;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Failed to load profiles from local store: {}", e);
                self.state_tx.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.is_loading = false;
                });
            }
        }
    }

    /// Apply a user decision to a profile.
    ///
    /// The profile leaves the visible list immediately, independent of
    /// the persistence outcome. The entity is persisted with the new
    /// status and `synced_with_server=false`. With an active filter the
    /// filtered view is then reloaded so it reflects the store's
    /// current truth; in the inbox view the optimistic removal stands.
    pub fn set_status(&self, profile: &Profile, status: ProfileStatus) {
        self.state_tx
            .send_modify(|s| s.profiles.retain(|p| p.id != profile.id));

        let mut updated = profile.clone();
        updated.status = status;
        updated.synced_with_server = false;

        if let Err(e) = self.store.save(&updated) {
            warn!("Failed to persist status change for {}: {}", profile.id, e);
            self.state_tx
                .send_modify(|s| s.error = Some(e.to_string()));
            return;
        }

        debug!("Profile {} marked {}", profile.id, status);

        if self.state_tx.borrow().filter.is_some() {
            self.load_from_local();
        }
    }

    /// Set (or clear) the status filter.
    pub fn set_filter(&self, filter: Option<ProfileStatus>) {
        self.state_tx.send_modify(|s| s.filter = filter);
    }

    /// Clear the observable error without altering data state.
    pub fn dismiss_error(&self) {
        self.state_tx.send_modify(|s| s.error = None);
    }

    // === Connectivity ===

    /// React to a connectivity transition.
    ///
    /// The offline->online edge triggers the pending-changes hook; the
    /// online->offline edge only updates the flag, leaving the already
    /// visible list in place as cached data.
    pub fn handle_connectivity_change(&self, connected: bool) {
        let was_connected = self.is_connected();
        self.state_tx.send_modify(|s| s.is_connected = connected);

        if connected && !was_connected {
            info!("Network connection restored");
            self.report_pending_changes();
        }
    }

    /// Wire a connectivity monitor's transitions into this engine.
    pub fn attach_monitor(self: &Arc<Self>, monitor: &ConnectivityMonitor) {
        let engine = Arc::clone(self);
        monitor.start(move |connected| engine.handle_connectivity_change(connected));
    }

    /// Report local changes awaiting upload.
    ///
    /// There is no upload path: `synced_with_server` is maintained but
    /// nothing pushes pending edits upstream or sets the flag back to
    /// true. This only surfaces what is pending.
    fn report_pending_changes(&self) {
        match self.store.count_unsynced() {
            Ok(0) => debug!("No local changes pending upload"),
            Ok(n) => info!("{} local changes pending upload", n),
            Err(e) => warn!("Failed to count pending changes: {}", e),
        }
    }

    // === Internals ===

    /// One fetch -> map -> reconcile -> persist pass.
    async fn sync_cycle(&self) -> Result<Vec<Profile>> {
        let bytes = self.fetcher.fetch(&Endpoint::user_list()).await?;
        let response: UserListResponse = decode_json(&bytes)?;
        debug!(
            "Fetched {} user records (seed {})",
            response.results.len(),
            response.info.seed
        );

        // Image fetches have no ordering dependency between them;
        // join_all keeps the request order of the batch itself.
        let candidates = join_all(
            response
                .results
                .iter()
                .map(|record| self.mapper.map_to_profile(record)),
        )
        .await;

        // Reconciliation: a remote re-fetch never resets a user's
        // accept/decline decision, and an edit still awaiting upload
        // stays pending (nothing here ever flips the flag back to true).
        let mut batch = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            if let Some(existing) = self.store.fetch_by_id(&candidate.id)? {
                candidate.status = existing.status;
                candidate.synced_with_server = existing.synced_with_server;
            }
            batch.push(candidate);
        }

        self.store.upsert_all(&batch)?;
        Ok(batch)
    }
}
