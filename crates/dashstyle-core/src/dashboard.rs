// ── DashboardComponent ──
//
// Top-level orchestrator. Owns the ConfigStore, the LiveStateCache, the
// AdminController and the rendered views, and talks to the outside world
// only through the two injected seams. Every method takes `&mut self`:
// the adapter's event loop serializes host pushes, user actions and
// gateway completions, so no locking is needed.
//
// Gateway calls run as spawned tasks. Their results come back through an
// unbounded channel and are applied with `apply_completion` (or `settle`).
// After `dispose()` the channel is closed and late results are dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::admin::{
    ActionOutcome, AdminAction, AdminController, AdminTab, AdminUi, Confirm, DiscardRequest,
    NoticeLevel, PendingSaveState, SaveRequest,
};
use crate::config::DashboardOptions;
use crate::error::CoreError;
use crate::gateway::{CommandSink, RemoteConfigGateway, ServiceCall};
use crate::model::{Configuration, LiveSnapshot};
use crate::render::policy::default_action;
use crate::render::{
    AdminView, MainView, View, ViewMode, build_admin_view, build_main_view, patch_main_view,
};
use crate::store::{ConfigStore, LiveStateCache};

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPurpose {
    /// The one load issued on first activation.
    Initial,
    /// The reload that backs a discard.
    Discard,
}

/// Result of a spawned gateway call, delivered back to the component.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        purpose: LoadPurpose,
        result: Result<Configuration, CoreError>,
    },
    Saved {
        document: Configuration,
        result: Result<(), CoreError>,
    },
}

/// What applying a completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Loaded,
    LoadFailed(String),
    Saved,
    SaveFailed(String),
    Discarded,
    DiscardFailed(String),
    /// The component was disposed; nothing changed.
    Ignored,
}

/// Re-render counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub main_builds: u64,
    pub main_patches: u64,
    pub admin_builds: u64,
}

// ── Component ───────────────────────────────────────────────────────

pub struct DashboardComponent<G, S> {
    gateway: Arc<G>,
    sink: Arc<S>,
    store: ConfigStore,
    cache: LiveStateCache,
    admin: AdminController,
    mode: ViewMode,
    admin_flag: bool,
    main_view: MainView,
    admin_view: AdminView,
    stats: RenderStats,
    load_started: bool,
    loaded: bool,
    disposed: bool,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<G, S> DashboardComponent<G, S>
where
    G: RemoteConfigGateway,
    S: CommandSink,
{
    /// Build the component around its two I/O seams. Nothing is loaded
    /// until [`activate`](Self::activate) or the first host update.
    pub fn new(gateway: Arc<G>, sink: Arc<S>, options: &DashboardOptions) -> Self {
        let store = ConfigStore::new();
        let cache = LiveStateCache::new();
        let admin = AdminController::new(options);
        let main_view = build_main_view(&store, &cache);
        let admin_view = build_admin_view(&store, admin.ui());
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Self {
            gateway,
            sink,
            store,
            cache,
            admin,
            mode: ViewMode::Main,
            admin_flag: false,
            main_view,
            admin_view,
            stats: RenderStats {
                main_builds: 1,
                main_patches: 0,
                admin_builds: 1,
            },
            load_started: false,
            loaded: false,
            disposed: false,
            completion_tx,
            completion_rx,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn admin_flag(&self) -> bool {
        self.admin_flag
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn cache(&self) -> &LiveStateCache {
        &self.cache
    }

    pub fn admin_ui(&self) -> &AdminUi {
        self.admin.ui()
    }

    pub fn save_state(&self) -> &PendingSaveState {
        self.admin.save_state()
    }

    pub fn main_view(&self) -> &MainView {
        &self.main_view
    }

    pub fn admin_view(&self) -> &AdminView {
        &self.admin_view
    }

    /// The view for the current mode.
    pub fn current_view(&self) -> View {
        match self.mode {
            ViewMode::Main => View::Main(self.main_view.clone()),
            ViewMode::Admin => View::Admin(self.admin_view.clone()),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Whether a load has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Trigger the initial configuration load. Only the first call (or
    /// first host update) issues a load; returns whether this call did.
    pub fn activate(&mut self) -> bool {
        if self.disposed || self.load_started {
            return false;
        }
        self.load_started = true;
        info!("dashboard activated, loading configuration");
        self.spawn_load(LoadPurpose::Initial);
        true
    }

    /// A host push: replace the live cache and refresh the main view.
    /// Never touches the document or the admin view.
    pub fn on_host_update(&mut self, snapshot: LiveSnapshot, admin_flag: bool) {
        if self.disposed {
            return;
        }
        self.cache.replace(snapshot);
        debug!(
            version = self.cache.version(),
            entities = self.cache.len(),
            "host state pushed"
        );
        self.refresh_main();
        self.set_admin_flag(admin_flag);
        self.activate();
    }

    /// Update the host's admin flag. Losing it while in admin mode returns
    /// to the main view; edits are kept.
    pub fn set_admin_flag(&mut self, admin_flag: bool) {
        self.admin_flag = admin_flag;
        if !admin_flag && self.mode == ViewMode::Admin {
            info!("admin access revoked, returning to main view");
            self.mode = ViewMode::Main;
            self.rebuild_main();
        }
    }

    /// Tear down. Completions that arrive afterwards are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.completion_rx.close();
        debug!("dashboard disposed");
    }

    // ── View mode ────────────────────────────────────────────────────

    /// Flip between main and admin. Admin is only reachable while the
    /// admin flag is set.
    pub fn toggle_view(&mut self) -> ViewMode {
        let target = match self.mode {
            ViewMode::Main => ViewMode::Admin,
            ViewMode::Admin => ViewMode::Main,
        };
        self.set_view(target)
    }

    pub fn set_view(&mut self, target: ViewMode) -> ViewMode {
        if target == ViewMode::Admin && !self.admin_flag {
            debug!("admin view requested without admin access");
            return self.mode;
        }
        if target != self.mode {
            self.mode = target;
            match target {
                ViewMode::Main => self.rebuild_main(),
                ViewMode::Admin => self.rebuild_admin(),
            }
        }
        self.mode
    }

    // ── Admin workflow ───────────────────────────────────────────────

    /// Apply an admin action. Requires the admin flag.
    pub fn admin_action(&mut self, action: AdminAction, confirm: &dyn Confirm) -> ActionOutcome {
        if let Err(err) = self.require_admin() {
            return ActionOutcome::Rejected(err);
        }
        let outcome = self.admin.apply(&mut self.store, action, confirm);
        if outcome.needs_render() {
            self.rebuild_admin();
        }
        outcome
    }

    /// Switch the admin tab. Requires the admin flag.
    pub fn select_tab(&mut self, tab: AdminTab) -> bool {
        if self.require_admin().is_err() {
            return false;
        }
        let changed = self.admin.select_tab(tab);
        if changed {
            self.rebuild_admin();
        }
        changed
    }

    /// Start a save of the current document. At most one is in flight.
    /// Requires the admin flag.
    pub fn save(&mut self) -> SaveRequest {
        if self.disposed {
            return SaveRequest::AlreadyInFlight;
        }
        if self.require_admin().is_err() {
            return SaveRequest::Denied;
        }
        let request = self.admin.begin_save(&self.store);
        if let SaveRequest::Started(doc) = &request {
            info!(revision = self.store.revision(), "saving configuration");
            self.spawn_save(doc.clone());
            self.rebuild_admin();
        } else {
            debug!("save already in flight");
        }
        request
    }

    /// Throw away unsaved edits by reloading from the gateway. Requires
    /// the admin flag.
    pub fn discard(&mut self, confirm: &dyn Confirm) -> DiscardRequest {
        if self.require_admin().is_err() {
            return DiscardRequest::Denied;
        }
        let request = self.admin.request_discard(&self.store, confirm);
        if request == DiscardRequest::Proceed && !self.disposed {
            self.spawn_load(LoadPurpose::Discard);
        }
        self.rebuild_admin();
        request
    }

    /// Posts an error notice when the admin flag is not set.
    fn require_admin(&mut self) -> Result<(), CoreError> {
        if self.admin_flag {
            return Ok(());
        }
        let err = CoreError::validation("Admin access is required to edit the dashboard");
        self.admin.notify(NoticeLevel::Error, err.to_string());
        self.rebuild_admin();
        Err(err)
    }

    /// Drop expired notices, re-rendering the admin view if any went.
    pub fn expire_notices(&mut self, now: Instant) -> bool {
        let changed = self.admin.expire_notices(now);
        if changed {
            self.rebuild_admin();
        }
        changed
    }

    pub fn next_notice_expiry(&self) -> Option<Instant> {
        self.admin.next_expiry()
    }

    // ── Card activation ──────────────────────────────────────────────

    /// Issue the domain's default action for a card. Returns the call
    /// that was sent, if any.
    pub fn activate_card(&mut self, entity_id: &str) -> Option<ServiceCall> {
        if self.disposed {
            return None;
        }
        let call = default_action(entity_id, self.cache.get(entity_id))?;
        debug!(entity_id, service = %call, "card activated");

        let sink = Arc::clone(&self.sink);
        let sent = call.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.invoke(sent).await {
                warn!(error = %e, "service call failed");
            }
        });
        Some(call)
    }

    // ── Completions ──────────────────────────────────────────────────

    /// Wait for the next gateway completion. Yields `None` once disposed
    /// and drained.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completion_rx.recv().await
    }

    /// Wait for the next completion and apply it.
    pub async fn settle(&mut self) -> Settled {
        if self.disposed {
            return Settled::Ignored;
        }
        match self.completion_rx.recv().await {
            Some(completion) => self.apply_completion(completion),
            None => Settled::Ignored,
        }
    }

    pub fn apply_completion(&mut self, completion: Completion) -> Settled {
        if self.disposed {
            debug!("completion after dispose ignored");
            return Settled::Ignored;
        }

        let settled = match completion {
            Completion::Loaded {
                purpose: LoadPurpose::Initial,
                result,
            } => match self.admin.finish_initial_load(&mut self.store, result) {
                Ok(()) => {
                    self.loaded = true;
                    Settled::Loaded
                }
                Err(message) => Settled::LoadFailed(message),
            },
            Completion::Loaded {
                purpose: LoadPurpose::Discard,
                result,
            } => match self.admin.finish_discard(&mut self.store, result) {
                Ok(()) => {
                    self.loaded = true;
                    Settled::Discarded
                }
                Err(message) => Settled::DiscardFailed(message),
            },
            Completion::Saved { document, result } => {
                match self.admin.finish_save(&mut self.store, document, result) {
                    Ok(()) => Settled::Saved,
                    Err(message) => Settled::SaveFailed(message),
                }
            }
        };

        self.rebuild_main();
        self.rebuild_admin();
        settled
    }

    // ── Internals ────────────────────────────────────────────────────

    fn spawn_load(&self, purpose: LoadPurpose) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = gateway.load().await;
            // The receiver is gone after dispose.
            let _ = tx.send(Completion::Loaded { purpose, result });
        });
    }

    fn spawn_save(&self, document: Configuration) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = gateway.save(document.clone()).await;
            let _ = tx.send(Completion::Saved { document, result });
        });
    }

    /// Patch when only live state moved since the last build, rebuild
    /// otherwise.
    fn refresh_main(&mut self) {
        if self.main_view.revision == self.store.revision() {
            patch_main_view(&mut self.main_view, &self.cache);
            self.stats.main_patches += 1;
        } else {
            self.rebuild_main();
        }
    }

    fn rebuild_main(&mut self) {
        self.main_view = build_main_view(&self.store, &self.cache);
        self.stats.main_builds += 1;
    }

    fn rebuild_admin(&mut self) {
        self.admin_view = build_admin_view(&self.store, self.admin.ui());
        self.stats.admin_builds += 1;
    }
}
