//! Page: one document session.
//!
//! [`Page`] ties together the normalized document, the data store, the modal
//! registry, the broadcast bus, and the network and navigation
//! collaborators. Renderers read it through [`Page::render`]; user events
//! enter through `click`, `input`, `submit_form`, and friends.
//!
//! Every method takes `&self`, so independent widgets can load concurrently
//! (`tokio::join!(page.load_grid(a), page.load_grid(b))`). State lives behind
//! `RefCell`s whose borrows never span an `.await`.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::action::{ActionDispatcher, BroadcastBus, BroadcastMessage, ChainEnd, DispatchContext};
use crate::config::EngineConfig;
use crate::expr::interpolate;
use crate::meta::{Document, MetadataLoader, ModalDefinition, ModalRegistry, NodeId, Normalizer, WidgetType};
use crate::net::{Navigator, Network};
use crate::render::{Frame, Renderer};
use crate::store::{DataStore, Scope, SharedStore};
use crate::widgets::{
    self, button, form, grid, input::field_value, label, select, FieldBinding, GridSource,
    GridState, OptionsSource, RemoteSource, Validator, WidgetState, WidgetView,
};

pub use crate::meta::LoadError;

/// Message a grid shows when its source rejects the request.
const GRID_LOAD_FAILED: &str = "Failed to load grid data";

// ---------------------------------------------------------------------------
// LoadState
// ---------------------------------------------------------------------------

/// Document-level state shown to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Result of [`Page::submit_form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// At least one field failed validation; nothing was dispatched.
    Invalid { fields: usize },
    Dispatched(ChainEnd),
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub struct Page {
    config: EngineConfig,
    network: Rc<dyn Network>,
    loader: MetadataLoader,
    dispatcher: ActionDispatcher,
    document: RefCell<Option<Rc<Document>>>,
    widgets: RefCell<WidgetState>,
    state: RefCell<LoadState>,
}

impl Page {
    /// Create an empty page. Nothing is loaded until
    /// [`load`](Self::load) or [`load_document`](Self::load_document).
    pub fn new(config: EngineConfig, network: Rc<dyn Network>, navigator: Rc<dyn Navigator>) -> Self {
        let store: SharedStore = Rc::new(RefCell::new(DataStore::new()));
        let dispatcher = ActionDispatcher::new(
            store,
            Rc::new(RefCell::new(ModalRegistry::new())),
            BroadcastBus::new(),
            network.clone(),
            navigator,
        );
        Self {
            loader: MetadataLoader::new(network.clone(), &config),
            config,
            network,
            dispatcher,
            document: RefCell::new(None),
            widgets: RefCell::new(WidgetState::new()),
            state: RefCell::new(LoadState::Idle),
        }
    }

    /// Seed global-scope data (builder).
    pub fn with_data(self, global: Value) -> Self {
        if let Value::Object(map) = global {
            self.store().borrow_mut().merge(Scope::Global, map);
        }
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        self.dispatcher.store()
    }

    pub fn modals(&self) -> &Rc<RefCell<ModalRegistry>> {
        self.dispatcher.modals()
    }

    pub fn bus(&self) -> &BroadcastBus {
        self.dispatcher.bus()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn loader(&self) -> &MetadataLoader {
        &self.loader
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// The loaded document, if any.
    pub fn document(&self) -> Option<Rc<Document>> {
        self.document.borrow().clone()
    }

    pub fn widget_state(&self) -> Ref<'_, WidgetState> {
        self.widgets.borrow()
    }

    /// Last validation messages recorded for field `id`.
    pub fn errors(&self, id: NodeId) -> Vec<String> {
        self.widgets.borrow().errors(id).to_vec()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch and install the document at `url`.
    ///
    /// When `data_url` is given its payload seeds global-scope data first, so
    /// `meta-get` references in the document can interpolate it. A failing
    /// data URL is logged and skipped; a failing document puts the page in
    /// [`LoadState::Failed`].
    pub async fn load(&self, url: &str, data_url: Option<&str>) -> Result<(), LoadError> {
        self.state.replace(LoadState::Loading);
        if let Some(data_url) = data_url {
            self.load_initial_data(data_url).await;
        }
        let data = self.store().borrow().data(Scope::Global).clone();
        match self.loader.load(url, &data).await {
            Ok(raw) => self.load_document(&raw),
            Err(error) => {
                warn!(url, %error, "document load failed");
                self.state.replace(LoadState::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    async fn load_initial_data(&self, data_url: &str) {
        let endpoint = self.expand(data_url);
        debug!(endpoint = %endpoint, "loading initial data");
        match crate::action::dispatcher::settle(self.network.get(&endpoint, &Map::new()).await) {
            Ok(Value::Object(map)) => {
                self.store().borrow_mut().merge(Scope::Global, map);
            }
            Ok(_) => debug!(endpoint = %endpoint, "initial data is not an object, ignored"),
            Err(reason) => warn!(endpoint = %endpoint, %reason, "initial data failed"),
        }
    }

    /// Normalize and install a raw document.
    ///
    /// The modal registry and widget state are replaced; data already in the
    /// store is kept.
    pub fn load_document(&self, raw: &Value) -> Result<(), LoadError> {
        let document = match Normalizer::new(&self.config).normalize(raw) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "malformed metadata");
                self.state.replace(LoadState::Failed(error.to_string()));
                return Err(error.into());
            }
        };
        let mut registry = ModalRegistry::new();
        registry.register(document.modals.iter().cloned());
        *self.modals().borrow_mut() = registry;
        self.widgets.replace(WidgetState::new());
        info!(nodes = document.tree.len(), modals = document.modals.len(), "document ready");
        self.document.replace(Some(Rc::new(document)));
        self.state.replace(LoadState::Ready);
        Ok(())
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Resolve a dotted key path from the page root, e.g. `"profile.email"`.
    ///
    /// A path whose first segment names a modal resolves inside that modal's
    /// content instead.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let document = self.document()?;
        if let Some(id) = document.tree.find_by_path(document.root, path) {
            return Some(id);
        }
        let (modal, rest) = path.split_once('.').unwrap_or((path, ""));
        let content = document.modal(modal)?.content;
        document.tree.find_by_path(content, rest)
    }

    /// Bind node `id` to its current view.
    pub fn view(&self, id: NodeId) -> Option<WidgetView> {
        let document = self.document()?;
        let store = self.store().borrow();
        widgets::bind(&document.tree, id, &store, &self.widgets.borrow())
    }

    /// Current text of a label (or any widget's caption).
    pub fn label_text(&self, id: NodeId) -> Option<String> {
        let document = self.document()?;
        let node = document.tree.get(id)?;
        let store = self.store().borrow();
        Some(label::label_text(node, &store.context()))
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Run the click actions of node `id`.
    ///
    /// A disabled button dispatches nothing. A `submit` without a URL falls
    /// back to the enclosing form's `action`.
    pub async fn click(&self, id: NodeId) -> ChainEnd {
        let Some(document) = self.document() else {
            return ChainEnd::Completed;
        };
        let Some(node) = document.tree.get(id) else {
            return ChainEnd::Completed;
        };
        let view = button::ButtonView::bind(node, &self.store().borrow().context());
        if view.is_disabled() {
            debug!(key = %node.key, "click on disabled button ignored");
            return ChainEnd::Completed;
        }
        let cx = self.form_context(&document, id);
        self.dispatcher.dispatch(view.actions(), &cx).await
    }

    /// Write `value` into field `id` and validate it.
    ///
    /// Returns the validation messages, also recorded for renderers.
    pub fn input(&self, id: NodeId, value: Value) -> Vec<String> {
        let Some(document) = self.document() else {
            return Vec::new();
        };
        let Some(binding) = self.field_binding(&document, id) else {
            return Vec::new();
        };
        let Some(node) = document.tree.get(id) else {
            return Vec::new();
        };
        let messages = Validator::from_attributes(&node.attributes).validate(&value);
        self.store().borrow_mut().set(binding.scope, &binding.key, value);
        self.record_errors(id, messages.clone());
        messages
    }

    /// Validate field `id` against its current value.
    pub fn validate(&self, id: NodeId) -> Vec<String> {
        let Some(document) = self.document() else {
            return Vec::new();
        };
        let Some(binding) = self.field_binding(&document, id) else {
            return Vec::new();
        };
        let Some(node) = document.tree.get(id) else {
            return Vec::new();
        };
        let value = field_value(&self.store().borrow(), &binding, node);
        let messages = Validator::from_attributes(&node.attributes).validate(&value);
        self.record_errors(id, messages.clone());
        messages
    }

    /// Validate every field of form `id`, then run its submit actions.
    ///
    /// A `validate` message targeted at the form is broadcast first. The
    /// form's `action` is the fallback endpoint of a `submit` without a URL.
    pub async fn submit_form(&self, id: NodeId) -> SubmitOutcome {
        let Some(document) = self.document() else {
            return SubmitOutcome::Dispatched(ChainEnd::Completed);
        };
        let Some(node) = document.tree.get(id) else {
            return SubmitOutcome::Dispatched(ChainEnd::Completed);
        };
        self.bus()
            .publish(BroadcastMessage::new("validate", Some(node.key.clone()), json!({})));

        let invalid = form::form_fields(&document.tree, id)
            .into_iter()
            .filter(|&field| !self.validate(field).is_empty())
            .count();
        if invalid > 0 {
            debug!(form = %node.key, invalid, "form has invalid fields");
            return SubmitOutcome::Invalid { fields: invalid };
        }

        let actions = form::submit_actions(node);
        let cx = node
            .attributes
            .get_str("action")
            .map(DispatchContext::with_fallback_endpoint)
            .unwrap_or_default();
        SubmitOutcome::Dispatched(self.dispatcher.dispatch(&actions, &cx).await)
    }

    /// Initialize form `id`: seed from global data, fetch its remote source,
    /// then fill field defaults.
    pub async fn activate_form(&self, id: NodeId) {
        let Some(document) = self.document() else { return };
        let Some(node) = document.tree.get(id) else { return };
        let bindings = form::field_bindings(&document.tree, id);

        let seeded = form::seed_from_global(&mut self.store().borrow_mut(), &bindings);

        if let Some(source) = RemoteSource::of(node) {
            let endpoint = self.expand(&source.url);
            debug!(form = %node.key, endpoint = %endpoint, "loading form data");
            let reply = self.network.get(&endpoint, &source.params).await;
            match crate::action::dispatcher::settle(reply) {
                Ok(payload) => {
                    let mut store = self.store().borrow_mut();
                    for (key, value) in source.extract(&payload) {
                        store.set(Scope::Form, &key, value);
                    }
                }
                Err(reason) => warn!(form = %node.key, %reason, "form data failed"),
            }
        }

        let defaults = form::apply_defaults(&document.tree, &mut self.store().borrow_mut(), &bindings);
        debug!(form = %node.key, seeded, defaults, "form activated");
    }

    /// Load the rows of grid `id` into its state.
    pub async fn load_grid(&self, id: NodeId) {
        let Some(document) = self.document() else { return };
        let Some(node) = document.tree.get(id) else { return };
        match GridSource::of(node) {
            GridSource::Local { data_source } => {
                let rows = grid::local_rows(&self.store().borrow(), &data_source);
                self.widgets.borrow_mut().grids.insert(
                    id,
                    GridState {
                        rows,
                        ..GridState::default()
                    },
                );
            }
            GridSource::Remote { url, params } => {
                self.widgets.borrow_mut().grids.entry(id).or_default().loading = true;
                let endpoint = self.expand(&url);
                debug!(grid = %node.key, endpoint = %endpoint, "loading grid");
                let reply = self.network.get(&endpoint, &params).await;
                let mut widgets = self.widgets.borrow_mut();
                let state = widgets.grids.entry(id).or_default();
                state.loading = false;
                match reply {
                    Ok(envelope) if envelope.success => {
                        state.rows = grid::rows_of(&envelope.payload);
                        state.error = None;
                    }
                    Ok(_) => state.error = Some(GRID_LOAD_FAILED.to_owned()),
                    Err(error) => {
                        warn!(grid = %node.key, %error, "grid load failed");
                        state.error = Some(error.to_string());
                    }
                }
            }
        }
    }

    /// Select row `index` of grid `id`, broadcasting `gridRowSelect`.
    pub fn select_row(&self, id: NodeId, index: usize) -> bool {
        let Some(key) = self.key_of(id) else { return false };
        let payload = self.grid_state(id).and_then(|state| state.select_row(index));
        let Some(payload) = payload else { return false };
        self.bus()
            .publish(BroadcastMessage::new(grid::ROW_SELECT, Some(key), payload));
        true
    }

    /// Edit one cell of grid `id`, broadcasting `gridCellUpdate`.
    ///
    /// Returns `false` for read-only columns and missing rows.
    pub fn edit_cell(&self, id: NodeId, index: usize, column_id: &str, value: Value) -> bool {
        let Some(document) = self.document() else { return false };
        let Some(key) = self.key_of(id) else { return false };
        let Some(column) = grid::columns(&document.tree, id)
            .into_iter()
            .find(|c| c.id == column_id)
        else {
            return false;
        };
        if !self.widgets.borrow().grids.contains_key(&id) {
            let seeded = self.grid_state(id).unwrap_or_default();
            self.widgets.borrow_mut().grids.insert(id, seeded);
        }
        let payload = self
            .widgets
            .borrow_mut()
            .grids
            .get_mut(&id)
            .and_then(|state| state.edit_cell(index, &column, value));
        let Some(payload) = payload else { return false };
        self.bus()
            .publish(BroadcastMessage::new(grid::CELL_UPDATE, Some(key), payload));
        true
    }

    /// Fetch the options of select `id` when they come from a URL.
    ///
    /// A failed fetch leaves the select with no options.
    pub async fn load_options(&self, id: NodeId) {
        let Some(document) = self.document() else { return };
        let Some(node) = document.tree.get(id) else { return };
        let OptionsSource::Remote { url, params, mapping } = OptionsSource::of(node) else {
            return;
        };
        let endpoint = self.expand(&url);
        debug!(select = %node.key, endpoint = %endpoint, "loading options");
        let reply = self.network.get(&endpoint, &params).await;
        let options = match crate::action::dispatcher::settle(reply) {
            Ok(payload) => select::map_options(&payload, mapping.as_ref()),
            Err(reason) => {
                warn!(select = %node.key, %reason, "options failed");
                Vec::new()
            }
        };
        self.widgets.borrow_mut().options.insert(id, options);
    }

    /// Activate every widget in the page in document order: forms are
    /// initialized, grids and selects loaded.
    pub async fn mount(&self) {
        let Some(document) = self.document() else { return };
        for id in document.tree.walk_depth_first(document.root) {
            let Some(kind) = document.tree.get(id).map(|n| n.widget_type()) else {
                continue;
            };
            match kind {
                WidgetType::Form => self.activate_form(id).await,
                WidgetType::Grid => self.load_grid(id).await,
                WidgetType::Select => self.load_options(id).await,
                _ => {}
            }
        }
    }

    /// Close the topmost modal, as a click on the overlay does.
    pub fn dismiss_overlay(&self) -> Option<String> {
        self.modals().borrow_mut().close_topmost()
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Present the page through `renderer`.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        let state = self.state();
        match state {
            LoadState::Failed(message) => return renderer.render_error(&message),
            LoadState::Idle | LoadState::Loading => return renderer.render_loading(),
            LoadState::Ready => {}
        }
        let Some(document) = self.document() else {
            return renderer.render_loading();
        };
        let store = self.store().borrow();
        let widgets = self.widgets.borrow();
        let registry = self.modals().borrow();
        let modals: Vec<&ModalDefinition> = registry
            .active()
            .iter()
            .filter_map(|id| registry.get(id))
            .collect();
        renderer.render(&Frame {
            tree: &document.tree,
            root: document.root,
            store: &store,
            widgets: &widgets,
            modals: &modals,
        });
    }

    // ── Internals ────────────────────────────────────────────────────

    fn expand(&self, endpoint: &str) -> String {
        interpolate(endpoint, &self.store().borrow().context())
    }

    fn key_of(&self, id: NodeId) -> Option<String> {
        self.document()?.tree.get(id).map(|n| n.key.clone())
    }

    fn field_binding(&self, document: &Document, id: NodeId) -> Option<FieldBinding> {
        let node = document.tree.get(id)?;
        if !node.widget_type().is_field() {
            debug!(key = %node.key, "not a field");
            return None;
        }
        FieldBinding::resolve(&document.tree, id)
    }

    fn record_errors(&self, id: NodeId, messages: Vec<String>) {
        let mut widgets = self.widgets.borrow_mut();
        if messages.is_empty() {
            widgets.errors.remove(&id);
        } else {
            widgets.errors.insert(id, messages);
        }
    }

    /// Grid state, falling back to the rows a local grid would show.
    fn grid_state(&self, id: NodeId) -> Option<GridState> {
        if let Some(state) = self.widgets.borrow().grids.get(&id) {
            return Some(state.clone());
        }
        let document = self.document()?;
        match GridSource::of(document.tree.get(id)?) {
            GridSource::Local { data_source } => Some(GridState {
                rows: grid::local_rows(&self.store().borrow(), &data_source),
                ..GridState::default()
            }),
            GridSource::Remote { .. } => None,
        }
    }

    /// Dispatch context of a click inside the form enclosing `id`, if any.
    fn form_context(&self, document: &Document, id: NodeId) -> DispatchContext {
        document
            .tree
            .ancestors(id)
            .into_iter()
            .filter_map(|a| document.tree.get(a))
            .find(|n| n.widget_type() == WidgetType::Form)
            .and_then(|form| form.attributes.get_str("action"))
            .map(DispatchContext::with_fallback_endpoint)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("state", &*self.state.borrow())
            .field("nodes", &self.document().map_or(0, |d| d.tree.len()))
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
