//! Pilot: programmatic interaction with a headless Page.
//!
//! The `Pilot` wraps a [`Page`] wired to a [`ScriptedNetwork`] and a
//! [`RecordingNavigator`], and provides methods to simulate user input
//! (typing, clicks, submits, overlay dismissal) addressed by key path, run
//! widget activation, and render the page to text for snapshot testing.

use std::rc::Rc;

use serde_json::Value;

use super::{render_to_string, RecordingNavigator, ScriptedNetwork};
use crate::action::ChainEnd;
use crate::config::EngineConfig;
use crate::meta::NodeId;
use crate::page::{LoadError, Page, SubmitOutcome};
use crate::store::Scope;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless page driver for testing.
///
/// Widgets are addressed by their dotted key path from the page root (see
/// [`Page::find`]). Addressing a path that does not exist panics, so a typo in
/// a test fails loudly instead of silently doing nothing.
///
/// # Examples
///
/// ```ignore
/// use pagemaker::testing::Pilot;
///
/// let pilot = Pilot::from_document(json!({
///     "pm::Type": "form",
///     "email": {"pm::Type": "email"}
/// }));
/// pilot.type_into("email", "ada@example.com");
/// assert_eq!(pilot.form_value("email"), Some(json!("ada@example.com")));
/// ```
pub struct Pilot {
    page: Page,
    network: Rc<ScriptedNetwork>,
    navigator: Rc<RecordingNavigator>,
}

impl Pilot {
    /// Create a pilot around an empty page with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Create a pilot from an [`EngineConfig`].
    pub fn with_config(config: EngineConfig) -> Self {
        let network = Rc::new(ScriptedNetwork::new());
        let navigator = Rc::new(RecordingNavigator::new());
        let page = Page::new(config, network.clone(), navigator.clone());
        Self {
            page,
            network,
            navigator,
        }
    }

    /// Create a pilot and install `raw` as its document.
    ///
    /// A malformed document leaves the page in its failed state, which is
    /// itself worth asserting on.
    pub fn from_document(raw: Value) -> Self {
        let pilot = Self::new();
        let _ = pilot.page.load_document(&raw);
        pilot
    }

    /// Seed global-scope data.
    pub fn with_data(self, global: Value) -> Self {
        let Self {
            page,
            network,
            navigator,
        } = self;
        Self {
            page: page.with_data(global),
            network,
            navigator,
        }
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the document at `url` through the scripted network.
    pub async fn load(&self, url: &str) -> Result<(), LoadError> {
        self.page.load(url, None).await
    }

    /// Activate every widget: forms initialize, grids and selects load.
    pub async fn mount(&self) {
        self.page.mount().await;
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Type `text` into the field at `path`, returning its validation
    /// messages.
    pub fn type_into(&self, path: &str, text: &str) -> Vec<String> {
        self.page.input(self.node(path), Value::String(text.to_owned()))
    }

    /// Set the field at `path` to an arbitrary value (checkboxes, numbers).
    pub fn set_value(&self, path: &str, value: Value) -> Vec<String> {
        self.page.input(self.node(path), value)
    }

    /// Click the widget at `path`.
    pub async fn click(&self, path: &str) -> ChainEnd {
        self.page.click(self.node(path)).await
    }

    /// Submit the form at `path`.
    pub async fn submit(&self, path: &str) -> SubmitOutcome {
        self.page.submit_form(self.node(path)).await
    }

    /// Click the modal overlay, closing the topmost modal.
    pub fn dismiss(&self) -> Option<String> {
        self.page.dismiss_overlay()
    }

    /// Select row `index` of the grid at `path`.
    pub fn select_row(&self, path: &str, index: usize) -> bool {
        self.page.select_row(self.node(path), index)
    }

    /// Edit one cell of the grid at `path`.
    pub fn edit_cell(&self, path: &str, index: usize, column: &str, value: Value) -> bool {
        self.page.edit_cell(self.node(path), index, column, value)
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn network(&self) -> &ScriptedNetwork {
        &self.network
    }

    pub fn navigator(&self) -> &RecordingNavigator {
        &self.navigator
    }

    /// Resolve `path` to a node, panicking when it does not exist.
    pub fn node(&self, path: &str) -> NodeId {
        match self.page.find(path) {
            Some(id) => id,
            None => panic!("no widget at path {path:?}"),
        }
    }

    pub fn form_value(&self, path: &str) -> Option<Value> {
        self.page.store().borrow().get(Scope::Form, path).cloned()
    }

    pub fn global_value(&self, path: &str) -> Option<Value> {
        self.page.store().borrow().get(Scope::Global, path).cloned()
    }

    /// Ids of the open modals, bottom first.
    pub fn open_modals(&self) -> Vec<String> {
        self.page.modals().borrow().active().to_vec()
    }

    /// Validation messages last recorded for the field at `path`.
    pub fn errors(&self, path: &str) -> Vec<String> {
        self.page.errors(self.node(path))
    }

    // ── Render helpers ───────────────────────────────────────────────

    /// Render the page as an outline.
    pub fn render(&self) -> String {
        render_to_string(&self.page)
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
