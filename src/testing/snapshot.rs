//! Snapshot rendering helpers.
//!
//! Functions for converting a page (or one of its modals) into the plain-text
//! outline used by snapshot tests.

use crate::page::Page;
use crate::render::{render_outline, Frame, OutlineRenderer, Renderer};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a page through an [`OutlineRenderer`].
///
/// A page that failed to load renders as `error: <message>`, one that has not
/// finished loading as `loading`.
///
/// # Examples
///
/// ```ignore
/// use pagemaker::testing::{render_to_string, Pilot};
///
/// let pilot = Pilot::from_document(json!({"pm::Type": "label", "pm::Meta": {"label": "Hi"}}));
/// assert_eq!(render_to_string(pilot.page()), r#"label root <span> "Hi""#);
/// ```
pub fn render_to_string(page: &Page) -> String {
    let mut renderer = OutlineRenderer::new();
    page.render(&mut renderer);
    renderer.output().to_owned()
}

/// Render the content of modal `id` on its own, whether or not it is open.
///
/// Returns `None` when no document is loaded or the modal is not declared.
pub fn render_modal(page: &Page, id: &str) -> Option<String> {
    let document = page.document()?;
    let modal = document.modal(id)?;
    let store = page.store().borrow();
    let widgets = page.widget_state();
    Some(render_outline(&Frame {
        tree: &document.tree,
        root: modal.content,
        store: &store,
        widgets: &widgets,
        modals: &[],
    }))
}

/// Render `page` into `renderer` and return how many passes that added.
pub fn count_passes(page: &Page, renderer: &mut OutlineRenderer) -> usize {
    let before = renderer.passes();
    page.render(renderer as &mut dyn Renderer);
    renderer.passes() - before
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Pilot;
    use serde_json::json;

    // ── render_to_string ─────────────────────────────────────────────

    #[test]
    fn renders_a_loaded_page() {
        let pilot = Pilot::from_document(json!({
            "pm::Type": "label", "pm::Meta": {"label": "Hello {who}"}
        }))
        .with_data(json!({"who": "world"}));
        assert_eq!(render_to_string(pilot.page()), r#"label root <span> "Hello world""#);
    }

    #[test]
    fn renders_the_error_state() {
        let pilot = Pilot::from_document(json!("not a document"));
        assert!(render_to_string(pilot.page()).starts_with("error: "));
    }

    #[test]
    fn idle_page_renders_loading() {
        let pilot = Pilot::new();
        assert_eq!(render_to_string(pilot.page()), "loading");
    }

    // ── render_modal ─────────────────────────────────────────────────

    #[test]
    fn modal_renders_without_opening() {
        let pilot = Pilot::from_document(json!({
            "pm::Type": "container",
            "pm::Modals": {"help": {"pm::Type": "label", "pm::Meta": {"label": "Need help?"}}}
        }));
        assert_eq!(
            render_modal(pilot.page(), "help").as_deref(),
            Some(r#"label help <span> "Need help?""#)
        );
        assert_eq!(render_modal(pilot.page(), "nope"), None);
    }

    // ── count_passes ─────────────────────────────────────────────────

    #[test]
    fn one_pass_per_render() {
        let pilot = Pilot::from_document(json!({"pm::Type": "container"}));
        let mut renderer = OutlineRenderer::new();
        assert_eq!(count_passes(pilot.page(), &mut renderer), 1);
        assert_eq!(count_passes(pilot.page(), &mut renderer), 1);
        assert_eq!(renderer.passes(), 2);
    }
}
