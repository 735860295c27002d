//! Outline renderer: one line per widget, indented by depth.
//!
//! ```text
//! form profile "Profile" -> /users
//!   input email [email] = "" *
//!     ! This field is required
//!   button save "Save"
//! ```

use std::fmt::Write as _;

use serde_json::Value;

use super::{Frame, Renderer};
use crate::meta::NodeId;
use crate::value::display;
use crate::widgets::{self, WidgetView};

/// Render `frame` as an indented text outline. Active modals follow the page,
/// each under a `modal` line.
pub fn render_outline(frame: &Frame<'_>) -> String {
    let mut out = String::new();
    write_node(frame, frame.root, 0, &mut out);
    for modal in frame.modals {
        let _ = write!(out, "modal {}", modal.id);
        if let Some(title) = &modal.title {
            let _ = write!(out, " \"{title}\"");
        }
        out.push('\n');
        write_node(frame, modal.content, 1, &mut out);
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_node(frame: &Frame<'_>, id: NodeId, depth: usize, out: &mut String) {
    let (Some(node), Some(view)) = (
        frame.tree.get(id),
        widgets::bind(frame.tree, id, frame.store, frame.widgets),
    ) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}");
    match &view {
        WidgetView::Container { kind, label } => {
            let _ = write!(out, "{kind} {}", node.key);
            if let Some(label) = label {
                let _ = write!(out, " \"{label}\"");
            }
        }
        WidgetView::Form(form) => {
            let _ = write!(out, "form {}", node.key);
            if let Some(label) = &form.label {
                let _ = write!(out, " \"{label}\"");
            }
            if let Some(action) = &form.action {
                let _ = write!(out, " -> {action}");
            }
        }
        WidgetView::Input(input) => {
            let _ = write!(
                out,
                "{} {} [{}] = \"{}\"",
                node.widget_type(),
                input.binding.key,
                input.kind.as_html_type(),
                input.display_value()
            );
            if input.required {
                out.push_str(" *");
            }
        }
        WidgetView::Select(select) => {
            let _ = write!(out, "select {} = \"{}\"", select.binding.key, display_or_empty(&select.value));
            let labels: Vec<&str> = select.options.iter().map(|o| o.label.as_str()).collect();
            let _ = write!(out, " [{}]", labels.join(", "));
        }
        WidgetView::Label(label) => {
            let _ = write!(out, "label {} <{}> \"{}\"", node.key, label.element, label.text);
        }
        WidgetView::Button(button) => {
            let _ = write!(out, "button {} \"{}\"", node.key, button.caption());
            if button.is_disabled() {
                out.push_str(" (disabled)");
            }
        }
        WidgetView::Grid(grid) => {
            let _ = write!(out, "grid {} ({} rows)", node.key, grid.rows.len());
            if grid.loading {
                out.push_str(" loading");
            }
            if let Some(error) = &grid.error {
                let _ = write!(out, " error: {error}");
            }
            let headers: Vec<&str> = grid.visible_columns().map(|c| c.label.as_str()).collect();
            let _ = write!(out, "\n{indent}  | {} |", headers.join(" | "));
            for index in 0..grid.rows.len() {
                let cells = grid.formatted_row(index).unwrap_or_default();
                let _ = write!(out, "\n{indent}  | {} |", cells.join(" | "));
            }
        }
    }
    out.push('\n');
    for message in frame.widgets.errors(id) {
        let _ = writeln!(out, "{indent}  ! {message}");
    }
    if widgets::renders_children(node.widget_type()) {
        for &child in frame.tree.children(id) {
            write_node(frame, child, depth + 1, out);
        }
    }
}

fn display_or_empty(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => display(other),
    }
}

/// A [`Renderer`] that keeps the latest outline as text.
#[derive(Debug, Clone, Default)]
pub struct OutlineRenderer {
    output: String,
    passes: usize,
}

impl OutlineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the latest pass.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// How many passes have been rendered.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl Renderer for OutlineRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        self.output = render_outline(frame);
        self.passes += 1;
    }

    fn render_error(&mut self, message: &str) {
        self.output = format!("error: {message}");
        self.passes += 1;
    }

    fn render_loading(&mut self) {
        self.output = "loading".to_owned();
        self.passes += 1;
    }
}
