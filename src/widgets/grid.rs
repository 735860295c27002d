//! Grid widget: columns declared as children, rows from data or a remote
//! source, typed cell formatting, row selection and cell edits.

use serde_json::{json, Map, Value};

use crate::format::format_value;
use crate::meta::{NodeData, NodeId, WidgetTree};
use crate::path;
use crate::store::{DataStore, Scope};
use crate::value::{display, is_truthy};

/// Broadcast action published when a row is selected.
pub const ROW_SELECT: &str = "gridRowSelect";
/// Broadcast action published after an editable cell changes.
pub const CELL_UPDATE: &str = "gridCellUpdate";

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The child key.
    pub id: String,
    /// Dotted path into each row; defaults to `id`.
    pub field: String,
    pub label: String,
    /// Cell format (`text`, `currency`, `number`, `date`, ...).
    pub column_type: String,
    pub width: Option<String>,
    pub editable: bool,
    pub hidden: bool,
}

impl Column {
    pub fn from_node(node: &NodeData) -> Self {
        let attrs = &node.attributes;
        let column_type = attrs
            .first_str(&["type", "format"])
            .map(str::to_owned)
            .or_else(|| node.source_tag.as_deref().map(str::to_lowercase))
            .unwrap_or_else(|| "text".to_owned());
        Self {
            field: attrs.get_str("field").unwrap_or(&node.key).to_owned(),
            label: attrs.get_str("label").unwrap_or(&node.key).to_owned(),
            id: node.key.clone(),
            column_type,
            width: attrs.get("width").filter(|w| !w.is_null()).map(display),
            editable: attrs.get("editable").is_some_and(is_truthy),
            hidden: attrs.get("hidden").is_some_and(is_truthy),
        }
    }
}

/// Columns of grid `id`, in declaration order.
pub fn columns(tree: &WidgetTree, id: NodeId) -> Vec<Column> {
    tree.children(id)
        .iter()
        .filter_map(|&child| tree.get(child))
        .map(Column::from_node)
        .collect()
}

static MISSING: Value = Value::Null;

/// The cell at `column` in `row`; `Null` when the path is missing.
pub fn cell_value<'r>(row: &'r Value, column: &Column) -> &'r Value {
    path::get(row, &column.field).unwrap_or(&MISSING)
}

/// Format a cell for display under its column type.
pub fn format_cell(value: &Value, column: &Column) -> String {
    match value {
        Value::Null => String::new(),
        _ => format_value(value, &column.column_type),
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Where a grid gets its rows.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSource {
    /// `data-get`: a URL, or `{url, params}`.
    Remote { url: String, params: Map<String, Value> },
    /// `dataSource` (default: the grid's key), read from the store.
    Local { data_source: String },
}

impl GridSource {
    pub fn of(node: &NodeData) -> Self {
        let remote = match node.attributes.first(&["data-get", "dataGet"]) {
            Some(Value::String(url)) => Some((url.clone(), Map::new())),
            Some(Value::Object(spec)) => spec.get("url").and_then(Value::as_str).map(|url| {
                let params = spec.get("params").and_then(Value::as_object).cloned();
                (url.to_owned(), params.unwrap_or_default())
            }),
            _ => None,
        };
        match remote {
            Some((url, params)) => Self::Remote { url, params },
            None => Self::Local {
                data_source: node
                    .attributes
                    .get_str("dataSource")
                    .unwrap_or(&node.key)
                    .to_owned(),
            },
        }
    }
}

/// Rows held in the store under `data_source`: global scope first, then form
/// scope. Anything but an array is no rows.
pub fn local_rows(store: &DataStore, data_source: &str) -> Vec<Value> {
    let found = store
        .get(Scope::Global, data_source)
        .filter(|v| is_truthy(v))
        .or_else(|| store.get(Scope::Form, data_source));
    rows_of(found.unwrap_or(&Value::Null))
}

/// Rows of a fetched payload. Anything but an array is no rows.
pub fn rows_of(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows.clone(),
        _ => Vec::new(),
    }
}

/// Per-grid state kept between loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridState {
    pub rows: Vec<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

impl GridState {
    /// Payload of a row selection, or `None` when `index` is out of range.
    pub fn select_row(&self, index: usize) -> Option<Value> {
        let row = self.rows.get(index)?;
        Some(json!({ "row": row, "rowIndex": index }))
    }

    /// Write `value` into the cell, returning the update payload.
    ///
    /// Read-only columns and missing rows are ignored.
    pub fn edit_cell(&mut self, index: usize, column: &Column, value: Value) -> Option<Value> {
        if !column.editable {
            return None;
        }
        let row = self.rows.get_mut(index)?;
        path::set(row, &column.field, value.clone());
        Some(json!({
            "rowIndex": index,
            "field": column.field,
            "value": value,
            "row": row,
        }))
    }
}

// ---------------------------------------------------------------------------
// GridView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub columns: Vec<Column>,
    pub rows: Vec<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

impl GridView {
    /// Bind grid `id`. A loaded grid shows its `state`; a local grid that was
    /// never loaded reads the store directly.
    pub fn bind(
        tree: &WidgetTree,
        id: NodeId,
        store: &DataStore,
        state: Option<&GridState>,
    ) -> Option<Self> {
        let node = tree.get(id)?;
        let (rows, loading, error) = match (state, GridSource::of(node)) {
            (Some(state), _) => (state.rows.clone(), state.loading, state.error.clone()),
            (None, GridSource::Remote { .. }) => (Vec::new(), false, None),
            (None, GridSource::Local { data_source }) => (local_rows(store, &data_source), false, None),
        };
        Some(Self {
            columns: columns(tree, id),
            rows,
            loading,
            error,
        })
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    /// Formatted cells of row `index`, visible columns only.
    pub fn formatted_row(&self, index: usize) -> Option<Vec<String>> {
        let row = self.rows.get(index)?;
        Some(
            self.visible_columns()
                .map(|column| format_cell(cell_value(row, column), column))
                .collect(),
        )
    }
}
