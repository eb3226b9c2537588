use crate::store::{cell_text, is_filled, Sheet};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct DisqualificationReason {
    pub id: String,
    pub reason: String,
    pub is_active: bool,
}

fn first_of<'a>(sheet: &'a Sheet, row: usize, columns: &[&str]) -> &'a Value {
    columns
        .iter()
        .map(|c| sheet.value(row, c))
        .find(|v| is_filled(v))
        .unwrap_or(&Value::Null)
}

impl DisqualificationReason {
    /// Accepts both the canonical headers and the lowercase ones older
    /// sheets were created with. Rows with neither id nor text are skipped.
    pub fn from_row(sheet: &Sheet, row: usize) -> Option<Self> {
        let id = cell_text(first_of(sheet, row, &["ID", "id"]));
        let reason = cell_text(first_of(sheet, row, &["Motivo", "motivo"]));
        if id.is_empty() && reason.is_empty() {
            return None;
        }
        let active = first_of(sheet, row, &["Ativo", "ativo"]);
        Some(Self {
            id,
            reason,
            is_active: is_active(active),
        })
    }
}

/// `Sim`, `TRUE`/`true` or a real boolean mark an active reason.
fn is_active(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim(), "Sim" | "sim" | "TRUE" | "true"),
        _ => false,
    }
}
