//! `[NOME]`, `[CARGO]` and `[AREA]` substitution for message templates.

use crate::store::{cell_text, is_filled, Record};
use serde_json::Value;

pub const NAME_TOKEN: &str = "[NOME]";
pub const ROLE_TOKEN: &str = "[CARGO]";
pub const AREA_TOKEN: &str = "[AREA]";

fn first_text(candidate: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| candidate.get(*k))
        .find(|v| is_filled(v))
        .map(cell_text)
}

pub fn candidate_name(candidate: &Record) -> String {
    first_text(candidate, &["NOMECOMPLETO", "nome_completo", "full_name", "name"])
        .unwrap_or_else(|| "Candidato".to_string())
}

/// A cargo flag column is either the role title or a bare boolean marker.
fn cargo_flag(candidate: &Record, key: &str, label: &str) -> Option<String> {
    match candidate.get(key)? {
        Value::String(s) if !s.is_empty() && s != "false" => Some(s.clone()),
        Value::Bool(true) => Some(label.to_string()),
        _ => None,
    }
}

pub fn candidate_role(candidate: &Record) -> String {
    cargo_flag(candidate, "cargo_administrativo", "Administrativo")
        .or_else(|| cargo_flag(candidate, "cargo_assistencial", "Assistencial"))
        .or_else(|| first_text(candidate, &["CARGOPRETENDIDO"]))
        .unwrap_or_else(|| "Cargo não especificado".to_string())
}

pub fn candidate_area(candidate: &Record) -> String {
    first_text(candidate, &["area_atuacao_pretendida", "AREAATUACAO"])
        .unwrap_or_else(|| "área de interesse".to_string())
}

/// Replaces every known token; anything else in brackets is left as is.
pub fn personalize(template: &str, candidate: &Record) -> String {
    template
        .replace(NAME_TOKEN, &candidate_name(candidate))
        .replace(ROLE_TOKEN, &candidate_role(candidate))
        .replace(AREA_TOKEN, &candidate_area(candidate))
}
