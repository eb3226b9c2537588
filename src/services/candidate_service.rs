use crate::dto::action_dto::{AllocationPayload, CandidateFilter, ScreeningPayload, TriageStatusPayload};
use crate::dto::params::Params;
use crate::error::{Error, Result};
use crate::models::candidate::{
    KEY_COLUMN, KEY_PARAMS, NAME_COLUMN, TRIAGE_CLASSIFIED, WORKFLOW_IN_REVIEW, WORKFLOW_PENDING,
};
use crate::store::schema::SHEET_CANDIDATES;
use crate::store::{cell_text, is_filled, Record, Sheet, Workbook};
use crate::utils::time::now_iso;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePage {
    pub candidates: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

#[derive(Clone)]
pub struct CandidateService {
    workbook: Workbook,
}

pub(crate) fn candidate_not_found() -> Error {
    Error::NotFound("Candidato não encontrado".to_string())
}

fn text_of(record: &Record, column: &str) -> String {
    record.get(column).map(cell_text).unwrap_or_default()
}

fn matches_filter(record: &Record, filter: &CandidateFilter) -> bool {
    let exact = |wanted: &Option<String>, columns: &[&str]| match wanted {
        Some(value) => columns.iter().any(|c| text_of(record, c) == *value),
        None => true,
    };
    if !exact(&filter.status, &["Status", "status_triagem"])
        || !exact(&filter.area, &["AREAATUACAO"])
        || !exact(&filter.cargo, &["CARGOPRETENDIDO"])
        || !exact(&filter.pcd, &["VAGAPCD"])
        || !exact(&filter.assigned_to, &["assigned_to"])
    {
        return false;
    }
    match &filter.search {
        Some(term) => {
            let term = term.to_lowercase();
            ["NOMECOMPLETO", "NOMESOCIAL", "CPF", "CARGOPRETENDIDO"]
                .iter()
                .any(|c| text_of(record, c).to_lowercase().contains(&term))
        }
        None => true,
    }
}

impl CandidateService {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    pub(crate) async fn sheet(&self) -> Result<Sheet> {
        self.workbook
            .load(SHEET_CANDIDATES)
            .await?
            .ok_or_else(|| Error::NotFound("Planilha de candidatos não encontrada".to_string()))
    }

    /// Every candidate row; an absent sheet reads as empty.
    pub async fn all(&self) -> Result<Vec<Record>> {
        Ok(match self.workbook.load(SHEET_CANDIDATES).await? {
            Some(sheet) => sheet.records(),
            None => Vec::new(),
        })
    }

    pub async fn list(&self, filter: &CandidateFilter) -> Result<CandidatePage> {
        let candidates: Vec<Record> = self
            .all()
            .await?
            .into_iter()
            .filter(|c| {
                [KEY_COLUMN, NAME_COLUMN]
                    .iter()
                    .any(|k| c.get(*k).map(is_filled).unwrap_or(false))
            })
            .filter(|c| matches_filter(c, filter))
            .collect();

        if !filter.is_paginated() {
            return Ok(CandidatePage {
                candidates,
                total: None,
                page: None,
                page_size: None,
            });
        }

        let total = candidates.len();
        let page = filter.page.unwrap_or(1);
        let page_size = filter.page_size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        let candidates = candidates
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Ok(CandidatePage {
            candidates,
            total: Some(total),
            page: Some(page),
            page_size: Some(page_size),
        })
    }

    pub async fn get(&self, id: &str) -> Result<Record> {
        let sheet = self.sheet().await?;
        let row = sheet.find_row(KEY_COLUMN, id).ok_or_else(candidate_not_found)?;
        Ok(sheet.record(row))
    }

    /// Rows whose triage status equals `status` exactly.
    pub async fn by_status(&self, status: &str) -> Result<Vec<Record>> {
        self.where_equals("status_triagem", status).await
    }

    pub(crate) async fn where_equals(&self, column: &str, value: &str) -> Result<Vec<Record>> {
        let Some(sheet) = self.workbook.load(SHEET_CANDIDATES).await? else {
            return Ok(Vec::new());
        };
        Ok(sheet
            .rows_where(column, value)
            .into_iter()
            .map(|row| sheet.record(row))
            .collect())
    }

    /// Appends a row built from the parameters named like the sheet's headers.
    pub async fn add(&self, params: &Params) -> Result<()> {
        let sheet = self.sheet().await?;
        if let Some(cpf) = params.text(&[KEY_COLUMN]) {
            if sheet.find_row(KEY_COLUMN, &cpf).is_some() {
                return Err(Error::AlreadyExists("Candidato já existe".to_string()));
            }
        }

        let timestamp = Value::String(now_iso());
        let mut record = Record::new();
        for header in &sheet.headers {
            let value = match header.as_str() {
                "DataCadastro" | "created_at" | "updated_at" => timestamp.clone(),
                "Status" if params.text(&["Status"]).is_none() => {
                    Value::String(WORKFLOW_PENDING.to_string())
                }
                _ => params
                    .get(header)
                    .filter(|v| is_filled(v))
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new())),
            };
            record.insert(header.clone(), value);
        }
        self.workbook.append_record(&sheet, &record).await?;
        info!(cpf = %text_of(&record, KEY_COLUMN), "candidate added");
        Ok(())
    }

    /// Writes every parameter that names a column, then stamps `updated_at`.
    pub async fn update(&self, id: &str, params: &Params) -> Result<usize> {
        let sheet = self.sheet().await?;
        let row = sheet.find_row(KEY_COLUMN, id).ok_or_else(candidate_not_found)?;

        let mut fields: Vec<(&str, Value)> = params
            .iter()
            .filter(|(key, _)| !KEY_PARAMS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        fields.push(("updated_at", Value::String(now_iso())));

        let written = self.workbook.set_fields(&sheet, row, &fields).await?;
        info!(cpf = %id, fields = written, "candidate updated");
        Ok(written)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let sheet = self.sheet().await?;
        let row = sheet.find_row(KEY_COLUMN, id).ok_or_else(candidate_not_found)?;
        self.workbook.delete_row(&sheet, row).await?;
        info!(cpf = %id, "candidate deleted");
        Ok(())
    }

    /// Writes `fields` on every row whose CPF is in `ids`; returns how many
    /// rows matched. Unknown ids are ignored.
    pub(crate) async fn stamp_rows(&self, ids: &[String], fields: &[(&str, Value)]) -> Result<usize> {
        let sheet = self.sheet().await?;
        let Some(key_col) = sheet.column(KEY_COLUMN) else {
            return Ok(0);
        };

        let mut updated = 0;
        for row in 0..sheet.len() {
            let cell = sheet.cell(row, key_col);
            if is_filled(cell) && ids.iter().any(|id| *id == cell_text(cell)) {
                self.workbook.set_fields(&sheet, row, fields).await?;
                updated += 1;
            }
        }
        debug!(requested = ids.len(), updated, "rows stamped");
        Ok(updated)
    }

    pub async fn assign(&self, payload: &AllocationPayload) -> Result<usize> {
        let timestamp = Value::String(now_iso());
        let mut fields: Vec<(&str, Value)> = vec![("assigned_to", Value::String(payload.assignee.clone()))];
        if let Some(admin) = &payload.assigned_by {
            fields.push(("assigned_by", Value::String(admin.clone())));
        }
        fields.push(("assigned_at", timestamp.clone()));
        fields.push(("Status", Value::String(WORKFLOW_IN_REVIEW.to_string())));
        fields.push(("updated_at", timestamp));

        let updated = self.stamp_rows(&payload.candidate_ids, &fields).await?;
        info!(analyst = %payload.assignee, updated, "candidates assigned");
        Ok(updated)
    }

    /// Each update carries the candidate `id` plus the columns to set.
    pub async fn bulk_update(&self, updates: &[Record]) -> Result<usize> {
        let sheet = self.sheet().await?;
        let mut updated = 0;
        for update in updates {
            let id = text_of(update, "id");
            let Some(row) = sheet.find_row(KEY_COLUMN, &id) else {
                continue;
            };
            let fields: Vec<(&str, Value)> = update
                .iter()
                .filter(|(key, _)| key.as_str() != "id")
                .map(|(key, value)| (key.as_str(), value.clone()))
                .collect();
            self.workbook.set_fields(&sheet, row, &fields).await?;
            updated += 1;
        }
        info!(requested = updates.len(), updated, "bulk candidate update");
        Ok(updated)
    }

    pub async fn update_status(&self, payload: &TriageStatusPayload) -> Result<()> {
        let sheet = self.sheet().await?;
        let row = sheet
            .find_row(KEY_COLUMN, &payload.registration_number)
            .ok_or_else(candidate_not_found)?;

        let timestamp = Value::String(now_iso());
        let mut fields: Vec<(&str, Value)> = vec![
            ("status_triagem", Value::String(payload.status.clone())),
            ("data_hora_triagem", timestamp.clone()),
        ];
        if let Some(analyst) = &payload.analyst_email {
            fields.push(("analista_triagem", Value::String(analyst.clone())));
        }
        if let Some(reason) = &payload.reason_id {
            fields.push(("motivo_desclassificacao", Value::String(reason.clone())));
        }
        if let Some(notes) = &payload.notes {
            fields.push(("observacoes_triagem", Value::String(notes.clone())));
        }
        fields.push(("updated_at", timestamp));

        self.workbook.set_fields(&sheet, row, &fields).await?;
        info!(cpf = %payload.registration_number, status = %payload.status, "triage status updated");
        Ok(())
    }

    /// Scores are only recorded for classified candidates.
    pub async fn save_screening(&self, payload: &ScreeningPayload) -> Result<()> {
        let sheet = self.sheet().await?;
        let row = sheet
            .find_row(KEY_COLUMN, &payload.registration_number)
            .ok_or_else(candidate_not_found)?;

        let timestamp = now_iso();
        let mut fields: Vec<(&str, Value)> = vec![
            ("status_triagem", Value::String(payload.status.clone())),
            (
                "data_hora_triagem",
                Value::String(payload.screened_at.clone().unwrap_or_else(|| timestamp.clone())),
            ),
        ];
        if let Some(analyst) = &payload.analyst_email {
            fields.push(("analista_triagem", Value::String(analyst.clone())));
        }
        for (key, value) in &payload.documents {
            fields.push((key.as_str(), value.clone()));
        }
        if payload.status == TRIAGE_CLASSIFIED {
            let scores = [
                ("capacidade_tecnica", &payload.technical_capacity),
                ("experiencia", &payload.experience),
                ("pontuacao_total", &payload.total_score),
            ];
            for (column, value) in scores {
                if let Some(value) = value {
                    fields.push((column, value.clone()));
                }
            }
        }
        if let Some(notes) = &payload.notes {
            fields.push(("observacoes_triagem", Value::String(notes.clone())));
        }
        fields.push(("updated_at", Value::String(timestamp)));

        self.workbook.set_fields(&sheet, row, &fields).await?;
        info!(cpf = %payload.registration_number, status = %payload.status, "screening saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    const HEADERS: &[&str] = &[
        "CPF",
        "NOMECOMPLETO",
        "CARGOPRETENDIDO",
        "Status",
        "status_triagem",
        "data_hora_triagem",
        "analista_triagem",
        "motivo_desclassificacao",
        "observacoes_triagem",
        "capacidade_tecnica",
        "assigned_to",
        "assigned_by",
        "assigned_at",
        "DataCadastro",
        "updated_at",
    ];

    fn row(cpf: &str, name: &str, triage: &str) -> Vec<Value> {
        let mut values = vec![json!(""); HEADERS.len()];
        values[0] = json!(cpf);
        values[1] = json!(name);
        values[2] = json!("Enfermeiro");
        values[3] = json!("pendente");
        values[4] = json!(triage);
        values
    }

    fn fixture() -> (Arc<MemoryStore>, CandidateService) {
        let store = Arc::new(MemoryStore::new().with_sheet(
            SHEET_CANDIDATES,
            HEADERS,
            vec![
                row("111", "Maria Souza", "Classificado"),
                row("222", "João Lima", "classificado"),
                row("333", "Paula Reis", ""),
                row("", "", ""),
            ],
        ));
        let service = CandidateService::new(Workbook::new(store.clone()));
        (store, service)
    }

    fn params(value: Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    fn column(name: &str) -> usize {
        HEADERS.iter().position(|h| *h == name).unwrap()
    }

    #[tokio::test]
    async fn list_skips_blank_rows_and_paginates_on_request() {
        let (_, service) = fixture();
        let all = service.list(&CandidateFilter::default()).await.unwrap();
        assert_eq!(all.candidates.len(), 3);
        assert!(all.total.is_none());

        let filter = CandidateFilter {
            search: Some("souza".into()),
            ..Default::default()
        };
        assert_eq!(service.list(&filter).await.unwrap().candidates.len(), 1);

        let paged = CandidateFilter {
            page: Some(2),
            page_size: Some(2),
            ..Default::default()
        };
        let page = service.list(&paged).await.unwrap();
        assert_eq!(page.total, Some(3));
        assert_eq!(page.candidates.len(), 1);
        assert_eq!(page.candidates[0]["CPF"], json!("333"));
    }

    #[tokio::test]
    async fn status_filter_is_exact_and_case_sensitive() {
        let (_, service) = fixture();
        let rows = service.by_status("Classificado").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["CPF"], json!("111"));
        assert!(service.by_status("CLASSIFICADO").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_update_touches_only_provided_fields() {
        let (store, service) = fixture();
        service
            .update_status(&TriageStatusPayload {
                registration_number: "333".into(),
                status: "Desclassificado".into(),
                reason_id: Some("M004".into()),
                notes: None,
                analyst_email: None,
            })
            .await
            .unwrap();

        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        let updated = &grid[3];
        assert_eq!(updated[column("status_triagem")], json!("Desclassificado"));
        assert_eq!(updated[column("motivo_desclassificacao")], json!("M004"));
        assert_eq!(updated[column("observacoes_triagem")], json!(""));
        assert_eq!(updated[column("analista_triagem")], json!(""));
        assert_eq!(updated[column("NOMECOMPLETO")], json!("Paula Reis"));
        assert_ne!(updated[column("updated_at")], json!(""));
        // Neighbouring rows untouched.
        assert_eq!(grid[2][column("status_triagem")], json!("classificado"));
    }

    #[tokio::test]
    async fn add_rejects_duplicate_cpf_and_fills_defaults() {
        let (store, service) = fixture();
        let duplicate = service.add(&params(json!({ "CPF": "111" }))).await;
        assert!(matches!(duplicate, Err(Error::AlreadyExists(_))));

        service
            .add(&params(json!({ "CPF": "444", "NOMECOMPLETO": "Nina", "ignored": "x" })))
            .await
            .unwrap();
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        let added = grid.last().unwrap();
        assert_eq!(added[column("CPF")], json!("444"));
        assert_eq!(added[column("Status")], json!("pendente"));
        assert_ne!(added[column("DataCadastro")], json!(""));
        assert_eq!(added.len(), HEADERS.len());
    }

    #[tokio::test]
    async fn update_ignores_key_params_and_unknown_columns() {
        let (store, service) = fixture();
        let written = service
            .update(
                "222",
                &params(json!({ "action": "updateCandidate", "CPF": "222", "NOMECOMPLETO": "João P. Lima", "nope": 1 })),
            )
            .await
            .unwrap();
        assert_eq!(written, 2);
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert_eq!(grid[2][column("NOMECOMPLETO")], json!("João P. Lima"));
        assert_eq!(grid[2][column("CPF")], json!("222"));
    }

    #[tokio::test]
    async fn assign_counts_only_known_ids() {
        let (store, service) = fixture();
        let updated = service
            .assign(&AllocationPayload {
                candidate_ids: vec!["111".into(), "999".into(), "333".into()],
                assignee: "bruno@example.com".into(),
                assigned_by: None,
            })
            .await
            .unwrap();
        assert_eq!(updated, 2);
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert_eq!(grid[1][column("assigned_to")], json!("bruno@example.com"));
        assert_eq!(grid[1][column("Status")], json!("em_analise"));
        assert_eq!(grid[1][column("assigned_by")], json!(""));
        assert_eq!(grid[2][column("assigned_to")], json!(""));
    }

    #[tokio::test]
    async fn screening_scores_only_for_classified() {
        let (store, service) = fixture();
        let payload = ScreeningPayload {
            registration_number: "222".into(),
            status: "Desclassificado".into(),
            analyst_email: Some("bruno@example.com".into()),
            screened_at: Some("2024-05-01T12:00:00.000Z".into()),
            documents: Vec::new(),
            technical_capacity: Some(json!(8)),
            experience: None,
            total_score: None,
            notes: None,
        };
        service.save_screening(&payload).await.unwrap();
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert_eq!(grid[2][column("capacidade_tecnica")], json!(""));
        assert_eq!(grid[2][column("data_hora_triagem")], json!("2024-05-01T12:00:00.000Z"));

        let classified = ScreeningPayload {
            status: "Classificado".into(),
            ..payload
        };
        service.save_screening(&classified).await.unwrap();
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert_eq!(grid[2][column("capacidade_tecnica")], json!(8));
    }

    #[tokio::test]
    async fn delete_of_missing_candidate_mutates_nothing() {
        let (store, service) = fixture();
        let before = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert!(matches!(service.delete("999").await, Err(Error::NotFound(_))));
        assert_eq!(store.snapshot(SHEET_CANDIDATES).await.unwrap(), before);
    }
}
