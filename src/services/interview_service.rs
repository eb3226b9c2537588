use crate::dto::action_dto::AllocationPayload;
use crate::dto::params::Params;
use crate::error::Result;
use crate::models::candidate::{
    EVALUATION_FIELDS, INTERVIEW_DONE, INTERVIEW_IN_PROGRESS, INTERVIEW_WAITING, KEY_COLUMN,
};
use crate::services::candidate_service::{candidate_not_found, CandidateService};
use crate::store::{Record, Workbook};
use crate::utils::time::now_iso;
use serde_json::Value;
use tracing::info;

/// Interview pipeline over the candidate sheet.
#[derive(Clone)]
pub struct InterviewService {
    workbook: Workbook,
    candidates: CandidateService,
}

impl InterviewService {
    pub fn new(workbook: Workbook, candidates: CandidateService) -> Self {
        Self { workbook, candidates }
    }

    pub async fn move_to_interview(&self, ids: &[String]) -> Result<usize> {
        let fields = [
            ("status_entrevista", Value::String(INTERVIEW_WAITING.to_string())),
            ("updated_at", Value::String(now_iso())),
        ];
        let updated = self.candidates.stamp_rows(ids, &fields).await?;
        info!(updated, "candidates moved to interview");
        Ok(updated)
    }

    /// Candidates waiting for or currently in an interview.
    pub async fn interview_candidates(&self) -> Result<Vec<Record>> {
        let mut rows = self.candidates.where_equals("status_entrevista", INTERVIEW_WAITING).await?;
        rows.extend(
            self.candidates
                .where_equals("status_entrevista", INTERVIEW_IN_PROGRESS)
                .await?,
        );
        Ok(rows)
    }

    pub async fn allocate(&self, payload: &AllocationPayload) -> Result<usize> {
        let timestamp = Value::String(now_iso());
        let mut fields: Vec<(&str, Value)> =
            vec![("entrevistador", Value::String(payload.assignee.clone()))];
        if let Some(admin) = &payload.assigned_by {
            fields.push(("entrevistador_by", Value::String(admin.clone())));
        }
        fields.push(("entrevistador_at", timestamp.clone()));
        fields.push(("status_entrevista", Value::String(INTERVIEW_IN_PROGRESS.to_string())));
        fields.push(("updated_at", timestamp));

        let updated = self.candidates.stamp_rows(&payload.candidate_ids, &fields).await?;
        info!(interviewer = %payload.assignee, updated, "candidates allocated to interviewer");
        Ok(updated)
    }

    pub async fn interviewer_candidates(&self, interviewer: &str) -> Result<Vec<Record>> {
        self.candidates.where_equals("entrevistador", interviewer).await
    }

    /// Records whichever evaluation fields were sent and closes the interview.
    pub async fn save_evaluation(&self, registration_number: &str, params: &Params) -> Result<()> {
        let sheet = self.candidates.sheet().await?;
        let row = sheet
            .find_row(KEY_COLUMN, registration_number)
            .ok_or_else(candidate_not_found)?;

        let timestamp = Value::String(now_iso());
        let mut fields: Vec<(&str, Value)> = EVALUATION_FIELDS
            .iter()
            .filter_map(|field| params.get(field).map(|v| (*field, v.clone())))
            .collect();
        fields.push(("interview_completed_at", timestamp.clone()));
        fields.push(("status_entrevista", Value::String(INTERVIEW_DONE.to_string())));
        fields.push(("updated_at", timestamp));

        self.workbook.set_fields(&sheet, row, &fields).await?;
        info!(cpf = %registration_number, "interview evaluation saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::schema::SHEET_CANDIDATES;
    use serde_json::json;
    use std::sync::Arc;

    const HEADERS: &[&str] = &[
        "CPF",
        "status_entrevista",
        "entrevistador",
        "entrevistador_by",
        "entrevistador_at",
        "interview_score",
        "interview_result",
        "calma_clareza",
        "interview_completed_at",
        "updated_at",
    ];

    fn fixture() -> (Arc<MemoryStore>, InterviewService) {
        let blank = |cpf: &str, status: &str| {
            let mut row = vec![json!(""); HEADERS.len()];
            row[0] = json!(cpf);
            row[1] = json!(status);
            row
        };
        let store = Arc::new(MemoryStore::new().with_sheet(
            SHEET_CANDIDATES,
            HEADERS,
            vec![
                blank("111", ""),
                blank("222", INTERVIEW_IN_PROGRESS),
                blank("333", INTERVIEW_DONE),
            ],
        ));
        let workbook = Workbook::new(store.clone());
        let service = InterviewService::new(workbook.clone(), CandidateService::new(workbook));
        (store, service)
    }

    #[tokio::test]
    async fn pipeline_moves_allocates_and_closes() {
        let (store, service) = fixture();
        assert_eq!(service.move_to_interview(&["111".into()]).await.unwrap(), 1);
        assert_eq!(service.interview_candidates().await.unwrap().len(), 2);

        let allocated = service
            .allocate(&AllocationPayload {
                candidate_ids: vec!["111".into()],
                assignee: "carla@example.com".into(),
                assigned_by: Some("ana@example.com".into()),
            })
            .await
            .unwrap();
        assert_eq!(allocated, 1);
        let mine = service.interviewer_candidates("carla@example.com").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["status_entrevista"], json!(INTERVIEW_IN_PROGRESS));
        assert_eq!(mine[0]["entrevistador_by"], json!("ana@example.com"));

        let params: Params = serde_json::from_value(json!({
            "registrationNumber": "111", "interview_score": 87, "calma_clareza": "sim"
        }))
        .unwrap();
        service.save_evaluation("111", &params).await.unwrap();
        let grid = store.snapshot(SHEET_CANDIDATES).await.unwrap();
        assert_eq!(grid[1][1], json!(INTERVIEW_DONE));
        assert_eq!(grid[1][5], json!(87));
        assert_eq!(grid[1][6], json!(""));
        assert_eq!(grid[1][7], json!("sim"));
    }

    #[tokio::test]
    async fn evaluation_of_unknown_candidate_is_not_found() {
        let (_, service) = fixture();
        let result = service.save_evaluation("999", &Params::default()).await;
        assert!(matches!(result, Err(crate::error::Error::NotFound(_))));
    }
}
