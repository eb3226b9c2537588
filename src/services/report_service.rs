use crate::error::Result;
use crate::models::candidate::{
    ReportType, INTERVIEW_DONE, INTERVIEW_WAITING, TRIAGE_CLASSIFIED, TRIAGE_DISQUALIFIED,
    TRIAGE_REVIEW, WORKFLOW_DONE, WORKFLOW_IN_REVIEW, WORKFLOW_PENDING,
};
use crate::services::candidate_service::CandidateService;
use crate::store::{cell_text, Record};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub pendente: usize,
    pub em_analise: usize,
    pub concluido: usize,
    pub administrativa: usize,
    pub assistencial: usize,
    pub pcd: usize,
    pub nao_pcd: usize,
    pub classificados: usize,
    pub desclassificados: usize,
    pub revisar: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub classificados: usize,
    pub desclassificados: usize,
    pub revisar: usize,
    pub aguardando_entrevista: usize,
    pub entrevista_concluida: usize,
}

fn field(record: &Record, column: &str) -> String {
    record.get(column).map(cell_text).unwrap_or_default()
}

#[derive(Clone)]
pub struct ReportService {
    candidates: CandidateService,
}

impl ReportService {
    pub fn new(candidates: CandidateService) -> Self {
        Self { candidates }
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let rows = self.candidates.all().await?;
        let mut stats = Statistics {
            total: rows.len(),
            ..Default::default()
        };
        for row in &rows {
            match field(row, "Status").as_str() {
                WORKFLOW_PENDING => stats.pendente += 1,
                WORKFLOW_IN_REVIEW => stats.em_analise += 1,
                WORKFLOW_DONE => stats.concluido += 1,
                _ => {}
            }

            let area = field(row, "AREAATUACAO").to_lowercase();
            if area.contains("administrativa") {
                stats.administrativa += 1;
            }
            if area.contains("assistencial") {
                stats.assistencial += 1;
            }

            let pcd = field(row, "VAGAPCD").to_lowercase();
            match pcd.trim() {
                "" => {}
                "sim" | "s" => stats.pcd += 1,
                _ => stats.nao_pcd += 1,
            }

            match field(row, "status_triagem").as_str() {
                TRIAGE_CLASSIFIED => stats.classificados += 1,
                TRIAGE_DISQUALIFIED => stats.desclassificados += 1,
                TRIAGE_REVIEW => stats.revisar += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    pub async fn report_stats(&self) -> Result<ReportStats> {
        let rows = self.candidates.all().await?;
        let mut stats = ReportStats {
            total: rows.len(),
            ..Default::default()
        };
        for row in &rows {
            match field(row, "status_triagem").as_str() {
                TRIAGE_CLASSIFIED => stats.classificados += 1,
                TRIAGE_DISQUALIFIED => stats.desclassificados += 1,
                TRIAGE_REVIEW => stats.revisar += 1,
                _ => {}
            }
            match field(row, "status_entrevista").as_str() {
                INTERVIEW_WAITING => stats.aguardando_entrevista += 1,
                INTERVIEW_DONE => stats.entrevista_concluida += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Rows belonging to `report`, optionally narrowed to one analyst.
    pub async fn report(&self, report: ReportType, analyst: Option<&str>) -> Result<Vec<Record>> {
        let rows = self.candidates.all().await?;
        Ok(rows
            .into_iter()
            .filter(|row| match report.criterion() {
                Some((column, value)) => field(row, column) == value,
                None => true,
            })
            .filter(|row| match analyst {
                Some(email) => field(row, "analista_triagem").eq_ignore_ascii_case(email),
                None => true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::schema::SHEET_CANDIDATES;
    use crate::store::Workbook;
    use serde_json::json;
    use std::sync::Arc;

    const HEADERS: &[&str] = &[
        "CPF",
        "Status",
        "AREAATUACAO",
        "VAGAPCD",
        "status_triagem",
        "analista_triagem",
        "status_entrevista",
        "interview_result",
    ];

    fn service() -> ReportService {
        let store = MemoryStore::new().with_sheet(
            SHEET_CANDIDATES,
            HEADERS,
            vec![
                vec![json!("1"), json!("pendente"), json!("Área Administrativa"), json!("Sim"), json!("Classificado"), json!("bruno@example.com"), json!(INTERVIEW_DONE), json!("Classificado")],
                vec![json!("2"), json!("em_analise"), json!("Assistencial"), json!("Não"), json!("Desclassificado"), json!("bruno@example.com"), json!(""), json!("")],
                vec![json!("3"), json!("concluido"), json!(""), json!(""), json!("Classificado"), json!("carla@example.com"), json!(INTERVIEW_WAITING), json!("")],
                vec![json!("4"), json!("pendente"), json!("assistencial"), json!("s"), json!("Revisar"), json!(""), json!(""), json!("Desclassificado")],
            ],
        );
        ReportService::new(CandidateService::new(Workbook::new(Arc::new(store))))
    }

    #[tokio::test]
    async fn statistics_count_every_dimension() {
        let stats = service().statistics().await.unwrap();
        assert_eq!(
            stats,
            Statistics {
                total: 4,
                pendente: 2,
                em_analise: 1,
                concluido: 1,
                administrativa: 1,
                assistencial: 2,
                pcd: 2,
                nao_pcd: 1,
                classificados: 2,
                desclassificados: 1,
                revisar: 1,
            }
        );
    }

    #[tokio::test]
    async fn report_stats_include_interview_counters() {
        let stats = service().report_stats().await.unwrap();
        assert_eq!(stats.aguardando_entrevista, 1);
        assert_eq!(stats.entrevista_concluida, 1);
        assert_eq!(stats.classificados, 2);
    }

    #[tokio::test]
    async fn reports_filter_by_type_and_analyst() {
        let service = service();
        assert_eq!(service.report(ReportType::Classificados, None).await.unwrap().len(), 2);
        let mine = service
            .report(ReportType::Classificados, Some("bruno@example.com"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(
            service.report(ReportType::EntrevistaDesclassificados, None).await.unwrap()[0]["CPF"],
            json!("4")
        );
        assert_eq!(service.report(ReportType::Todos, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_sheet_reads_as_zero() {
        let empty = ReportService::new(CandidateService::new(Workbook::new(Arc::new(MemoryStore::new()))));
        assert_eq!(empty.statistics().await.unwrap(), Statistics::default());
        assert!(empty.report(ReportType::Todos, None).await.unwrap().is_empty());
    }
}
