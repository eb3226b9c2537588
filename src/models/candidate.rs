//! Candidate vocabulary: column names the handlers write and the status
//! values stored in them. Candidates themselves stay untyped records since
//! the sheet's columns vary between deployments.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const KEY_COLUMN: &str = "CPF";
pub const NAME_COLUMN: &str = "NOMECOMPLETO";

pub const WORKFLOW_PENDING: &str = "pendente";
pub const WORKFLOW_IN_REVIEW: &str = "em_analise";
pub const WORKFLOW_DONE: &str = "concluido";

pub const TRIAGE_CLASSIFIED: &str = "Classificado";
pub const TRIAGE_DISQUALIFIED: &str = "Desclassificado";
pub const TRIAGE_REVIEW: &str = "Revisar";

pub const INTERVIEW_WAITING: &str = "Aguardando Entrevista";
pub const INTERVIEW_IN_PROGRESS: &str = "Em Entrevista";
pub const INTERVIEW_DONE: &str = "Entrevista Concluída";

/// Parameters that address a candidate rather than set one of its columns.
pub const KEY_PARAMS: &[&str] = &["action", "registration_number", "id", "CPF", "candidateCPF"];

/// Fields an interviewer may record, besides the completion stamp.
pub const EVALUATION_FIELDS: &[&str] = &[
    "interview_score",
    "interview_result",
    "interview_notes",
    "formacao_adequada",
    "graduacoes_competencias",
    "descricao_processos",
    "terminologia_tecnica",
    "calma_clareza",
    "escalas_flexiveis",
    "adaptabilidade_mudancas",
    "ajustes_emergencia",
    "residencia",
    "resolucao_conflitos",
    "colaboracao_equipe",
    "adaptacao_perfis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Classificados,
    Desclassificados,
    EntrevistaClassificados,
    EntrevistaDesclassificados,
    Todos,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Classificados => "classificados",
            ReportType::Desclassificados => "desclassificados",
            ReportType::EntrevistaClassificados => "entrevista_classificados",
            ReportType::EntrevistaDesclassificados => "entrevista_desclassificados",
            ReportType::Todos => "todos",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportType::Classificados => "Candidatos Classificados - Triagem",
            ReportType::Desclassificados => "Candidatos Desclassificados - Triagem",
            ReportType::EntrevistaClassificados => "Candidatos Classificados - Entrevista",
            ReportType::EntrevistaDesclassificados => "Candidatos Desclassificados - Entrevista",
            ReportType::Todos => "Todos os Candidatos",
        }
    }

    /// Column and value a row must carry to be part of the report.
    pub fn criterion(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ReportType::Classificados => Some(("status_triagem", TRIAGE_CLASSIFIED)),
            ReportType::Desclassificados => Some(("status_triagem", TRIAGE_DISQUALIFIED)),
            ReportType::EntrevistaClassificados => Some(("interview_result", TRIAGE_CLASSIFIED)),
            ReportType::EntrevistaDesclassificados => {
                Some(("interview_result", TRIAGE_DISQUALIFIED))
            }
            ReportType::Todos => None,
        }
    }

    /// Exported columns as (header label, candidate column).
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ReportType::Classificados | ReportType::EntrevistaClassificados => &[
                ("Nome Completo", "NOMECOMPLETO"),
                ("Nome Social", "NOMESOCIAL"),
                ("CPF", "CPF"),
                ("Telefone", "TELEFONE"),
                ("Cargo Pretendido", "CARGOPRETENDIDO"),
                ("PCD", "VAGAPCD"),
            ],
            ReportType::Desclassificados => &[
                ("Nome Completo", "NOMECOMPLETO"),
                ("Nome Social", "NOMESOCIAL"),
                ("CPF", "CPF"),
                ("Telefone", "TELEFONE"),
                ("Cargo Pretendido", "CARGOPRETENDIDO"),
                ("Motivo Desclassificação", "motivo_desclassificacao"),
                ("PCD", "VAGAPCD"),
            ],
            ReportType::EntrevistaDesclassificados => &[
                ("Nome Completo", "NOMECOMPLETO"),
                ("Nome Social", "NOMESOCIAL"),
                ("CPF", "CPF"),
                ("Telefone", "TELEFONE"),
                ("Cargo Pretendido", "CARGOPRETENDIDO"),
                ("Pontuação", "interview_score"),
                ("PCD", "VAGAPCD"),
            ],
            ReportType::Todos => &[
                ("Nome Completo", "NOMECOMPLETO"),
                ("CPF", "CPF"),
                ("Email", "EMAIL"),
                ("Telefone", "TELEFONE"),
                ("Área", "AREAATUACAO"),
                ("Cargo Pretendido", "CARGOPRETENDIDO"),
                ("Status", "Status"),
                ("Triagem", "status_triagem"),
                ("Analista", "analista_triagem"),
                ("Entrevista", "status_entrevista"),
            ],
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "classificados" => Ok(ReportType::Classificados),
            "desclassificados" => Ok(ReportType::Desclassificados),
            "entrevista_classificados" => Ok(ReportType::EntrevistaClassificados),
            "entrevista_desclassificados" => Ok(ReportType::EntrevistaDesclassificados),
            "todos" => Ok(ReportType::Todos),
            other => Err(format!("Tipo de relatório inválido: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_types_parse_their_wire_names() {
        for ty in [
            ReportType::Classificados,
            ReportType::Desclassificados,
            ReportType::EntrevistaClassificados,
            ReportType::EntrevistaDesclassificados,
            ReportType::Todos,
        ] {
            assert_eq!(ty.as_str().parse::<ReportType>().unwrap(), ty);
        }
        assert!("Classificados".parse::<ReportType>().is_err());
    }

    #[test]
    fn interview_reports_filter_on_the_result_column() {
        assert_eq!(
            ReportType::EntrevistaDesclassificados.criterion(),
            Some(("interview_result", TRIAGE_DISQUALIFIED))
        );
        assert_eq!(ReportType::Todos.criterion(), None);
    }
}
