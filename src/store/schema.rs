//! Sheet names, canonical headers and first-run bootstrap.

use super::Workbook;
use crate::error::Result;
use serde_json::Value;
use tracing::info;

pub const SHEET_USERS: &str = "USUARIOS";
pub const SHEET_CANDIDATES: &str = "CANDIDATOS";
pub const SHEET_REASONS: &str = "MOTIVOS";
pub const SHEET_MESSAGES: &str = "MENSAGENS";
pub const SHEET_TEMPLATES: &str = "TEMPLATES";
pub const SHEET_ALIASES: &str = "ALIAS";

pub const USER_HEADERS: &[&str] = &["Email", "Nome", "Role", "Ativo", "Password"];

pub const CANDIDATE_HEADERS: &[&str] = &[
    "CPF",
    "NOMECOMPLETO",
    "NOMESOCIAL",
    "EMAIL",
    "TELEFONE",
    "VAGAPCD",
    "LAUDO MEDICO",
    "AREAATUACAO",
    "CARGOPRETENDIDO",
    "cargo_administrativo",
    "cargo_assistencial",
    "area_atuacao_pretendida",
    "CURRICULOVITAE",
    "DOCUMENTOSPESSOAIS",
    "DOCUMENTOSPROFISSIONAIS",
    "DIPLOMACERTIFICADO",
    "DOCUMENTOSCONSELHO",
    "ESPECIALIZACOESCURSOS",
    "documento_1",
    "documento_2",
    "documento_3",
    "documento_4",
    "documento_5",
    "Status",
    "status_triagem",
    "data_hora_triagem",
    "analista_triagem",
    "motivo_desclassificacao",
    "observacoes_triagem",
    "capacidade_tecnica",
    "experiencia",
    "pontuacao_total",
    "assigned_to",
    "assigned_by",
    "assigned_at",
    "email_sent",
    "sms_sent",
    "status_entrevista",
    "entrevistador",
    "entrevistador_by",
    "entrevistador_at",
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
    "interview_completed_at",
    "DataCadastro",
    "updated_at",
];

pub const REASON_HEADERS: &[&str] = &["ID", "Motivo", "Ativo"];

pub const MESSAGE_HEADERS: &[&str] = &[
    "Data/Hora",
    "Número Inscrição",
    "Tipo",
    "Destinatário",
    "Assunto",
    "Conteúdo",
    "Enviado Por",
    "Status",
];

pub const TEMPLATE_HEADERS: &[&str] = &["id", "nome", "tipo", "assunto", "conteudo"];

pub const ALIAS_HEADERS: &[&str] = &["email", "nome"];

pub const DEFAULT_REASONS: &[(&str, &str)] = &[
    ("M001", "Documentação incompleta"),
    ("M002", "Não atende aos requisitos mínimos da vaga"),
    ("M003", "Formação incompatível com a vaga"),
    ("M004", "Experiência insuficiente"),
    ("M005", "Documentos ilegíveis ou com qualidade inadequada"),
    ("M006", "Dados inconsistentes ou contraditórios"),
    ("M007", "Não apresentou documentos obrigatórios"),
    ("M008", "Fora do prazo de inscrição"),
    ("M009", "Outros motivos"),
];

/// Creates any missing sheet with its canonical header row. A freshly
/// created reasons sheet is seeded with the default reasons.
pub async fn bootstrap(workbook: &Workbook) -> Result<Vec<&'static str>> {
    let sheets: [(&'static str, &[&str]); 6] = [
        (SHEET_USERS, USER_HEADERS),
        (SHEET_CANDIDATES, CANDIDATE_HEADERS),
        (SHEET_REASONS, REASON_HEADERS),
        (SHEET_MESSAGES, MESSAGE_HEADERS),
        (SHEET_TEMPLATES, TEMPLATE_HEADERS),
        (SHEET_ALIASES, ALIAS_HEADERS),
    ];

    let mut created = Vec::new();
    for (name, headers) in sheets {
        if workbook.ensure_sheet(name, headers).await? {
            info!(sheet = name, "created missing sheet");
            created.push(name);
        }
    }

    if created.contains(&SHEET_REASONS) {
        for (id, text) in DEFAULT_REASONS {
            workbook
                .append_row(
                    SHEET_REASONS,
                    vec![
                        Value::String(id.to_string()),
                        Value::String(text.to_string()),
                        Value::String("Sim".to_string()),
                    ],
                )
                .await?;
        }
    }

    Ok(created)
}
