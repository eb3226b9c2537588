//! The single action endpoint: `action` plus a flat parameter bag, read from
//! the query string, a JSON body or a form body.

use crate::{
    dto::action_dto::{
        AllocationPayload, CandidateFilter, CreateUserPayload, LogMessagePayload,
        MessageStatusPayload, ScreeningPayload, SendMessagesPayload, TriageStatusPayload,
        UpdateUserPayload,
    },
    dto::params::Params,
    error::{Error, Result},
    middleware::auth::{require_admin, verify_bearer},
    models::candidate::ReportType,
    models::user::{AnalystView, Role},
    utils::{time::now_iso, token::issue_session_token},
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetUserRole,
    GetAllUsers,
    GetAnalysts,
    GetInterviewers,
    CreateUser,
    UpdateUser,
    DeleteUser,
    GetCandidates,
    GetCandidate,
    AddCandidate,
    UpdateCandidate,
    DeleteCandidate,
    AssignCandidates,
    BulkUpdateCandidates,
    UpdateCandidateStatus,
    GetCandidatesByStatus,
    SaveScreening,
    MoveToInterview,
    GetInterviewCandidates,
    AllocateToInterviewer,
    GetInterviewerCandidates,
    SaveInterviewEvaluation,
    SendMessages,
    LogMessage,
    UpdateMessageStatus,
    GetMessageTemplates,
    GetEmailAliases,
    GetStatistics,
    GetReportStats,
    GetReport,
    GetDisqualificationReasons,
    Test,
}

const ACTIONS: &[(&str, Action)] = &[
    ("getUserRole", Action::GetUserRole),
    ("getAllUsers", Action::GetAllUsers),
    ("getAnalysts", Action::GetAnalysts),
    ("getInterviewers", Action::GetInterviewers),
    ("createUser", Action::CreateUser),
    ("updateUser", Action::UpdateUser),
    ("deleteUser", Action::DeleteUser),
    ("getCandidates", Action::GetCandidates),
    ("getCandidate", Action::GetCandidate),
    ("addCandidate", Action::AddCandidate),
    ("updateCandidate", Action::UpdateCandidate),
    ("deleteCandidate", Action::DeleteCandidate),
    ("assignCandidates", Action::AssignCandidates),
    ("bulkUpdateCandidates", Action::BulkUpdateCandidates),
    ("updateCandidateStatus", Action::UpdateCandidateStatus),
    ("getCandidatesByStatus", Action::GetCandidatesByStatus),
    ("saveScreening", Action::SaveScreening),
    ("moveToInterview", Action::MoveToInterview),
    ("getInterviewCandidates", Action::GetInterviewCandidates),
    ("allocateToInterviewer", Action::AllocateToInterviewer),
    ("getInterviewerCandidates", Action::GetInterviewerCandidates),
    ("saveInterviewEvaluation", Action::SaveInterviewEvaluation),
    ("sendMessages", Action::SendMessages),
    ("logMessage", Action::LogMessage),
    ("updateMessageStatus", Action::UpdateMessageStatus),
    ("getMessageTemplates", Action::GetMessageTemplates),
    ("getEmailAliases", Action::GetEmailAliases),
    ("getStatistics", Action::GetStatistics),
    ("getReportStats", Action::GetReportStats),
    ("getReport", Action::GetReport),
    ("getDisqualificationReasons", Action::GetDisqualificationReasons),
    ("test", Action::Test),
];

impl Action {
    pub fn name(&self) -> &'static str {
        ACTIONS
            .iter()
            .find(|(_, a)| a == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    /// Reachable without a session even when authentication is enforced.
    pub fn is_public(&self) -> bool {
        matches!(self, Action::GetUserRole | Action::Test)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::CreateUser
                | Action::UpdateUser
                | Action::DeleteUser
                | Action::AssignCandidates
                | Action::AllocateToInterviewer
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ACTIONS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, action)| *action)
            .ok_or_else(|| Error::NotFound(format!("Ação não encontrada: {}", s)))
    }
}

/// Form bodies arrive as `a=1&b=2`; anything that is not a JSON object is
/// read that way.
fn parse_body(body: &[u8]) -> Result<Params> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Params::default());
    }
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        return Ok(Params(map));
    }
    if body.first() == Some(&b'{') {
        return Err(Error::BadRequest("Corpo JSON inválido".to_string()));
    }
    Ok(Params::from_pairs(
        url::form_urlencoded::parse(body).map(|(k, v)| (k.into_owned(), v.into_owned())),
    ))
}

pub async fn exec_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    run(&state, &headers, Params::from_query(query)).await
}

pub async fn exec_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let params = Params::from_query(query).merge(parse_body(&body)?);
    run(&state, &headers, params).await
}

async fn run(state: &AppState, headers: &HeaderMap, params: Params) -> Result<Json<Value>> {
    let name = params.action().ok_or_else(|| Error::missing("Ação"))?;
    let action: Action = name.parse()?;

    if state.config.require_auth && !action.is_public() {
        let claims = verify_bearer(headers, &state.config.jwt_secret)?;
        if action.requires_admin() {
            require_admin(&claims)?;
        }
    }

    dispatch(state, action, &params).await.map(Json)
}

fn ok_message(message: impl Into<String>) -> Value {
    json!({ "success": true, "message": message.into() })
}

fn ok_data(data: impl serde::Serialize) -> Result<Value> {
    Ok(json!({ "success": true, "data": serde_json::to_value(data)? }))
}

fn ok_updated(message: String, updated: usize) -> Value {
    json!({ "success": true, "message": message, "updated": updated })
}

fn required_ids(params: &Params, keys: &[&str]) -> Result<Vec<String>> {
    params
        .id_list(keys)
        .ok_or_else(|| Error::BadRequest("IDs dos candidatos são obrigatórios".to_string()))
}

fn candidate_id(params: &Params, keys: &[&str]) -> Result<String> {
    params
        .text(keys)
        .ok_or_else(|| Error::BadRequest("ID do candidato é obrigatório".to_string()))
}

#[instrument(skip_all, fields(action = %action))]
pub async fn dispatch(state: &AppState, action: Action, params: &Params) -> Result<Value> {
    info!("handling action");
    match action {
        Action::GetUserRole => {
            let email = params.require(&["email"], "Email")?;
            let password = params.text(&["password"]);
            let mut user = if state.config.require_auth {
                let password = password
                    .ok_or_else(|| Error::Unauthorized("Senha é obrigatória".to_string()))?;
                state.user_service.authenticate(&email, &password).await?
            } else {
                state
                    .user_service
                    .get_user_role(&email, password.as_deref())
                    .await?
            };
            if state.config.require_auth {
                user.token = Some(issue_session_token(
                    &user.email,
                    &user.role,
                    &state.config.jwt_secret,
                    state.config.token_ttl_hours,
                )?);
            }
            let mut body = serde_json::to_value(user)?;
            body["success"] = json!(true);
            Ok(body)
        }
        Action::GetAllUsers => {
            let users = state.user_service.list_users().await?;
            ok_data(json!({ "users": users }))
        }
        Action::GetAnalysts => {
            let analysts: Vec<AnalystView> = state
                .user_service
                .list_by_role(Role::Analista)
                .await?
                .into_iter()
                .map(AnalystView::from)
                .collect();
            ok_data(json!({ "analysts": analysts }))
        }
        Action::GetInterviewers => ok_data(state.user_service.list_by_role(Role::Entrevistador).await?),
        Action::CreateUser => {
            state
                .user_service
                .create_user(CreateUserPayload::from_params(params)?)
                .await?;
            Ok(ok_message("Usuário criado com sucesso"))
        }
        Action::UpdateUser => {
            state
                .user_service
                .update_user(UpdateUserPayload::from_params(params)?)
                .await?;
            Ok(ok_message("Usuário atualizado"))
        }
        Action::DeleteUser => {
            let email = params.require(&["email", "Email"], "Email")?;
            state.user_service.delete_user(&email).await?;
            Ok(ok_message("Usuário deletado"))
        }

        Action::GetCandidates => {
            let page = state
                .candidate_service
                .list(&CandidateFilter::from_params(params))
                .await?;
            ok_data(page)
        }
        Action::GetCandidate => {
            let id = candidate_id(params, &["registration_number", "id", "CPF"])?;
            ok_data(state.candidate_service.get(&id).await?)
        }
        Action::AddCandidate => {
            state.candidate_service.add(params).await?;
            Ok(ok_message("Candidato adicionado com sucesso"))
        }
        Action::UpdateCandidate => {
            let id = candidate_id(params, &["registration_number", "id", "CPF", "candidateCPF"])?;
            state.candidate_service.update(&id, params).await?;
            Ok(ok_message("Candidato atualizado"))
        }
        Action::DeleteCandidate => {
            let id = candidate_id(params, &["registration_number", "id", "CPF", "candidateCPF"])?;
            state.candidate_service.delete(&id).await?;
            Ok(ok_message("Candidato deletado"))
        }
        Action::AssignCandidates => {
            let payload = AllocationPayload::for_analyst(params)?;
            let updated = state.candidate_service.assign(&payload).await?;
            Ok(ok_updated(format!("{} candidato(s) atribuído(s)", updated), updated))
        }
        Action::BulkUpdateCandidates => {
            let updates = params
                .records("updates")?
                .ok_or_else(|| Error::BadRequest("Lista de atualizações é obrigatória".to_string()))?;
            let updated = state.candidate_service.bulk_update(&updates).await?;
            Ok(ok_updated(format!("{} candidato(s) atualizado(s)", updated), updated))
        }
        Action::UpdateCandidateStatus => {
            let payload = TriageStatusPayload::from_params(params)?;
            state.candidate_service.update_status(&payload).await?;
            Ok(ok_message("Status atualizado com sucesso"))
        }
        Action::GetCandidatesByStatus => {
            let status = params.require(&["status"], "Status")?;
            ok_data(state.candidate_service.by_status(&status).await?)
        }
        Action::SaveScreening => {
            let payload = ScreeningPayload::from_params(params)?;
            state.candidate_service.save_screening(&payload).await?;
            Ok(ok_message("Triagem salva com sucesso"))
        }

        Action::MoveToInterview => {
            let ids = required_ids(params, &["candidateIds"])?;
            let updated = state.interview_service.move_to_interview(&ids).await?;
            Ok(ok_updated(
                format!("{} candidato(s) movido(s) para entrevista", updated),
                updated,
            ))
        }
        Action::GetInterviewCandidates => ok_data(state.interview_service.interview_candidates().await?),
        Action::AllocateToInterviewer => {
            let payload = AllocationPayload::for_interviewer(params)?;
            let updated = state.interview_service.allocate(&payload).await?;
            Ok(ok_updated(
                format!("{} candidato(s) alocado(s) para entrevista", updated),
                updated,
            ))
        }
        Action::GetInterviewerCandidates => {
            let email = params.require(&["interviewerEmail"], "Email do entrevistador")?;
            ok_data(state.interview_service.interviewer_candidates(&email).await?)
        }
        Action::SaveInterviewEvaluation => {
            let id = params.require(&["registrationNumber"], "Número de registro")?;
            state.interview_service.save_evaluation(&id, params).await?;
            Ok(ok_message("Avaliação salva com sucesso"))
        }

        Action::SendMessages => {
            let payload = SendMessagesPayload::from_params(params)?;
            let report = state.message_service.send(&payload).await?;
            let mut body = serde_json::to_value(&report)?;
            body["success"] = json!(true);
            body["message"] = json!(format!(
                "{} mensagem(ns) enviada(s), {} falha(s)",
                report.success_count, report.fail_count
            ));
            Ok(body)
        }
        Action::LogMessage => {
            let logged = state
                .message_service
                .log(&LogMessagePayload::from_params(params))
                .await?;
            Ok(ok_message(if logged {
                "Mensagem registrada"
            } else {
                "Aba MENSAGENS não encontrada"
            }))
        }
        Action::UpdateMessageStatus => {
            let payload = MessageStatusPayload::from_params(params)?;
            let updated = state.message_service.update_status(&payload).await?;
            Ok(ok_updated(format!("{} status(es) atualizado(s)", updated), updated))
        }
        Action::GetMessageTemplates => ok_data(state.catalog_service.templates().await?),
        Action::GetEmailAliases => ok_data(state.catalog_service.aliases().await?),

        Action::GetStatistics => ok_data(state.report_service.statistics().await?),
        Action::GetReportStats => ok_data(state.report_service.report_stats().await?),
        Action::GetReport => {
            let report: ReportType = params
                .require(&["reportType"], "Tipo de relatório")?
                .parse()
                .map_err(Error::BadRequest)?;
            let analyst = params.text(&["analystEmail"]).filter(|a| a != "todos");
            ok_data(state.report_service.report(report, analyst.as_deref()).await?)
        }

        Action::GetDisqualificationReasons => {
            let include_inactive = params.flag(&["includeInactive"]).unwrap_or(false);
            ok_data(state.catalog_service.reasons(include_inactive).await?)
        }

        Action::Test => {
            let sheets = state.workbook.sheet_names().await?;
            Ok(json!({
                "success": true,
                "message": "Conexão funcionando!",
                "backend": state.workbook.backend_tag(),
                "sheets": sheets,
                "timestamp": now_iso(),
            }))
        }
    }
}
