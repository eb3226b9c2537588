use crate::dto::params::Params;
use crate::error::{Error, Result};
use crate::models::message::Channel;
use crate::models::user::Role;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct CreateUserPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub role: Role,
    pub active: bool,
    #[validate(length(min = 4, message = "Senha muito curta"))]
    pub password: String,
}

/// Password given to accounts created without one.
pub const DEFAULT_PASSWORD: &str = "123456";

impl CreateUserPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let (Some(email), Some(name), Some(role)) = (
            params.text(&["email", "Email"]),
            params.text(&["name", "Nome"]),
            params.text(&["role", "Role"]),
        ) else {
            return Err(Error::BadRequest("Email, Nome e Role são obrigatórios".into()));
        };
        Ok(Self {
            email: email.trim().to_string(),
            name,
            role: role.parse().map_err(Error::BadRequest)?,
            active: params.flag(&["active", "Ativo"]).unwrap_or(false),
            password: params
                .text(&["password", "Password"])
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateUserPayload {
    pub email: String,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UpdateUserPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let email = params.require(&["email", "Email"], "Email")?;
        let role = params
            .text(&["role", "Role"])
            .map(|r| r.parse::<Role>().map_err(Error::BadRequest))
            .transpose()?;
        Ok(Self {
            email,
            name: params.text(&["name", "Nome"]),
            role,
            active: params.flag(&["active", "Ativo"]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TriageStatusPayload {
    pub registration_number: String,
    pub status: String,
    pub reason_id: Option<String>,
    pub notes: Option<String>,
    pub analyst_email: Option<String>,
}

impl TriageStatusPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let (Some(registration_number), Some(status)) = (
            params.text(&["registrationNumber"]),
            params.text(&["statusTriagem"]),
        ) else {
            return Err(Error::BadRequest(
                "Número de registro e status são obrigatórios".into(),
            ));
        };
        Ok(Self {
            registration_number,
            status,
            reason_id: params.text(&["reasonId"]),
            notes: params.text(&["notes"]),
            analyst_email: params.text(&["analystEmail"]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScreeningPayload {
    pub registration_number: String,
    pub status: String,
    pub analyst_email: Option<String>,
    pub screened_at: Option<String>,
    pub documents: Vec<(String, Value)>,
    pub technical_capacity: Option<Value>,
    pub experience: Option<Value>,
    pub total_score: Option<Value>,
    pub notes: Option<String>,
}

impl ScreeningPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let registration_number =
            params.require(&["registrationNumber", "CPF"], "Número de registro ou CPF")?;
        let status = params.require(&["status"], "Status")?;

        let documents = match params.get("documents") {
            Some(Value::Object(docs)) => (1..=5)
                .map(|i| format!("documento_{}", i))
                .filter_map(|key| {
                    docs.get(&key)
                        .filter(|v| crate::store::is_filled(v))
                        .map(|v| (key.clone(), v.clone()))
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            registration_number,
            status,
            analyst_email: params.text(&["analystEmail"]),
            screened_at: params.text(&["screenedAt"]),
            documents,
            technical_capacity: params.get("capacidade_tecnica").cloned(),
            experience: params.get("experiencia").cloned(),
            total_score: params.get("total_score").cloned(),
            notes: params.text(&["notes"]),
        })
    }
}

/// Bulk allocation of candidates to an analyst or interviewer.
#[derive(Debug, Clone)]
pub struct AllocationPayload {
    pub candidate_ids: Vec<String>,
    pub assignee: String,
    pub assigned_by: Option<String>,
}

impl AllocationPayload {
    pub fn for_analyst(params: &Params) -> Result<Self> {
        let (Some(candidate_ids), Some(assignee)) = (
            params.id_list(&["candidateIds"]),
            params.text(&["analystEmail", "analystId"]),
        ) else {
            return Err(Error::BadRequest(
                "IDs dos candidatos e email do analista são obrigatórios".into(),
            ));
        };
        Ok(Self {
            candidate_ids,
            assignee,
            assigned_by: params.text(&["adminEmail", "adminId"]),
        })
    }

    pub fn for_interviewer(params: &Params) -> Result<Self> {
        let (Some(candidate_ids), Some(assignee)) = (
            params.id_list(&["candidateIds"]),
            params.text(&["interviewerEmail"]),
        ) else {
            return Err(Error::BadRequest(
                "IDs dos candidatos e email do entrevistador são obrigatórios".into(),
            ));
        };
        Ok(Self {
            candidate_ids,
            assignee,
            assigned_by: params.text(&["adminEmail"]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SendMessagesPayload {
    pub channel: Channel,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub template_id: Option<String>,
    pub candidates: Option<Vec<crate::store::Record>>,
    pub candidate_ids: Option<Vec<String>>,
    pub sent_by: String,
    pub from_alias: Option<String>,
}

impl SendMessagesPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let channel: Channel = params
            .require(&["messageType"], "Tipo de mensagem")?
            .parse()
            .map_err(Error::BadRequest)?;

        // `candidates` may carry full objects or bare ids.
        let mut candidates = None;
        let mut candidate_ids = params.id_list(&["candidateIds"]);
        match params.get("candidates") {
            Some(Value::Array(items)) if items.iter().all(|i| i.is_object()) => {
                candidates = params.records("candidates")?;
            }
            Some(_) if candidate_ids.is_none() => {
                candidate_ids = params.id_list(&["candidates"]);
            }
            _ => {}
        }
        if candidates.as_ref().map(|c| c.is_empty()).unwrap_or(true) && candidate_ids.is_none() {
            return Err(Error::BadRequest("Parâmetros insuficientes".into()));
        }

        Ok(Self {
            channel,
            subject: params.text(&["subject"]),
            content: params.text(&["content"]),
            template_id: params.text(&["templateId"]),
            candidates: candidates.filter(|c| !c.is_empty()),
            candidate_ids,
            sent_by: params.text(&["sentBy"]).unwrap_or_else(|| "admin".to_string()),
            from_alias: params.text(&["fromAlias", "alias"]),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogMessagePayload {
    pub registration_number: String,
    pub channel: String,
    pub recipient: String,
    pub subject: String,
    pub content: String,
    pub sent_by: String,
    pub status: String,
}

impl LogMessagePayload {
    pub fn from_params(params: &Params) -> Self {
        let get = |k: &str| params.text(&[k]).unwrap_or_default();
        Self {
            registration_number: get("registrationNumber"),
            channel: get("messageType"),
            recipient: get("recipient"),
            subject: get("subject"),
            content: get("content"),
            sent_by: get("sentBy"),
            status: params.text(&["status"]).unwrap_or_else(|| "Enviado".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageStatusPayload {
    pub registration_numbers: Vec<String>,
    pub channel: Channel,
    pub status: String,
}

impl MessageStatusPayload {
    pub fn from_params(params: &Params) -> Result<Self> {
        let (Some(registration_numbers), Some(channel), Some(status)) = (
            params.id_list(&["registrationNumbers"]),
            params.text(&["messageType"]),
            params.text(&["status"]),
        ) else {
            return Err(Error::BadRequest("Parâmetros insuficientes".into()));
        };
        Ok(Self {
            registration_numbers,
            channel: channel.parse().map_err(Error::BadRequest)?,
            status,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub status: Option<String>,
    pub area: Option<String>,
    pub cargo: Option<String>,
    pub pcd: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl CandidateFilter {
    pub fn from_params(params: &Params) -> Self {
        let number = |keys: &[&str]| {
            params
                .text(keys)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
        };
        Self {
            status: params.text(&["status", "Status"]),
            area: params.text(&["area", "AREAATUACAO"]),
            cargo: params.text(&["cargo", "CARGOPRETENDIDO"]),
            pcd: params.text(&["pcd", "VAGAPCD"]),
            assigned_to: params.text(&["assignedTo", "assigned_to"]),
            search: params.text(&["search"]),
            page: number(&["page"]),
            page_size: number(&["pageSize", "page_size"]),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_user_requires_core_fields_and_validates_email() {
        let missing = CreateUserPayload::from_params(&params(json!({ "email": "a@b.com" })));
        assert!(matches!(missing, Err(Error::BadRequest(_))));

        let payload = CreateUserPayload::from_params(&params(json!({
            "Email": "not-an-email", "Nome": "Ana", "Role": "analista"
        })))
        .unwrap();
        assert!(payload.validate().is_err());
        assert_eq!(payload.password, DEFAULT_PASSWORD);
        assert!(!payload.active);
    }

    #[test]
    fn create_user_rejects_unknown_roles() {
        let result = CreateUserPayload::from_params(&params(json!({
            "email": "a@b.com", "name": "Ana", "role": "gerente"
        })));
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn screening_keeps_only_filled_document_slots() {
        let payload = ScreeningPayload::from_params(&params(json!({
            "CPF": "111",
            "status": "Classificado",
            "documents": { "documento_1": "ok", "documento_2": "", "documento_3": "pendente", "documento_9": "x" }
        })))
        .unwrap();
        assert_eq!(payload.registration_number, "111");
        assert_eq!(payload.documents.len(), 2);
        assert_eq!(payload.documents[0].0, "documento_1");
        assert_eq!(payload.documents[1].0, "documento_3");
    }

    #[test]
    fn send_messages_accepts_ids_in_candidates_field() {
        let payload = SendMessagesPayload::from_params(&params(json!({
            "messageType": "sms", "content": "Oi [NOME]", "candidates": "111,222"
        })))
        .unwrap();
        assert_eq!(payload.candidate_ids.unwrap(), vec!["111", "222"]);
        assert!(payload.candidates.is_none());
    }

    #[test]
    fn send_messages_needs_recipients() {
        let result = SendMessagesPayload::from_params(&params(json!({
            "messageType": "email", "content": "x"
        })));
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
