use crate::dto::action_dto::{LogMessagePayload, MessageStatusPayload, SendMessagesPayload};
use crate::error::{Error, Result};
use crate::models::candidate::KEY_COLUMN;
use crate::models::message::{Channel, EmailAlias, MessageLog, STATUS_SENT};
use crate::services::candidate_service::CandidateService;
use crate::services::catalog_service::CatalogService;
use crate::services::email_service::{check_recipient, render_html, EmailSender, OutgoingEmail};
use crate::services::sms_service::{normalize_phone, OutgoingSms, SmsSender};
use crate::store::schema::SHEET_MESSAGES;
use crate::store::{cell_text, is_filled, Record, Workbook};
use crate::utils::placeholders::{candidate_name, personalize};
use crate::utils::time::now_iso;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub candidate_id: String,
    pub candidate_name: String,
    pub recipient: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<DeliveryResult>,
}

/// Sender settings that do not live in the workbook.
#[derive(Debug, Clone, Default)]
pub struct SenderDefaults {
    pub from_name: String,
    pub default_alias: Option<String>,
}

#[derive(Clone)]
pub struct MessageService {
    workbook: Workbook,
    candidates: CandidateService,
    catalog: CatalogService,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    defaults: SenderDefaults,
}

fn first_text(record: &Record, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| is_filled(v))
        .map(cell_text)
        .unwrap_or_default()
}

/// Subject and body after applying the template, if any.
struct Draft {
    subject: String,
    content: String,
}

impl MessageService {
    pub fn new(
        workbook: Workbook,
        candidates: CandidateService,
        catalog: CatalogService,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        defaults: SenderDefaults,
    ) -> Self {
        Self {
            workbook,
            candidates,
            catalog,
            email,
            sms,
            defaults,
        }
    }

    async fn draft(&self, payload: &SendMessagesPayload) -> Result<Draft> {
        let mut subject = payload.subject.clone().unwrap_or_default();
        let mut content = payload.content.clone().unwrap_or_default();
        if let Some(id) = &payload.template_id {
            let template = self.catalog.template(id).await?;
            if !template.subject.is_empty() {
                subject = template.subject;
            }
            if !template.content.is_empty() {
                content = template.content;
            }
        }
        if content.trim().is_empty() {
            return Err(Error::BadRequest("Conteúdo da mensagem é obrigatório".to_string()));
        }
        if payload.channel == Channel::Email && subject.trim().is_empty() {
            return Err(Error::BadRequest("Assunto é obrigatório para email".to_string()));
        }
        Ok(Draft { subject, content })
    }

    /// Recipients as (candidate id, row). Ids missing from the sheet keep
    /// their place with no row so they are reported and logged as failures.
    async fn recipients(&self, payload: &SendMessagesPayload) -> Result<Vec<(String, Option<Record>)>> {
        if let Some(candidates) = &payload.candidates {
            return Ok(candidates
                .iter()
                .map(|c| {
                    let id = first_text(c, &[KEY_COLUMN, "id", "registration_number"]);
                    (id, Some(c.clone()))
                })
                .collect());
        }

        let ids = payload.candidate_ids.clone().unwrap_or_default();
        let sheet = self.candidates.sheet().await?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let record = sheet.find_row(KEY_COLUMN, &id).map(|row| sheet.record(row));
                (id, record)
            })
            .collect())
    }

    async fn deliver(
        &self,
        channel: Channel,
        sender: Option<&EmailAlias>,
        draft: &Draft,
        candidate: &Record,
    ) -> (String, String, Result<String>) {
        let content = personalize(&draft.content, candidate);
        match channel {
            Channel::Email => {
                let to = first_text(candidate, &["EMAIL", "email"]);
                let subject = personalize(&draft.subject, candidate);
                let outcome = match (check_recipient(&to), sender) {
                    (Err(e), _) => Err(e),
                    (Ok(()), None) => Err(Error::BadRequest("Remetente não configurado".to_string())),
                    (Ok(()), Some(alias)) => {
                        let email = OutgoingEmail {
                            from: alias.sender(&self.defaults.from_name),
                            to: to.trim().to_string(),
                            subject: subject.clone(),
                            html: render_html(&content),
                        };
                        self.email.send(&email).await
                    }
                };
                (to, content, outcome)
            }
            Channel::Sms => {
                let raw = first_text(candidate, &["TELEFONE", "telefone", "phone"]);
                match normalize_phone(&raw) {
                    Ok(to) => {
                        let sms = OutgoingSms {
                            to: to.clone(),
                            body: content.clone(),
                        };
                        let outcome = self.sms.send(&sms).await;
                        (to, content, outcome)
                    }
                    Err(e) => (raw, content, Err(e)),
                }
            }
        }
    }

    async fn append_log(&self, log: &MessageLog) {
        if let Err(e) = self.workbook.append_row(SHEET_MESSAGES, log.to_row()).await {
            warn!(error = %e, candidate = %log.registration_number, "failed to log message");
        }
    }

    /// One delivery attempt and one log row per recipient. Failures are
    /// collected; they never abort the batch.
    pub async fn send(&self, payload: &SendMessagesPayload) -> Result<SendReport> {
        let draft = self.draft(payload).await?;
        let recipients = self.recipients(payload).await?;
        let sender = match payload.channel {
            Channel::Email => Some(
                self.catalog
                    .resolve_alias(
                        payload.from_alias.as_deref(),
                        self.defaults.default_alias.as_deref(),
                    )
                    .await?,
            ),
            Channel::Sms => None,
        };

        let mut results = Vec::with_capacity(recipients.len());
        for (id, candidate) in recipients {
            let (recipient, content, outcome, name) = match &candidate {
                Some(candidate) => {
                    let (recipient, content, outcome) = self
                        .deliver(payload.channel, sender.as_ref(), &draft, candidate)
                        .await;
                    (recipient, content, outcome, candidate_name(candidate))
                }
                None => (
                    String::new(),
                    draft.content.clone(),
                    Err(Error::NotFound("Candidato não encontrado".to_string())),
                    String::new(),
                ),
            };

            let error = outcome.err().map(|e| e.to_string());
            let subject = match (&candidate, payload.channel) {
                (Some(c), Channel::Email) => personalize(&draft.subject, c),
                _ => draft.subject.clone(),
            };
            self.append_log(&MessageLog {
                timestamp: now_iso(),
                registration_number: id.clone(),
                channel: payload.channel.to_string(),
                recipient: recipient.clone(),
                subject,
                content,
                sent_by: payload.sent_by.clone(),
                status: match &error {
                    Some(reason) => MessageLog::failed(reason),
                    None => STATUS_SENT.to_string(),
                },
            })
            .await;

            if let Some(reason) = &error {
                warn!(candidate = %id, channel = %payload.channel, error = %reason, "delivery failed");
            }
            results.push(DeliveryResult {
                candidate_id: id,
                candidate_name: name,
                recipient,
                success: error.is_none(),
                error,
            });
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let fail_count = results.len() - success_count;
        info!(channel = %payload.channel, success_count, fail_count, "message batch finished");
        Ok(SendReport {
            success_count,
            fail_count,
            results,
        })
    }

    /// Returns `false` when the log sheet does not exist.
    pub async fn log(&self, payload: &LogMessagePayload) -> Result<bool> {
        if self.workbook.load(SHEET_MESSAGES).await?.is_none() {
            return Ok(false);
        }
        let log = MessageLog {
            timestamp: now_iso(),
            registration_number: payload.registration_number.clone(),
            channel: payload.channel.clone(),
            recipient: payload.recipient.clone(),
            subject: payload.subject.clone(),
            content: payload.content.clone(),
            sent_by: payload.sent_by.clone(),
            status: payload.status.clone(),
        };
        self.workbook.append_row(SHEET_MESSAGES, log.to_row()).await?;
        Ok(true)
    }

    pub async fn update_status(&self, payload: &MessageStatusPayload) -> Result<usize> {
        let column = payload.channel.sent_column();
        let sheet = self.candidates.sheet().await?;
        if sheet.column(column).is_none() {
            return Err(Error::BadRequest(format!("Coluna {} não encontrada", column)));
        }
        let fields = [(column, Value::String(payload.status.clone()))];
        let updated = self
            .candidates
            .stamp_rows(&payload.registration_numbers, &fields)
            .await?;
        info!(column, updated, "message status updated");
        Ok(updated)
    }
}
