use crate::store::{cell_text, Record, Sheet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }

    /// Candidate column that records whether this channel was used.
    pub fn sent_column(&self) -> &'static str {
        match self {
            Channel::Email => "email_sent",
            Channel::Sms => "sms_sent",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            other => Err(format!("Tipo de mensagem inválido: {}", other)),
        }
    }
}

pub const STATUS_SENT: &str = "Enviado";

/// One row of `MENSAGENS`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageLog {
    pub timestamp: String,
    pub registration_number: String,
    pub channel: String,
    pub recipient: String,
    pub subject: String,
    pub content: String,
    pub sent_by: String,
    pub status: String,
}

impl MessageLog {
    pub fn failed(reason: &str) -> String {
        format!("Falha: {}", reason)
    }

    /// Values in `MENSAGENS` column order.
    pub fn to_row(&self) -> Vec<Value> {
        [
            &self.timestamp,
            &self.registration_number,
            &self.channel,
            &self.recipient,
            &self.subject,
            &self.content,
            &self.sent_by,
            &self.status,
        ]
        .into_iter()
        .map(|v| Value::String(v.clone()))
        .collect()
    }
}

/// A row of `TEMPLATES`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    pub channel: String,
    pub subject: String,
    pub content: String,
}

impl MessageTemplate {
    pub fn from_row(sheet: &Sheet, row: usize) -> Option<Self> {
        let name = sheet.text(row, "nome");
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: sheet.text(row, "id"),
            name,
            channel: sheet.text(row, "tipo"),
            subject: sheet.text(row, "assunto"),
            content: sheet.text(row, "conteudo"),
        })
    }
}

/// A row of `ALIAS`: a sender address selectable for email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAlias {
    pub email: String,
    pub name: String,
}

impl EmailAlias {
    pub fn from_record(record: &Record) -> Option<Self> {
        let email = record.get("email").map(cell_text).unwrap_or_default();
        if email.trim().is_empty() {
            return None;
        }
        Some(Self {
            email: email.trim().to_string(),
            name: record.get("nome").map(cell_text).unwrap_or_default(),
        })
    }

    /// `Name <address>`, or the bare address when the alias has no name.
    pub fn sender(&self, fallback_name: &str) -> String {
        let name = if self.name.is_empty() { fallback_name } else { &self.name };
        if name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", name, self.email)
        }
    }
}
