use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers one email and returns the provider's message id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}

/// Plain text to the minimal HTML the provider expects.
pub fn render_html(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\n', "<br>")
}

pub fn check_recipient(address: &str) -> Result<()> {
    if address.trim().is_empty() {
        return Err(Error::BadRequest("Email do destinatário ausente".to_string()));
    }
    if !address.trim().to_string().validate_email() {
        return Err(Error::BadRequest("Formato de email inválido".to_string()));
    }
    Ok(())
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl ResendClient {
    pub fn new(client: Client, api_base: &str, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            info!("Email delivery disabled (RESEND_API_KEY not set)");
        }
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Provider("Serviço de email não configurado".to_string()))?;

        let body = ResendRequest {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };
        let resp = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, to = %email.to, "email provider rejected message");
            return Err(Error::Provider(format!("Erro ao enviar email: {}", text)));
        }

        let sent: ResendResponse = resp.json().await?;
        info!(to = %email.to, id = %sent.id, "email sent");
        Ok(sent.id)
    }
}
