use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingSms {
    pub to: String,
    pub body: String,
}

/// Delivers one SMS and returns the provider's message id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, sms: &OutgoingSms) -> Result<String>;
}

/// E.164 with the Brazilian country code: digits only, `55` prefixed when
/// absent, then `+`. The result must be 12 to 14 characters long.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(Error::BadRequest("Telefone do destinatário ausente".to_string()));
    }
    let with_country = if digits.starts_with("55") {
        digits
    } else {
        format!("55{}", digits)
    };
    let formatted = format!("+{}", with_country);
    if !(12..=14).contains(&formatted.len()) {
        return Err(Error::BadRequest(format!(
            "Número de telefone inválido: {}",
            formatted
        )));
    }
    Ok(formatted)
}

#[derive(Deserialize)]
struct TwilioResponse {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    api_base: String,
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
}

impl TwilioClient {
    pub fn new(
        client: Client,
        api_base: &str,
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Self {
        if account_sid.is_none() || auth_token.is_none() || from_number.is_none() {
            info!("SMS delivery disabled (Twilio credentials not set)");
        }
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
            from_number,
        }
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send(&self, sms: &OutgoingSms) -> Result<String> {
        let (Some(sid), Some(token), Some(from)) = (
            self.account_sid.as_deref(),
            self.auth_token.as_deref(),
            self.from_number.as_deref(),
        ) else {
            return Err(Error::Provider("Credenciais do Twilio não configuradas".to_string()));
        };

        let url = format!("{}/Accounts/{}/Messages.json", self.api_base, sid);
        let resp = self
            .client
            .post(url)
            .basic_auth(sid, Some(token))
            .form(&[("To", sms.to.as_str()), ("From", from), ("Body", sms.body.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, to = %sms.to, "sms provider rejected message");
            return Err(Error::Provider(format!("Erro ao enviar SMS: {}", text)));
        }

        let sent: TwilioResponse = resp.json().await?;
        info!(to = %sms.to, sid = %sent.sid, status = ?sent.status, "sms sent");
        Ok(sent.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phones_are_normalised_to_brazilian_e164() {
        assert_eq!(normalize_phone("(11) 98765-4321").unwrap(), "+5511987654321");
        assert_eq!(normalize_phone("+55 11 98765-4321").unwrap(), "+5511987654321");
        assert_eq!(normalize_phone("1133334444").unwrap(), "+551133334444");
    }

    #[test]
    fn implausible_numbers_are_rejected() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("123").is_err());
        assert!(normalize_phone("11 98765 4321 9999").is_err());
    }
}
