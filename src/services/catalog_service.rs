use crate::error::{Error, Result};
use crate::models::message::{EmailAlias, MessageTemplate};
use crate::models::reason::DisqualificationReason;
use crate::store::schema::{SHEET_ALIASES, SHEET_REASONS, SHEET_TEMPLATES};
use crate::store::Workbook;

/// Read-only lookups: disqualification reasons, message templates and
/// sender aliases. Missing sheets read as empty lists.
#[derive(Clone)]
pub struct CatalogService {
    workbook: Workbook,
}

impl CatalogService {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    pub async fn reasons(&self, include_inactive: bool) -> Result<Vec<DisqualificationReason>> {
        let Some(sheet) = self.workbook.load(SHEET_REASONS).await? else {
            return Ok(Vec::new());
        };
        Ok((0..sheet.len())
            .filter_map(|row| DisqualificationReason::from_row(&sheet, row))
            .filter(|r| include_inactive || r.is_active)
            .collect())
    }

    pub async fn templates(&self) -> Result<Vec<MessageTemplate>> {
        let Some(sheet) = self.workbook.load(SHEET_TEMPLATES).await? else {
            return Ok(Vec::new());
        };
        Ok((0..sheet.len())
            .filter_map(|row| MessageTemplate::from_row(&sheet, row))
            .collect())
    }

    pub async fn template(&self, id: &str) -> Result<MessageTemplate> {
        self.templates()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("Template {} não encontrado", id)))
    }

    pub async fn aliases(&self) -> Result<Vec<EmailAlias>> {
        let Some(sheet) = self.workbook.load(SHEET_ALIASES).await? else {
            return Ok(Vec::new());
        };
        Ok(sheet
            .records()
            .iter()
            .filter_map(EmailAlias::from_record)
            .collect())
    }

    /// Sender for outgoing email: the requested alias, then the configured
    /// default, then the first alias on the sheet.
    pub async fn resolve_alias(
        &self,
        requested: Option<&str>,
        configured: Option<&str>,
    ) -> Result<EmailAlias> {
        let aliases = self.aliases().await?;
        let lookup = |address: &str| {
            aliases
                .iter()
                .find(|a| a.email.eq_ignore_ascii_case(address.trim()))
                .cloned()
                .unwrap_or_else(|| EmailAlias {
                    email: address.trim().to_string(),
                    name: String::new(),
                })
        };

        if let Some(address) = requested.or(configured) {
            return Ok(lookup(address));
        }
        aliases
            .first()
            .cloned()
            .ok_or_else(|| Error::BadRequest("Nenhum alias de email configurado".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::schema::{ALIAS_HEADERS, REASON_HEADERS, TEMPLATE_HEADERS};
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> CatalogService {
        let store = MemoryStore::new()
            .with_sheet(
                SHEET_REASONS,
                REASON_HEADERS,
                vec![
                    vec![json!("M001"), json!("Documentação incompleta"), json!("Sim")],
                    vec![json!("M002"), json!("Desativado"), json!("Não")],
                ],
            )
            .with_sheet(
                SHEET_TEMPLATES,
                TEMPLATE_HEADERS,
                vec![
                    vec![json!("T1"), json!("Convocação"), json!("email"), json!("Olá [NOME]"), json!("Corpo")],
                    vec![json!("T2"), json!(""), json!("sms"), json!(""), json!("sem nome")],
                ],
            )
            .with_sheet(
                SHEET_ALIASES,
                ALIAS_HEADERS,
                vec![
                    vec![json!("rh@example.com"), json!("RH")],
                    vec![json!("selecao@example.com"), json!("Seleção")],
                ],
            );
        CatalogService::new(Workbook::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn inactive_reasons_are_hidden_by_default() {
        let catalog = service();
        assert_eq!(catalog.reasons(false).await.unwrap().len(), 1);
        assert_eq!(catalog.reasons(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn templates_need_a_name() {
        let catalog = service();
        let templates = catalog.templates().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(catalog.template("T1").await.unwrap().subject, "Olá [NOME]");
        assert!(catalog.template("T2").await.is_err());
    }

    #[tokio::test]
    async fn alias_resolution_order() {
        let catalog = service();
        let requested = catalog
            .resolve_alias(Some("SELECAO@example.com"), Some("rh@example.com"))
            .await
            .unwrap();
        assert_eq!(requested.name, "Seleção");

        let configured = catalog.resolve_alias(None, Some("outro@example.com")).await.unwrap();
        assert_eq!(configured.email, "outro@example.com");

        let first = catalog.resolve_alias(None, None).await.unwrap();
        assert_eq!(first.email, "rh@example.com");

        let empty = CatalogService::new(Workbook::new(Arc::new(MemoryStore::new())));
        assert!(empty.resolve_alias(None, None).await.is_err());
        assert!(empty.reasons(false).await.unwrap().is_empty());
    }
}
