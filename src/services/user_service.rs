use crate::dto::action_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result};
use crate::models::user::{active_flag, Role, User, UserRole};
use crate::store::schema::SHEET_USERS;
use crate::store::{Record, Sheet, Workbook};
use crate::utils::crypto::{check_stored_password, hash_password};
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    workbook: Workbook,
}

fn users_sheet_missing() -> Error {
    Error::NotFound("Planilha de usuários não encontrada".to_string())
}

fn user_not_found() -> Error {
    Error::NotFound("Usuário não encontrado".to_string())
}

/// Emails are matched case-insensitively everywhere.
fn find_user_row(sheet: &Sheet, email: &str) -> Option<usize> {
    let wanted = email.trim().to_lowercase();
    (0..sheet.len()).find(|&row| {
        let stored = sheet.text(row, "Email");
        !stored.is_empty() && stored.trim().to_lowercase() == wanted
    })
}

impl UserService {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    async fn users(&self) -> Result<Option<Sheet>> {
        self.workbook.load(SHEET_USERS).await
    }

    async fn find_user(&self, email: &str) -> Result<User> {
        let sheet = self.users().await?.ok_or_else(users_sheet_missing)?;
        if sheet.is_empty() {
            return Err(Error::NotFound("Nenhum usuário cadastrado".to_string()));
        }
        let row = find_user_row(&sheet, email).ok_or_else(user_not_found)?;
        User::from_row(&sheet, row).ok_or_else(user_not_found)
    }

    /// Role lookup. A supplied password is checked only when the row has one.
    pub async fn get_user_role(&self, email: &str, password: Option<&str>) -> Result<UserRole> {
        let user = self.find_user(email).await?;

        if let (Some(given), Some(stored)) = (password, user.password.as_deref()) {
            if !check_stored_password(given, stored) {
                return Err(Error::Unauthorized("Senha incorreta".to_string()));
            }
        }

        info!(email = %user.email, role = %user.role, "user role resolved");
        Ok(UserRole::from(user))
    }

    /// Login for token issuance: the row must carry a matching password and
    /// be active.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRole> {
        let user = self.find_user(email).await?;

        let Some(stored) = user.password.as_deref() else {
            warn!(email = %user.email, "login refused, no password on record");
            return Err(Error::Unauthorized("Usuário sem senha cadastrada".to_string()));
        };
        if !check_stored_password(password, stored) {
            return Err(Error::Unauthorized("Senha incorreta".to_string()));
        }
        if !user.active {
            warn!(email = %user.email, "login refused, inactive user");
            return Err(Error::Forbidden("Usuário inativo".to_string()));
        }

        info!(email = %user.email, role = %user.role, "user authenticated");
        Ok(UserRole::from(user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let Some(sheet) = self.users().await? else {
            return Ok(Vec::new());
        };
        Ok((0..sheet.len())
            .filter_map(|row| User::from_row(&sheet, row))
            .collect())
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let users = self.list_users().await?;
        Ok(users.into_iter().filter(|u| u.has_role(role)).collect())
    }

    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<()> {
        payload.validate()?;
        let sheet = self.users().await?.ok_or_else(users_sheet_missing)?;
        if find_user_row(&sheet, &payload.email).is_some() {
            return Err(Error::AlreadyExists("Usuário já existe".to_string()));
        }

        let mut record = Record::new();
        record.insert("Email".into(), Value::String(payload.email.clone()));
        record.insert("Nome".into(), Value::String(payload.name));
        record.insert("Role".into(), Value::String(payload.role.to_string()));
        record.insert("Ativo".into(), Value::String(active_flag(payload.active).into()));
        let hashed = hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))?;
        record.insert("Password".into(), Value::String(hashed));
        self.workbook.append_record(&sheet, &record).await?;

        info!(email = %payload.email, role = %payload.role, "user created");
        Ok(())
    }

    /// Writes only the fields present in the payload.
    pub async fn update_user(&self, payload: UpdateUserPayload) -> Result<usize> {
        let sheet = self.users().await?.ok_or_else(users_sheet_missing)?;
        let row = find_user_row(&sheet, &payload.email).ok_or_else(user_not_found)?;

        let mut fields: Vec<(&str, Value)> = Vec::new();
        if let Some(name) = payload.name {
            fields.push(("Nome", Value::String(name)));
        }
        if let Some(role) = payload.role {
            fields.push(("Role", Value::String(role.to_string())));
        }
        if let Some(active) = payload.active {
            fields.push(("Ativo", Value::String(active_flag(active).into())));
        }
        let written = self.workbook.set_fields(&sheet, row, &fields).await?;
        info!(email = %payload.email, fields = written, "user updated");
        Ok(written)
    }

    pub async fn delete_user(&self, email: &str) -> Result<()> {
        let sheet = self.users().await?.ok_or_else(users_sheet_missing)?;
        let row = find_user_row(&sheet, email).ok_or_else(user_not_found)?;
        self.workbook.delete_row(&sheet, row).await?;
        info!(email = %email, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::params::Params;
    use crate::store::memory::MemoryStore;
    use crate::store::schema::USER_HEADERS;
    use serde_json::json;
    use std::sync::Arc;

    fn service_with(store: Arc<MemoryStore>) -> UserService {
        UserService::new(Workbook::new(store))
    }

    fn seeded() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_sheet(
            SHEET_USERS,
            USER_HEADERS,
            vec![
                vec![json!("Ana@Example.com"), json!("Ana"), json!("admin"), json!("TRUE"), json!("segredo")],
                vec![json!("bruno@example.com"), json!("Bruno"), json!("Analista"), json!(false), json!("")],
                vec![json!("carla@example.com"), json!("Carla"), json!("entrevistador"), json!("TRUE"), json!("")],
            ],
        ))
    }

    #[tokio::test]
    async fn role_lookup_ignores_email_case_and_checks_legacy_passwords() {
        let service = service_with(seeded());
        let role = service.get_user_role("ana@example.com", Some("segredo")).await.unwrap();
        assert_eq!(role.role, "admin");
        assert!(role.ativo);

        let wrong = service.get_user_role("ana@example.com", Some("outra")).await;
        assert!(matches!(wrong, Err(Error::Unauthorized(_))));

        // No stored password: any supplied password is accepted.
        assert!(service.get_user_role("bruno@example.com", Some("x")).await.is_ok());

        let missing = service.get_user_role("zeca@example.com", None).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn strict_login_needs_a_stored_password_and_an_active_row() {
        let store = Arc::new(MemoryStore::new().with_sheet(
            SHEET_USERS,
            USER_HEADERS,
            vec![
                vec![json!("ana@example.com"), json!("Ana"), json!("admin"), json!("TRUE"), json!("segredo")],
                vec![json!("off@example.com"), json!("Off"), json!("admin"), json!("FALSE"), json!("segredo")],
                vec![json!("nopw@example.com"), json!("Sem"), json!("admin"), json!("TRUE"), json!("")],
            ],
        ));
        let service = service_with(store);

        let ok = service.authenticate("ANA@example.com", "segredo").await.unwrap();
        assert_eq!(ok.role, "admin");

        let wrong = service.authenticate("ana@example.com", "outra").await;
        assert!(matches!(wrong, Err(Error::Unauthorized(_))));

        let inactive = service.authenticate("off@example.com", "segredo").await;
        assert!(matches!(inactive, Err(Error::Forbidden(ref m)) if m == "Usuário inativo"));

        // wrong password on an inactive row does not reveal the flag
        let hidden = service.authenticate("off@example.com", "x").await;
        assert!(matches!(hidden, Err(Error::Unauthorized(_))));

        let no_password = service.authenticate("nopw@example.com", "anything").await;
        assert!(matches!(no_password, Err(Error::Unauthorized(_))));

        // the lenient lookup still serves rows without a password
        assert!(service.get_user_role("nopw@example.com", Some("anything")).await.is_ok());
    }

    #[tokio::test]
    async fn role_filters_are_case_insensitive() {
        let service = service_with(seeded());
        let analysts = service.list_by_role(Role::Analista).await.unwrap();
        assert_eq!(analysts.len(), 1);
        assert_eq!(analysts[0].email, "bruno@example.com");
        assert_eq!(service.list_by_role(Role::Entrevistador).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_user_is_rejected_without_appending() {
        let store = seeded();
        let service = service_with(store.clone());
        let params: Params = serde_json::from_value(json!({
            "email": "ANA@example.com", "name": "Outra Ana", "role": "analista"
        }))
        .unwrap();
        let result = service
            .create_user(CreateUserPayload::from_params(&params).unwrap())
            .await;
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(store.snapshot(SHEET_USERS).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn created_users_get_a_hashed_default_password() {
        let store = seeded();
        let service = service_with(store.clone());
        let params: Params = serde_json::from_value(json!({
            "email": "davi@example.com", "name": "Davi", "role": "entrevistador", "active": "true"
        }))
        .unwrap();
        service
            .create_user(CreateUserPayload::from_params(&params).unwrap())
            .await
            .unwrap();

        let grid = store.snapshot(SHEET_USERS).await.unwrap();
        let row = grid.last().unwrap();
        assert_eq!(row[3], json!("TRUE"));
        let stored = row[4].as_str().unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(service.get_user_role("davi@example.com", Some("123456")).await.is_ok());
    }

    #[tokio::test]
    async fn update_writes_only_given_fields() {
        let store = seeded();
        let service = service_with(store.clone());
        let written = service
            .update_user(UpdateUserPayload {
                email: "bruno@example.com".into(),
                name: None,
                role: None,
                active: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(written, 1);
        let grid = store.snapshot(SHEET_USERS).await.unwrap();
        assert_eq!(grid[2][1], json!("Bruno"));
        assert_eq!(grid[2][2], json!("Analista"));
        assert_eq!(grid[2][3], json!("TRUE"));
    }

    #[tokio::test]
    async fn deleting_unknown_user_mutates_nothing() {
        let store = seeded();
        let service = service_with(store.clone());
        let result = service.delete_user("zeca@example.com").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(store.snapshot(SHEET_USERS).await.unwrap().len(), 4);

        tokio_test::assert_ok!(service.delete_user("carla@example.com").await);
        assert_eq!(store.snapshot(SHEET_USERS).await.unwrap().len(), 3);
    }
}
