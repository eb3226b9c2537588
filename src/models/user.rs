use crate::store::{cell_text, is_true_flag, Sheet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Analista,
    Entrevistador,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Analista => "analista",
            Role::Entrevistador => "entrevistador",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "analista" => Ok(Role::Analista),
            "entrevistador" => Ok(Role::Entrevistador),
            other => Err(format!("Role inválida: {}", other)),
        }
    }
}

/// A row of `USUARIOS`. The role is kept as written in the sheet since
/// older rows may carry values outside [`Role`].
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub active: bool,
    #[serde(skip)]
    pub password: Option<String>,
}

impl User {
    /// `None` for rows without an email.
    pub fn from_row(sheet: &Sheet, row: usize) -> Option<Self> {
        let email = sheet.text(row, "Email");
        if email.is_empty() {
            return None;
        }
        let role = sheet.text(row, "Role");
        let password = cell_text(sheet.value(row, "Password"));
        Some(Self {
            id: email.clone(),
            email,
            name: sheet.text(row, "Nome"),
            role: if role.is_empty() { Role::Analista.to_string() } else { role },
            active: is_true_flag(sheet.value(row, "Ativo")),
            password: (!password.is_empty()).then_some(password),
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role.eq_ignore_ascii_case(role.as_str())
    }
}

/// Analyst listing keeps the sheet's capitalised keys.
#[derive(Debug, Clone, Serialize)]
pub struct AnalystView {
    pub id: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Nome")]
    pub name: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Ativo")]
    pub active: bool,
}

impl From<User> for AnalystView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            active: user.active,
        }
    }
}

/// Answer to a role lookup, flattened into the response body.
#[derive(Debug, Clone, Serialize)]
pub struct UserRole {
    pub email: String,
    pub nome: String,
    pub role: String,
    pub ativo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<User> for UserRole {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            nome: user.name,
            role: user.role,
            ativo: user.active,
            token: None,
        }
    }
}

/// Text stored in the `Ativo` column.
pub fn active_flag(active: bool) -> &'static str {
    if active {
        "TRUE"
    } else {
        "FALSE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Analista".parse::<Role>().unwrap(), Role::Analista);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!("gerente".parse::<Role>().is_err());
    }

    #[test]
    fn from_row_defaults_role_and_reads_active_flag() {
        let sheet = Sheet::from_grid(
            "USUARIOS",
            vec![
                vec![json!("Email"), json!("Nome"), json!("Role"), json!("Ativo"), json!("Password")],
                vec![json!("ana@example.com"), json!("Ana"), json!(""), json!("TRUE"), json!("")],
                vec![json!(""), json!("Sem email"), json!("admin"), json!(true), json!("x")],
            ],
        );
        let user = User::from_row(&sheet, 0).unwrap();
        assert_eq!(user.role, "analista");
        assert!(user.active);
        assert!(user.password.is_none());
        assert!(User::from_row(&sheet, 1).is_none());
    }
}
