#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use screening_backend::{
    config::Config,
    error::{Error, Result},
    routes,
    services::{
        email_service::{EmailSender, OutgoingEmail},
        sms_service::{OutgoingSms, SmsSender},
    },
    store::{
        memory::MemoryStore,
        schema::{
            ALIAS_HEADERS, MESSAGE_HEADERS, SHEET_ALIASES, SHEET_CANDIDATES, SHEET_MESSAGES,
            SHEET_USERS, USER_HEADERS,
        },
        RowStore,
    },
    AppState,
};

pub const SECRET: &str = "test_secret_key";

pub const CANDIDATE_HEADERS: &[&str] = &[
    "CPF",
    "NOMECOMPLETO",
    "EMAIL",
    "TELEFONE",
    "CARGOPRETENDIDO",
    "AREAATUACAO",
    "Status",
    "status_triagem",
    "analista_triagem",
    "motivo_desclassificacao",
    "observacoes_triagem",
    "data_hora_triagem",
    "updated_at",
    "email_sent",
    "sms_sent",
    "assigned_to",
    "assigned_by",
    "assigned_at",
    "status_entrevista",
    "entrevistador",
];

/// Records every delivery; recipients listed in `reject` fail.
#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub reject: Vec<String>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        if self.reject.contains(&email.to) {
            return Err(Error::Provider("mailbox unavailable".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("email-{}", sent.len()))
    }
}

#[derive(Default)]
pub struct RecordingSms {
    pub sent: Mutex<Vec<OutgoingSms>>,
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, sms: &OutgoingSms) -> Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(sms.clone());
        Ok(format!("SM{}", sent.len()))
    }
}

pub fn candidate(cpf: &str, name: &str, email: &str, phone: &str, triage: &str) -> Vec<JsonValue> {
    vec![
        json!(cpf),
        json!(name),
        json!(email),
        json!(phone),
        json!("Enfermeiro"),
        json!("Assistencial"),
        json!(""),
        json!(triage),
        json!(""),
        json!(""),
        json!(""),
        json!(""),
        json!(""),
        json!(""),
        json!(""),
    ]
}

pub fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_sheet(
            SHEET_USERS,
            USER_HEADERS,
            vec![
                vec![json!("admin@example.com"), json!("Admin"), json!("admin"), json!("TRUE"), json!("secret")],
                vec![json!("ana@example.com"), json!("Ana"), json!("analista"), json!("TRUE"), json!("")],
                vec![json!("ivo@example.com"), json!("Ivo"), json!("entrevistador"), json!("TRUE"), json!("")],
            ],
        )
        .with_sheet(
            SHEET_CANDIDATES,
            CANDIDATE_HEADERS,
            vec![
                candidate("11111111111", "Maria Souza", "maria@example.com", "(11) 98888-7777", "Classificado"),
                candidate("22222222222", "João Lima", "joao@example.com", "11 97777-6666", "classificado"),
                candidate("33333333333", "Rita Alves", "rita@example.com", "", "Desclassificado"),
            ],
        )
        .with_sheet(SHEET_MESSAGES, MESSAGE_HEADERS, vec![])
        .with_sheet(
            SHEET_ALIASES,
            ALIAS_HEADERS,
            vec![vec![json!("rh@example.com"), json!("Recursos Humanos")]],
        )
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub email: Arc<RecordingEmail>,
    pub sms: Arc<RecordingSms>,
}

impl TestApp {
    pub fn new(config: Config, store: MemoryStore, email: RecordingEmail) -> Self {
        let store = Arc::new(store);
        let email = Arc::new(email);
        let sms = Arc::new(RecordingSms::default());
        let row_store: Arc<dyn RowStore> = store.clone();
        let state = AppState::new(Arc::new(config), row_store, email.clone(), sms.clone());
        Self {
            router: routes::router(state),
            store,
            email,
            sms,
        }
    }

    pub fn open() -> Self {
        Self::new(Config::for_memory(SECRET), seeded_store(), RecordingEmail::default())
    }

    pub fn secured() -> Self {
        let mut config = Config::for_memory(SECRET);
        config.require_auth = true;
        Self::new(config, seeded_store(), RecordingEmail::default())
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, JsonValue) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, body)
    }

    pub async fn post(&self, body: JsonValue) -> (StatusCode, JsonValue) {
        self.send(post_json(body, None)).await
    }

    pub async fn post_as(&self, token: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.send(post_json(body, Some(token))).await
    }

    pub async fn get(&self, query: &str) -> (StatusCode, JsonValue) {
        let req = Request::builder()
            .method("GET")
            .uri(format!("/exec?{}", query))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn grid(&self, sheet: &str) -> Vec<Vec<JsonValue>> {
        self.store.snapshot(sheet).await.unwrap()
    }
}

pub fn post_json(body: JsonValue, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/exec")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
