pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::services::{
    candidate_service::CandidateService,
    catalog_service::CatalogService,
    email_service::{EmailSender, ResendClient},
    interview_service::InterviewService,
    message_service::{MessageService, SenderDefaults},
    report_service::ReportService,
    sms_service::{SmsSender, TwilioClient},
    user_service::UserService,
};
use crate::store::{
    memory::MemoryStore, postgres::PgSheetStore, sheets::GoogleSheetsStore, RowStore, Workbook,
};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub workbook: Workbook,
    pub user_service: UserService,
    pub candidate_service: CandidateService,
    pub interview_service: InterviewService,
    pub catalog_service: CatalogService,
    pub message_service: MessageService,
    pub report_service: ReportService,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn RowStore>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        let workbook = Workbook::new(store);
        let user_service = UserService::new(workbook.clone());
        let candidate_service = CandidateService::new(workbook.clone());
        let interview_service = InterviewService::new(workbook.clone(), candidate_service.clone());
        let catalog_service = CatalogService::new(workbook.clone());
        let message_service = MessageService::new(
            workbook.clone(),
            candidate_service.clone(),
            catalog_service.clone(),
            email,
            sms,
            SenderDefaults {
                from_name: config.email_from_name.clone(),
                default_alias: config.default_email_alias.clone(),
            },
        );
        let report_service = ReportService::new(candidate_service.clone());

        Self {
            config,
            workbook,
            user_service,
            candidate_service,
            interview_service,
            catalog_service,
            message_service,
            report_service,
        }
    }

    /// State wired to the real delivery providers named in `config`.
    pub fn with_providers(config: Arc<Config>, store: Arc<dyn RowStore>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let email = ResendClient::new(
            http_client.clone(),
            &config.resend_api_base,
            config.resend_api_key.clone(),
        );
        let sms = TwilioClient::new(
            http_client,
            &config.twilio_api_base,
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_phone_number.clone(),
        );

        Ok(Self::new(config, store, Arc::new(email), Arc::new(sms)))
    }
}

/// Opens the row store selected by `STORE_BACKEND`.
pub async fn build_store(config: &Config) -> Result<Arc<dyn RowStore>> {
    let store: Arc<dyn RowStore> = match config.store_backend {
        StoreBackend::Sheets => {
            let spreadsheet_id = config
                .spreadsheet_id
                .clone()
                .ok_or_else(|| Error::Config("SPREADSHEET_ID is not set".to_string()))?;
            let token = config
                .google_sheets_access_token
                .clone()
                .ok_or_else(|| Error::Config("GOOGLE_SHEETS_ACCESS_TOKEN is not set".to_string()))?;
            Arc::new(GoogleSheetsStore::new(
                config.sheets_api_base.clone(),
                spreadsheet_id,
                token,
            )?)
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| Error::Config("DATABASE_URL is not set".to_string()))?;
            let pool = database::pool::create_pool(url).await?;
            Arc::new(PgSheetStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
