pub mod candidate_service;
pub mod catalog_service;
pub mod email_service;
pub mod export_service;
pub mod interview_service;
pub mod message_service;
pub mod report_service;
pub mod sms_service;
pub mod user_service;
