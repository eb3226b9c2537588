pub mod crypto;
pub mod placeholders;
pub mod time;
pub mod token;
