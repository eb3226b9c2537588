pub mod candidate;
pub mod message;
pub mod reason;
pub mod user;
