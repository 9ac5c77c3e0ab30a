pub mod contact;
pub mod log;
pub mod stats;
pub mod user;
