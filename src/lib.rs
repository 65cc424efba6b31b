pub mod cli;
pub mod error;
pub mod events;
pub mod gateway;
pub mod provider;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
