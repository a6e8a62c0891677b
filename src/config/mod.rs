//! Configuration module

pub mod credential;
pub mod settings;

pub use credential::ApiCredential;
pub use settings::*;
