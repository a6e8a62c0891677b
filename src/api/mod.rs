//! API module - HTTP routes, handlers, and models

pub mod classify;
pub mod handlers;
pub mod models;
pub mod relay_handlers;
pub mod routes;
