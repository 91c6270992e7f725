pub mod app;
pub mod auth;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod feedback;
pub mod llm;
pub mod plans;
pub mod profiles;
pub mod repair;
pub mod state;
