//! HTTP request handlers.

pub mod assistants;
pub mod auth;
pub mod client;
pub mod facebook;
pub mod files;
pub mod health;
pub mod runs;
pub mod whatsapp;
