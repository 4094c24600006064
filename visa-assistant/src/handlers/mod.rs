//! HTTP handlers for the visa assistant.

pub mod consultation;
pub mod health;
