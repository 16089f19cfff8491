//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate access checks and repository calls into use-case level APIs.
//! - Keep RPC/CLI layers decoupled from storage details.

pub mod note_service;
