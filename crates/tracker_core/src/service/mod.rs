//! Use-case services spanning more than one repository.
//!
//! # Responsibility
//! - Orchestrate whole-store operations (backup export/import, clear).
//! - Keep callers away from raw storage keys.

pub mod backup_service;
