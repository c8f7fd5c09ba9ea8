//! Core use-case services.
//!
//! # Responsibility
//! - Expose the request/response contract a network front end consumes.
//! - Keep transport layers decoupled from storage details.

pub mod metadata_service;
