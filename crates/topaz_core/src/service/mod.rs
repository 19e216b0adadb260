//! Use-case services exposed to front ends.
//!
//! # Responsibility
//! - Wrap repositories into a handle that is safe to share across threads.
//! - Keep front ends decoupled from SQL and connection details.

pub mod note_service;
