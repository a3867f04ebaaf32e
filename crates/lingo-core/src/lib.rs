//! Core types, config, errors, and transcript model for Lingo.

pub mod config;
pub mod error;
pub mod transcript;
