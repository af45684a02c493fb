// src/core/mod.rs
//! Core monitoring components.

pub mod clipboard;
pub mod error;
pub mod peripheral;
pub mod risk;
pub mod shortcuts;
pub mod types;
