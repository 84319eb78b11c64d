//! Shared helpers for handlers

pub mod upload;
