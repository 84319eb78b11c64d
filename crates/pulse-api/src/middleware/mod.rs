//! HTTP middleware and request-scoped logging

pub mod audit;
