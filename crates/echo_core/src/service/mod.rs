//! Use-case layer over the API client, cache and reminder pipeline.

pub mod dashboard_service;
pub mod reminder_service;
