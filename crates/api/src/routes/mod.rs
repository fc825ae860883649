//! API route handlers

pub mod alerts;
pub mod risk;
