//! HTTP handlers for all web routes.

pub mod api;
pub mod browser;
pub mod health;
pub mod rxnav;
