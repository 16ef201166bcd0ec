//! Competitive dialogue tender service
//!
//! Field-visibility roles, role resolution, ACL derivation and validation for
//! both dialogue stages, served over HTTP.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod policy;
pub mod routes;
pub mod services;
