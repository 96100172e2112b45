//! Newspaper Agency - newsroom management for redactors, topics and newspapers
//!
//! This library provides the storage, business rules, HTML screens and JSON
//! API of the application. The binary in `main.rs` wires them to a server.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod templates;
pub mod views;
