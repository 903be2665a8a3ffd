//! Triptych - A trilingual CMS backend
//!
//! This library provides the core functionality for the Triptych CMS:
//! schema registry, access policies, persistence and the HTTP API.

pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod services;
