//! Pulse & Threads mall API library.
//!
//! This crate provides the mall API as a library, allowing it to be tested
//! and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
pub mod validation;
