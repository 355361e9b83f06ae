//! Route handlers for the HTTP API.

pub mod admin;
pub mod cut;
pub mod files;
pub mod health;
pub mod streaming;
