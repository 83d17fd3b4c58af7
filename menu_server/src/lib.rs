//! # Menu server
//! This crate hosts the HTTP server for the table-side menu. It is responsible for:
//! * Taking orders from customers' tables.
//! * Letting staff log in, work through the order queue and manage the menu.
//! * Pushing every new order and status change to the kitchen and floor displays as it happens.
//! * Serving sales reports to staff.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Everything except the bare `/health` probe lives under `/api`. See [routes](routes/index.html) for the full list,
//! and [event_stream](event_stream/index.html) for the live order feed.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod event_stream;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
