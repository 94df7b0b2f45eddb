//! Read-only document retrieval service
//!
//! A [`datasource::DataSource`] answers size, list, get, query and
//! get-metadata requests against an in-memory key to file index. The
//! [`server`] module exposes it over HTTP.

pub mod config;
pub mod datasource;
pub mod handler;
pub mod http;
pub mod index;
pub mod logger;
pub mod server;
