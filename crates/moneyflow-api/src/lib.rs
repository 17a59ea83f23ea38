//! # Moneyflow API
//!
//! The v1 REST surface of moneyflow: users, incomes and expenses.
//!
//! [`build_app`] registers every route on a fresh [`App`](moneyflow_server::App)
//! with the standard global chain; [`bootstrap`] turns a loaded
//! configuration into the collaborators the routes need.

#![doc(html_root_url = "https://docs.rs/moneyflow-api/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod handlers;
mod request;
mod routes;

pub use routes::{build_app, ApiState, API_VERSION};
