//! HTTP front door for listing-reel generation: accepts submissions,
//! debits a credit, queues the job and reports its progress.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
