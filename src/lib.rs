pub mod admin;
pub mod auth;
pub mod cli;
pub mod config;
pub mod consultas;
pub mod database;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod repo;
pub mod schema;
pub mod types;
pub mod util;

pub(crate) mod internal;
