pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod store;
