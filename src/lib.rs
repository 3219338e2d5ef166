pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod notice;
pub mod routes;
pub mod store;
pub mod upload;
