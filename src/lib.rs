pub mod api;
pub mod auth;
pub mod collaborators;
pub mod config;
pub mod db;
pub mod directory;
pub mod docs;
pub mod error;
pub mod leave;
pub mod model;
pub mod models;
pub mod notify;
pub mod routes;
pub mod storage;
pub mod store;
