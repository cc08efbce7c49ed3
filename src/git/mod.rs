pub mod auth;
pub mod repo;
