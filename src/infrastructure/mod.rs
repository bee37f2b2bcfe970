//! Infrastructure layer: configuration, persistence boundaries, and the
//! authentication/authorization services

pub mod auth;
pub mod config;
pub mod constants;
pub mod repository;
pub mod secret;
pub mod utils;
