pub mod api;
pub mod db;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
