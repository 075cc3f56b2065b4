// Shared library for the bookstore catalogue service: configuration,
// data-access gateway, repositories, models and telemetry

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod telemetry;
