// HTTP surface of the bookstore catalogue service

pub mod handlers;
pub mod routes;
pub mod state;
