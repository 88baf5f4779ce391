//! HTTP surface: routes, handlers and error mapping.

pub mod auth_handlers;
pub mod handlers;
pub mod routes;

pub use routes::create_router;
