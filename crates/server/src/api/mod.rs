pub mod handlers;
pub mod library;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
