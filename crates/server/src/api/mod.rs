pub mod handlers;
pub mod middleware;
pub mod nodes;
pub mod queue;
pub mod routes;

pub use routes::create_router;
