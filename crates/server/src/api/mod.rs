pub mod authors;
pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod params;
pub mod routes;
pub mod titles;

pub use routes::create_router;
