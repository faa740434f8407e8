pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the router builder to make it easily accessible
// to the binary that will build the web server.
pub use middleware::require_user;
pub use router::api_router;
