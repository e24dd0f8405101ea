//! API server module exposing document indexing and question answering via REST

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::build_app;
pub use server::build_state;
pub use server::serve_api;
