// Middleware for CORS and request tracing

pub mod cors;
pub mod trace;

pub use cors::*;
pub use trace::*;
