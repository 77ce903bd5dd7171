//! Concrete web search provider implementations.

pub mod brave;
pub mod searx;

pub use brave::BraveProvider;
pub use searx::SearxProvider;
