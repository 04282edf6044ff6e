pub mod engine;
pub mod types;

pub use engine::QueryEngine;
pub use types::{FilterOptions, Summary, ViewQuery, ViewResult};
