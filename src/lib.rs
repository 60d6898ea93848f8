pub mod graph;
pub mod error;
pub mod engine;
pub mod trace;
pub mod builder;
pub mod samples;

pub use engine::{Machine, ReduceConfig};
pub use error::{ReduceError, Result};
pub use graph::{Code, CodeRef, Value};
