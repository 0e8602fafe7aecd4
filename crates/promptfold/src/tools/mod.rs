//! Tool descriptions offered to the model.

pub mod spec;

pub use spec::ToolSpec;
