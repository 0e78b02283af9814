pub mod aggregate;
pub mod config;
pub mod discharge;
pub mod error;
pub mod frames;
pub mod ordering;
pub mod pipeline;
pub mod reshape;
pub mod site_filter;
pub mod split;

pub use error::{PipelineError, Result};
