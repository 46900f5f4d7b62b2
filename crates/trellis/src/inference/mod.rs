//! Inference of meta variable kinds from column content.

mod config;
mod engine;

pub use config::InferenceConfig;
pub use engine::{ColumnProfile, InferenceRule, InferredMeta, TypeInference};
