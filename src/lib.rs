pub mod calibration;
pub mod confidence;
pub mod config;
pub mod errors;
pub mod llm;
pub mod parsing;
pub mod pipeline;
pub mod prompt;
pub mod store;
pub mod types;
