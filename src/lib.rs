pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod http;
pub mod models;
pub mod prompts;
pub mod query;
pub mod render;
pub mod service;
pub mod store;
pub mod summarizer;
pub mod transport;
pub mod validation;

pub use crate::config::Config;
pub use crate::error::{NlqError, Result};
pub use crate::models::{AskReport, Outcome};
pub use crate::service::NlqService;
