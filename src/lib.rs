pub mod cli;
pub mod config;
pub mod error;
pub mod leonardo;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod shell;

pub use config::ConfigStore;
pub use error::{LeonardoError, Result};
pub use leonardo::LeonardoClient;
pub use models::{GenerationJob, GenerationRequest, JobStatus};
pub use orchestrator::Orchestrator;
