pub mod cache;
pub mod cli;
pub mod config;
pub mod crew;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod memory;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use crew::{Crew, CrewEngine, CrewError, KickoffInputs, KickoffOutput};
pub use generator::workflow::{generate_report, launch};
