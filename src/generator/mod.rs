pub mod context;
pub mod outlet;
pub mod recovery;
pub mod roster;
pub mod types;
pub mod workflow;
