// src/core/mod.rs — Request records, character profiles, model state and the pipeline

pub mod orchestrator;
pub mod profiles;
pub mod reference;
pub mod state;
pub mod types;
