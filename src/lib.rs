// src/lib.rs — Library root for sovits-bridge

pub mod api;
pub mod backend;
pub mod cli;
pub mod core;
pub mod infra;
pub mod plugins;
