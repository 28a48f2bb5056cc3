// Content Automation Engine - Core
//
// This crate drives AI content generation jobs through a four-stage
// pipeline (content -> metadata -> images -> publish) against a
// WordPress site, and runs recurring campaigns that feed a rotating
// prompt pool into the same pipeline on a schedule.
//
// The HTTP transport and dashboard bind to the engine from outside;
// they are not part of this crate.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
