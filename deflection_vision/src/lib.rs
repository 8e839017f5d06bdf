// THEORY:
// This file is the main entry point for the `deflection_vision` library crate.
// It exports the `DeflectionPipeline` and its associated data structures
// (`PipelineConfig`, `FrameReport`, `Command`, etc.) as the high-level interface
// for tracking an actuator's neutral axis and its deflection. The individual
// stages live in `core_modules` and stay usable on their own.

pub mod config;
pub mod core_modules;
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::{Command, CommandOutcome, DeflectionPipeline, Detection, FrameReport};
