//! Core business logic modules.

pub mod checkpoint;
pub mod coordinator;
pub mod journal;
pub mod mover;
pub mod normalizer;
pub mod parser;
pub mod patterns;
pub mod planner;
pub mod scanner;
