pub mod error;
pub mod evaluation;
pub mod logger;
pub mod simulation;
