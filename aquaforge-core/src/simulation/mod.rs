pub mod batch;
pub mod builder;
pub mod engine;
pub mod state;
