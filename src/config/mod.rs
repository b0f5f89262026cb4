pub mod engine;

pub use engine::{EngineConfig, MlConfig, ServiceConfig, TablesConfig};
