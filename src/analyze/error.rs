use thiserror::Error;

/// Internal faults of the scoring pipeline. Never leaves the engine: `analyze`
/// turns any of these into the fallback result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("signal `{signal}` is not a finite number")]
    NonFiniteSignal { signal: &'static str },

    #[error("combined score is not a finite number")]
    NonFiniteScore,
}
