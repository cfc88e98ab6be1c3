use thiserror::Error;

/// Failure to read one of the Spirit's enumerations back from its stored name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown outcome: {0}")]
    Outcome(String),
    #[error("unknown temperament: {0}")]
    Temperament(String),
    #[error("unknown event category: {0}")]
    EventCategory(String),
    #[error("unknown operator title: {0}")]
    OperatorTitle(String),
    #[error("unknown maintenance ritual: {0}")]
    Ritual(String),
}
