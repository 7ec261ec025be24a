use thiserror::Error;

/// Errors raised by the bubble and typesetting engine.
///
/// The engine only validates the structure of its own inputs. Detection,
/// translation and image decoding failures belong to the caller and are
/// reported before the engine is invoked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }
}
