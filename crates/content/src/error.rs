use gramflow_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("{operation} returned status {status}")]
    Status { operation: String, status: u16 },

    #[error("{operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn status(operation: impl Into<String>, status: u16) -> Self {
        Self::Status {
            operation: operation.into(),
            status,
        }
    }

    #[must_use]
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

gramflow_common::impl_context!();
