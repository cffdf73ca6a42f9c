pub mod cleaner;
pub mod cli;
pub mod config;
pub mod kubernetes;
pub mod retention;
pub mod version;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Authorization error: {context}: {source}")]
    Auth {
        context: String,
        #[source]
        source: kube::Error,
    },
    #[error("Kubernetes error: {context}: {source}")]
    Kubernetes {
        context: String,
        #[source]
        source: kube::Error,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies an API failure by its HTTP status, attaching `context` to the message.
    pub fn from_kube(context: impl Into<String>, source: kube::Error) -> Self {
        let context = context.into();
        match &source {
            kube::Error::Api(response) if response.code == 404 => {
                Error::NotFound(format!("{}: {}", context, response.message))
            }
            kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
                Error::Auth { context, source }
            }
            _ => Error::Kubernetes { context, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
