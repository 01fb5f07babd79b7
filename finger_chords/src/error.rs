use std::io;

use thiserror::Error;

use crate::sink::SinkError;

/// Everything that can stop the application before or while it runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cannot open landmark stream {path}: {source}")]
    Stream {
        path:   String,
        #[source]
        source: io::Error,
    },

    #[error("window: {0}")]
    Window(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
