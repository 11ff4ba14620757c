use thiserror::Error;

/// Failure classes surfaced to the user. Every failure aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input error: {message}")]
    Input { message: String },

    #[error("declination request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid declination response: {message}")]
    Response { message: String },

    #[error("cannot project from ({lat}, {lon}): {reason}")]
    InvalidCoordinate {
        lat: f64,
        lon: f64,
        reason: &'static str,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    pub fn input(message: impl Into<String>) -> Self {
        Error::Input {
            message: message.into(),
        }
    }

    pub fn response(message: impl Into<String>) -> Self {
        Error::Response {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
