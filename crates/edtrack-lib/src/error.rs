use thiserror::Error;

/// Convenient result alias for the edtrack library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a system name could not be resolved to coordinates.
    #[error("unknown system: {name}")]
    SystemNotFound { name: String },

    /// Raised when a commander has no recorded position or flight data on EDSM.
    #[error("no EDSM record for commander {name}")]
    CommanderNotFound { name: String },

    /// Raised when a point of interest is not in the registry.
    #[error("unknown point of interest: {name}{}", format_suggestions(.suggestions))]
    PoiNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a flight log has too little data for a rate or estimate.
    /// Covers both the empty-log case and a log whose usable elapsed time is
    /// zero, which would otherwise divide by zero.
    #[error("not enough flight data for commander {commander}")]
    NoFlightData { commander: String },

    /// Raised when the API returned a body that is not the expected JSON shape.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// No suitable project directories could be resolved for the registry files.
    #[error("failed to resolve project directories for the registry store")]
    DataDirUnavailable,

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV read/write errors in the durable store.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
