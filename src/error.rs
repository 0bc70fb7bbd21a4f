use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrevError {
    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid sort-by value: {0}")]
    InvalidSortBy(String),

    #[error("the aggregate rating element never attached; entity metadata is unavailable")]
    MetadataUnavailable,

    #[error("no review entry point found on the page")]
    NoEntryPoint,

    #[error("a non-empty page URL is required in URL mode")]
    MissingUrl,

    #[error("record extraction failed: {0}")]
    Extraction(String),
}

impl GrevError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GrevError::Driver(_) => Some(
                "Make sure Node.js and the playwright package are installed:\n  npm install playwright && npx playwright install chromium",
            ),
            GrevError::InvalidSortBy(_) => Some(
                "Valid sort orders: most_helpful, most_recent, highest_score, lowest_score",
            ),
            GrevError::NoEntryPoint => Some(
                "Neither the full-screen nor the dialog review button was found.\nThe page may not be a place/hotel result, or the layout changed.",
            ),
            GrevError::MissingUrl => Some(
                "Pass the Google page URL of the place, e.g.:\n  grev url \"https://www.google.com/travel/search?...\"",
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GrevError>;
