use modvault_fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A payload decoded as JSON but not into the expected shape.
    #[error("unexpected data shape in {context}: {source}")]
    DataShape {
        context: String,
        #[source]
        source:  serde_json::Error,
    },

    #[error("favorites-only listing requires an API key")]
    MissingCredential,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CatalogError {
    pub fn data_shape(context: impl Into<String>, source: serde_json::Error) -> Self {
        CatalogError::DataShape {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
