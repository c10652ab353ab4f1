use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid corpus: {0}")]
    Corpus(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A training token carries no `pos` attribute.
    #[error("token #{position} of sentence #{sentence} has no pos tag")]
    MissingTag { sentence: usize, position: usize },

    #[error("tag `{0}` is reserved")]
    ReservedTag(String),

    #[error("model is not trained")]
    NotTrained,
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.into())
    }
}
