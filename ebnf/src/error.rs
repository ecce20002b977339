use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to parse: {0}")]
    ParseError(String),
    #[error("schema has no `ENTRY` rule")]
    MissingEntry,
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Error {
        Error::ParseError(format!("{:?}", err))
    }
}
