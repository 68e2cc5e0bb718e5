use thiserror::Error;

use crate::model::{AppSettingsError, ParseIdError, ParseSubjectError, QuestionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] AppSettingsError),
    #[error(transparent)]
    Subject(#[from] ParseSubjectError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
