use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No game loaded")]
    NoGameLoaded,

    #[error("Engine thread has stopped")]
    EngineStopped,
}

pub type PetResult<T> = Result<T, PetError>;
