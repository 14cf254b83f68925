use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    BatchTooLarge(usize),
    EnqueueDuringDrain,
    ReadFailed(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::BatchTooLarge(n) => write!(
                f,
                "Batch of {} keys exceeds the capacity of {} keys",
                n,
                crate::batch::MAX_BATCH_SIZE
            ),
            Error::EnqueueDuringDrain => {
                write!(f, "Cannot enqueue reads while a drain is in progress")
            }
            Error::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
