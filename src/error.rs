/// Typed failures from the core engine (fitting, financing, projection).
///
/// `Clone` so per-segment failures can be carried in projection output
/// alongside successful rows without consuming the error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A caller-supplied value violated a precondition (negative price,
    /// vacancy outside [0, 1), zero-length horizon, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not enough usable observations to fit or align (fewer than two
    /// distinct prices, no overlapping period between series, ...).
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A single segment failed during projection; wraps the underlying
    /// error with the segment identifier so batch callers can report it.
    #[error("segment {zip}: {source}")]
    SegmentEvaluation {
        zip: String,
        #[source]
        source: Box<EngineError>,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

// Exit codes: 2 usage/input, 3 data, 4 internal.
impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let exit_code = match &err {
            EngineError::InvalidInput(_) => 2,
            EngineError::InsufficientData(_) => 3,
            EngineError::SegmentEvaluation { .. } => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
