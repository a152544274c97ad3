//! Domain error types.

/// A parse error with position information for indicator/condition expressions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Coarse classification of [`SigtraderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad setup or bad input detected before any computation.
    Validation,
    /// Values of the wrong type (non-bool, non-numeric, wrong shape).
    Type,
    /// An internal fault while computing an indicator, condition or signal.
    Computation,
    /// File system, CSV parsing or exchange failures.
    Io,
    Config,
}

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("the table must contain values, otherwise it can't be operated on ({context})")]
    EmptyTable { context: String },

    #[error("missing columns {missing:?}; present columns are {present:?}")]
    MissingColumns {
        missing: Vec<String>,
        present: Vec<String>,
    },

    #[error("the table has a length of {rows} and a minimum length of {minimum} is needed")]
    InsufficientData { rows: usize, minimum: usize },

    #[error("columns {columns:?} contain missing values")]
    MissingValues { columns: Vec<String> },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("a condition list must not be empty")]
    EmptyConditionList,

    #[error("a {component} must be set, otherwise no signal can be generated")]
    MissingSetup { component: &'static str },

    #[error("column {name} already exists")]
    DuplicateColumn { name: String },

    #[error("at most {limit} orders can be registered on this strategy")]
    TooManyOrders { limit: usize },

    #[error("the file {path} does not exist")]
    FileNotFound { path: String },

    #[error("the file {path} is not a CSV file")]
    WrongExtension { path: String },

    #[error("columns {columns:?} contain values other than bool")]
    NotBoolean { columns: Vec<String> },

    #[error("columns {columns:?} contain values other than numbers")]
    NotNumeric { columns: Vec<String> },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("calculation of {name} failed")]
    Computation {
        name: String,
        #[source]
        source: Box<SigtraderError>,
    },

    #[error("failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("exchange error: {reason}")]
    Exchange { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    ExpressionParse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SigtraderError::EmptyTable { .. }
            | SigtraderError::MissingColumns { .. }
            | SigtraderError::InsufficientData { .. }
            | SigtraderError::MissingValues { .. }
            | SigtraderError::InvalidParameter { .. }
            | SigtraderError::EmptyConditionList
            | SigtraderError::MissingSetup { .. }
            | SigtraderError::DuplicateColumn { .. }
            | SigtraderError::TooManyOrders { .. }
            | SigtraderError::FileNotFound { .. }
            | SigtraderError::WrongExtension { .. } => ErrorKind::Validation,
            SigtraderError::NotBoolean { .. }
            | SigtraderError::NotNumeric { .. }
            | SigtraderError::InvalidShape { .. } => ErrorKind::Type,
            SigtraderError::Computation { .. } => ErrorKind::Computation,
            SigtraderError::DataLoad { .. }
            | SigtraderError::Exchange { .. }
            | SigtraderError::Io(_) => ErrorKind::Io,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. }
            | SigtraderError::ExpressionParse(_) => ErrorKind::Config,
        }
    }

    /// Wrap an internal failure so it names the indicator, condition or signal it came from.
    pub fn computation(name: impl Into<String>, source: SigtraderError) -> Self {
        SigtraderError::Computation {
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub fn missing_columns(missing: Vec<String>, present: &[&str]) -> Self {
        SigtraderError::MissingColumns {
            missing,
            present: present.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err.kind() {
            ErrorKind::Io => 1,
            ErrorKind::Config => 2,
            ErrorKind::Validation => 3,
            ErrorKind::Type => 4,
            ErrorKind::Computation => 5,
        };
        std::process::ExitCode::from(code)
    }
}
