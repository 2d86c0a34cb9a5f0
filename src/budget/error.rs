use crate::db::StoreError;
use crate::models::Category;

/// Errors from the budget store and ledger.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    /// User input failed validation. Nothing was mutated; retry with corrected
    /// input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The durable store could not be read or written, or holds data that
    /// does not parse. In-memory state was left as it was.
    #[error("storage unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::PersistenceUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::PersistenceUnavailable(format!("corrupt document: {e}"))
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// An input field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Date,
    Amount,
    Name,
    Category,
    Budget(Category),
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Amount => write!(f, "amount"),
            Self::Name => write!(f, "name"),
            Self::Category => write!(f, "category"),
            Self::Budget(c) => write!(f, "{c} budget"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldProblem {
    Missing(Field),
    NotANumber { field: Field, value: String },
    Negative(Field),
    TooLarge(Field),
    InvalidDate(String),
    UnknownCategory(String),
    Duplicate(Field),
}

impl FieldProblem {
    pub(crate) fn field(&self) -> Option<Field> {
        match self {
            Self::Missing(f) | Self::Negative(f) | Self::TooLarge(f) | Self::Duplicate(f) => {
                Some(*f)
            }
            Self::NotANumber { field, .. } => Some(*field),
            Self::InvalidDate(_) => Some(Field::Date),
            Self::UnknownCategory(_) => None,
        }
    }
}

impl std::fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "{field} is required"),
            Self::NotANumber { field, value } => write!(f, "{field} '{value}' is not a number"),
            Self::Negative(field) => write!(f, "{field} cannot be negative"),
            Self::TooLarge(field) => write!(f, "{field} is too large"),
            Self::InvalidDate(value) => write!(f, "'{value}' is not a valid date (YYYY-MM-DD)"),
            Self::UnknownCategory(value) => write!(f, "unknown category '{value}'"),
            Self::Duplicate(field) => write!(f, "{field} given more than once"),
        }
    }
}

/// Every problem found in one piece of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidationError {
    pub(crate) problems: Vec<FieldProblem>,
}

impl ValidationError {
    #[cfg(test)]
    pub(crate) fn has(&self, problem: &FieldProblem) -> bool {
        self.problems.contains(problem)
    }

    /// Returns `Err` when any problem was collected.
    pub(crate) fn check(problems: Vec<FieldProblem>) -> std::result::Result<(), Self> {
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Self { problems })
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msgs: Vec<String> = self.problems.iter().map(|p| p.to_string()).collect();
        write!(f, "invalid input: {}", msgs.join("; "))
    }
}

impl std::error::Error for ValidationError {}
