use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Shape ----
    /// Initial guess has no entries.
    EmptyGuess,

    /// Initial guess length does not match what the objective expects.
    GuessDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Initial guess length does not match what the metric expects.
    MetricDimMismatch {
        expected: usize,
        found: usize,
    },

    /// A real vector folded into complex form must have even length.
    OddRealLength {
        len: usize,
    },

    /// Natural-gradient variants need a metric.
    MissingMetric {
        algorithm: &'static str,
    },

    // ---- SpsaOptions ----
    /// Regularization constants need to be finite and non-negative.
    InvalidRegularization {
        value: f64,
        reason: &'static str,
    },

    /// Curvature seed needs to be finite.
    InvalidCurvatureSeed {
        value: f64,
        reason: &'static str,
    },

    /// Optimization sign must be -1 or +1.
    InvalidSign {
        sign: f64,
    },

    /// Unknown direction name.
    InvalidDirection {
        name: String,
        reason: &'static str,
    },

    /// Unknown algorithm name.
    InvalidAlgorithm {
        name: String,
        reason: &'static str,
    },

    /// Unknown preconditioner name.
    InvalidPreconditioner {
        name: String,
        reason: &'static str,
    },

    // ---- LbfgsOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Tools ----
    /// Number of simulated measurements must be positive.
    InvalidMeasurements {
        measurements: u64,
    },

    /// Distribution construction failed.
    InvalidDistribution {
        text: String,
    },

    // ---- Argmin ----
    /// A typed argmin error; `kind` is the argmin variant name.
    Solver {
        kind: &'static str,
        text: String,
    },
    /// Any other error raised by argmin or an observer.
    BackendError {
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shape ----
            OptError::EmptyGuess => {
                write!(f, "Initial guess must contain at least one variable")
            }
            OptError::GuessDimMismatch { expected, found } => {
                write!(f, "Initial guess dimension mismatch: expected {expected}, found {found}")
            }
            OptError::MetricDimMismatch { expected, found } => {
                write!(f, "Metric dimension mismatch: expected {expected}, found {found}")
            }
            OptError::OddRealLength { len } => {
                write!(f, "Cannot fold a real vector of odd length {len} into complex form")
            }
            OptError::MissingMetric { algorithm } => {
                write!(f, "Algorithm {algorithm} requires a metric function")
            }

            // ---- SpsaOptions ----
            OptError::InvalidRegularization { value, reason } => {
                write!(f, "Invalid regularization constant {value}: {reason}")
            }
            OptError::InvalidCurvatureSeed { value, reason } => {
                write!(f, "Invalid curvature seed {value}: {reason}")
            }
            OptError::InvalidSign { sign } => {
                write!(f, "Invalid optimization sign {sign}: must be -1 or +1")
            }
            OptError::InvalidDirection { name, reason } => {
                write!(f, "Invalid direction '{name}': {reason}")
            }
            OptError::InvalidAlgorithm { name, reason } => {
                write!(f, "Invalid algorithm '{name}': {reason}")
            }
            OptError::InvalidPreconditioner { name, reason } => {
                write!(f, "Invalid preconditioner '{name}': {reason}")
            }

            // ---- LbfgsOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Tools ----
            OptError::InvalidMeasurements { measurements } => {
                write!(f, "Invalid number of measurements {measurements}: must be positive")
            }
            OptError::InvalidDistribution { text } => {
                write!(f, "Invalid distribution: {text}")
            }

            // ---- Argmin ----
            OptError::Solver { kind, text } => {
                write!(f, "Solver error ({kind}): {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }
        }
    }
}

impl From<Error> for OptError {
    /// Recover an `OptError` raised inside a callback, otherwise classify
    /// the argmin error.
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let kind = match &argmin_err {
                    ArgminError::InvalidParameter { .. } => "invalid parameter",
                    ArgminError::NotImplemented { .. } => "not implemented",
                    ArgminError::NotInitialized { .. } => "not initialized",
                    ArgminError::ConditionViolated { .. } => "condition violated",
                    ArgminError::CheckpointNotFound { .. } => "checkpoint not found",
                    ArgminError::PotentialBug { .. } => "potential bug",
                    ArgminError::ImpossibleError { .. } => "impossible error",
                    _ => return OptError::BackendError { text: argmin_err.to_string() },
                };
                OptError::Solver { kind, text: argmin_err.to_string() }
            }
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for pyo3::PyErr {
    fn from(err: OptError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
