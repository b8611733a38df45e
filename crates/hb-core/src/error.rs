use thiserror::Error;

pub type HbResult<T> = Result<T, HbError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HbError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Root not bracketed for {what}: f(lo)={f_lo}, f(hi)={f_hi}")]
    NotBracketed {
        what: &'static str,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("No convergence for {what} after {iterations} iterations")]
    NoConvergence {
        what: &'static str,
        iterations: usize,
    },
}
