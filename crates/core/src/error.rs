use thiserror::Error;

#[derive(Error, Debug)]
pub enum CronError {
    #[error("invalid expression '{0}': expected 5 or 6 segments, got {1}")]
    Segments(String, usize),

    #[error("invalid segment '{0}': {1}")]
    Parse(String, String),

    #[error("unreachable year segment: {0}")]
    UnreachableYear(String),

    #[error("search budget exhausted after {0} iterations")]
    SearchExhausted(u32),
}
