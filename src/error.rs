//! Crate-level error types.
//!
//! [`ScreenerError`] covers every way a single symbol's run can fail
//! (network, upstream status, decoding) plus the storage errors that can
//! abort a whole run. Callers in the pipeline match on nothing: any
//! variant raised for one symbol just skips that symbol.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScreenerError>;

#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    /// The HTTP request could not be completed (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered with a non-success status code.
    #[error("upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body did not have the kline array-of-arrays shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The upstream returned zero candles, so there is no window to analyse.
    #[error("no candles returned")]
    EmptyWindow,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
