//! Day-ahead load forecast.
//!
//! A forecast starts from the [`WINDOW_LEN`] most recent readings, scaled
//! into `[0, 1]` per category, and calls the prediction service
//! [`HORIZON_HOURS`] times. Each predicted row is denormalized for output
//! while the normalized row is fed back into the window for the next step.

pub mod chain;
pub mod error;
pub mod normalize;
pub mod predictor;
pub mod window;

pub use chain::*;
pub use error::*;
pub use normalize::*;
pub use predictor::*;
pub use window::*;

/// Readings per prediction request.
pub const WINDOW_LEN: usize = 8;

/// Steps in a day-ahead chain.
pub const HORIZON_HOURS: u32 = 24;

/// One (hvac, lighting, mels) row.
pub type LoadTriple = [f64; 3];
