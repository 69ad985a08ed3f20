// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator math plus the two classifiers built on top
// of it.  Insufficient data is never an error: the low-level functions return
// `Option`/empty series and the classifiers map that to `Unknown`.

pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod trend;

pub use momentum::{analyze_momentum, MomentumResult};
pub use trend::{analyze_trend, TrendResult};
