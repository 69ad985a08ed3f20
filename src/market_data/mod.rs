pub mod candle;
pub mod history;
pub mod orchestrator;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use candle::SymbolSeries;
pub use history::FetchConfig;
pub use orchestrator::{Dataset, FetchOrchestrator};
