//! Stats module - dataset summaries and category breakdown

mod calculator;

pub use calculator::{CategoryCount, DatasetStats, StatsCalculator, COUNT_COLUMN};
