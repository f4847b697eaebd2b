//! Mobilization Dashboard - deduplication, filtering and county breakdown
//! over a mobilization sign-up sheet.

pub mod bootstrap;
pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod gui;
pub mod pipeline;
pub mod stats;
