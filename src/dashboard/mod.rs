//! Analyzer GUI
//!
//! Home screen with single-image and folder modes. All model calls run on
//! a worker thread; the window polls it for progress.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;
pub mod views;

pub use app::run_dashboard;
