//! scribecore - shared UI library for tunescribe

pub mod hatch;
pub mod repaint;
pub mod storage;
pub mod theme;
pub mod widgets;

pub use repaint::RepaintController;
pub use theme::ScribeTheme;
