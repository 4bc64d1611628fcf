//! Repaint governor
//!
//! egui redraws everything every frame, and by default an eframe app only
//! wakes on input. Tunescribe has two activities that need frames without
//! input: a pending transcription request (spinner, then applying the
//! result) and short note-preview animations. `RepaintController` owns the
//! scheduling so the app stays idle-cheap the rest of the time:
//!
//! - **continuous** - repaint on a timer while an activity runs.
//! - **one-shot** - `mark_needs_repaint()` when state changed outside an
//!   input event (e.g. the worker thread delivered a result).
//! - otherwise - no scheduled repaint; egui wakes on the next input.

use std::time::Duration;

/// Timer interval while continuous mode is active (~30 fps).
const CONTINUOUS_INTERVAL: Duration = Duration::from_millis(33);

/// Controls when the egui context should request repaints.
///
/// Call [`RepaintController::begin_frame`] at the top of `update()` and
/// [`RepaintController::end_frame`] at the bottom.
pub struct RepaintController {
    continuous: bool,
    needs_repaint: bool,
    frame: u64,
}

impl Default for RepaintController {
    fn default() -> Self {
        Self::new()
    }
}

impl RepaintController {
    pub fn new() -> Self {
        Self {
            continuous: false,
            needs_repaint: false,
            frame: 0,
        }
    }

    /// Enable or disable timed repainting. Keep this on only while an
    /// activity is actually animating or waiting on a worker thread.
    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Request a single repaint on the next opportunity.
    pub fn mark_needs_repaint(&mut self) {
        self.needs_repaint = true;
    }

    /// Current frame counter (0 = first frame).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn begin_frame(&mut self, _ctx: &egui::Context) {
        // The one-shot flag is consumed by the frame now running.
        self.needs_repaint = false;
    }

    pub fn end_frame(&mut self, ctx: &egui::Context) {
        self.frame += 1;
        if self.continuous {
            ctx.request_repaint_after(CONTINUOUS_INTERVAL);
        } else if self.needs_repaint {
            ctx.request_repaint();
        }
    }
}
