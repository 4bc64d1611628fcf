//! Tunescribe - audio to MIDI transcription studio
//!
//! Send a recording to the transcription service, edit the detected
//! notes on a piano roll, export a standard MIDI file.

mod app;
mod audio;
mod history;
mod midi;
mod model;
mod piano_roll;
mod presets;
mod quantize;
mod transcribe;

use app::TunescribeApp;
use eframe::NativeOptions;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("tunescribe")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "tunescribe",
        options,
        Box::new(|cc| Box::new(TunescribeApp::new(cc))),
    )
}
