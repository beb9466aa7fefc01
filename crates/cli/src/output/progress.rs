//! Byte progress bar for transfers

use hb_core::TransferState;
use indicatif::{ProgressBar, ProgressStyle};

use super::OutputConfig;

const TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

/// Progress bar fed from transfer state updates.
///
/// Hidden in JSON and quiet mode.
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    pub fn new(config: &OutputConfig, message: &str) -> Self {
        let bar = if config.json || config.quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        };
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Start counting from a resume offset
    pub fn start_at(&self, offset: u64, total: Option<u64>) {
        if let Some(total) = total {
            self.bar.set_length(total);
        }
        self.bar.set_position(offset);
    }

    pub fn update(&self, state: &TransferState) {
        if let Some(total) = state.object_size {
            self.bar.set_length(total);
        }
        self.bar.set_position(state.offset);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
