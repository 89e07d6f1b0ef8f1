use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use beamtrace_core::pipeline::{PipelineStage, ProgressReporter};

/// Drives one indicatif bar per pipeline stage.
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    pub fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{msg:32} [{bar:40}] {pos}/{len}")
            .expect("static template")
            .progress_chars("=> ")
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let pb = match total_items {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(Self::style());
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message(stage.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn advance(&self, items_done: usize) {
        if let Some(ref pb) = *self.bar.lock().unwrap() {
            pb.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}
