use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use treecmp_common::{RelPath, Side};
use treecmp_core::{Phase, ProgressObserver};

/// Terminal progress bars on stderr, one per engine phase
#[derive(Default)]
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

fn label(phase: Phase) -> &'static str {
    match phase {
        Phase::Scanning(Side::B) => "Scanning B",
        Phase::Scanning(_) => "Scanning A",
        Phase::Comparing => "Comparing",
        Phase::DetectingRenames => "Detecting renames",
    }
}

impl ProgressObserver for CliProgress {
    fn phase_started(&self, phase: Phase, total: u64) {
        let bar = if total == 0 {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            let style = ProgressStyle::with_template(
                "{msg:>18} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
            ProgressBar::new(total).with_style(style)
        };
        bar.set_message(label(phase));

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn item_finished(&self, _phase: Phase, _path: &RelPath) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(1);
            }
        }
    }

    fn phase_finished(&self, _phase: Phase) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
