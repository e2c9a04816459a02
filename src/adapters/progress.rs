use crate::domain::ports::{ProgressReporter, StageProgress};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg:<22} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})";

/// One indicatif bar per stage, drawn on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn stage(&self, label: &str, total: usize) -> Box<dyn StageProgress> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(label.to_string());
        Box::new(StageBar(bar))
    }
}

struct StageBar(ProgressBar);

impl StageProgress for StageBar {
    fn advance(&self) {
        self.0.inc(1);
    }

    fn finish(&self) {
        self.0.finish();
    }
}
