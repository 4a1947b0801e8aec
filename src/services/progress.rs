//! Progress observers.
//!
//! Downloads report bytes against the declared total; a total of 0 means
//! unknown and observers show an indeterminate indicator instead.

/// What a progress total counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    Bytes,
    Items,
}

/// Receives progress for units of work.
pub trait ProgressObserver: Send + Sync {
    /// Start tracking one unit of work. `total` of 0 means unknown.
    fn begin(&self, label: &str, total: u64, unit: ProgressUnit) -> Box<dyn ProgressHandle>;
}

/// Progress of one unit of work.
pub trait ProgressHandle: Send + Sync {
    fn advance(&self, delta: u64);
    fn finish(&self);
}

/// Observer that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn begin(&self, _label: &str, _total: u64, _unit: ProgressUnit) -> Box<dyn ProgressHandle> {
        Box::new(NoProgress)
    }
}

impl ProgressHandle for NoProgress {
    fn advance(&self, _delta: u64) {}
    fn finish(&self) {}
}

#[cfg(feature = "cli")]
pub use terminal::TerminalProgress;

#[cfg(feature = "cli")]
mod terminal {
    use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

    use super::{ProgressHandle, ProgressObserver, ProgressUnit};

    const BYTES_TEMPLATE: &str =
        "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
    const ITEMS_TEMPLATE: &str = "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len}";
    const UNKNOWN_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

    /// Terminal progress bars.
    #[derive(Debug, Clone, Default)]
    pub struct TerminalProgress {
        multi: MultiProgress,
    }

    impl TerminalProgress {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ProgressObserver for TerminalProgress {
        fn begin(&self, label: &str, total: u64, unit: ProgressUnit) -> Box<dyn ProgressHandle> {
            let (bar, template) = match (unit, total) {
                (ProgressUnit::Bytes, 0) => (ProgressBar::new_spinner(), UNKNOWN_TEMPLATE),
                (ProgressUnit::Bytes, n) => (ProgressBar::new(n), BYTES_TEMPLATE),
                (ProgressUnit::Items, n) => (ProgressBar::new(n), ITEMS_TEMPLATE),
            };
            let style = ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");

            let bar = self.multi.add(bar.with_style(style));
            bar.set_message(label.to_string());
            Box::new(TerminalBar { bar })
        }
    }

    struct TerminalBar {
        bar: ProgressBar,
    }

    impl ProgressHandle for TerminalBar {
        fn advance(&self, delta: u64) {
            self.bar.inc(delta);
        }

        fn finish(&self) {
            self.bar.finish_and_clear();
        }
    }
}
