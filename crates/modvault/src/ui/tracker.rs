use std::sync::Arc;

use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use modvault_fetch::{FetchPhase, Progress};
use once_cell::sync::Lazy;

pub trait TrackerBuilder<T: Tracker<U>, U> {
    fn build(self, bars: &MultiProgress) -> T;
}

pub trait Tracker<Inc> {
    fn step(&self, step: Inc) -> &Self;
    fn finish(self);
}

const COUNT_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {wide_msg}";

const BYTES_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

fn style(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::with_template(template)
        .ok()
        .map(|s| s.tick_chars(TICK).progress_chars(PB_CHARS))
}

static COUNT_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(COUNT_STYLE));

static BYTES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(BYTES_STYLE));

/// Bar group shared by every tracker and by the log writer; drawn on stderr
/// only when it is a terminal.
pub static BARS: Lazy<MultiProgress> = Lazy::new(|| {
    if Term::stderr().is_term() {
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }
});

pub struct ProgressTracker {
    pb:     ProgressBar,
    finish: Option<String>,
}

impl ProgressTracker {
    pub fn set_len(&self, len: u64) { self.pb.set_length(len); }

    pub fn set_message(&self, msg: impl Into<String>) { self.pb.set_message(msg.into()); }

    /// Callback that mirrors a fetcher's progress onto this bar.
    pub fn fetch_observer(&self) -> Arc<dyn Fn(&Progress) + Send + Sync> {
        let pb = self.pb.clone();
        Arc::new(move |progress: &Progress| match progress.phase {
            FetchPhase::Connecting => {
                pb.reset();
                pb.set_message(format!("attempt {}", progress.attempt));
            }
            FetchPhase::Downloading => {
                if let Some(total) = progress.total_bytes {
                    pb.set_length(total);
                }
                pb.set_position(progress.bytes_downloaded);
            }
            phase => pb.set_message(phase.to_string()),
        })
    }
}

impl Tracker<u64> for ProgressTracker {
    fn step(&self, len: u64) -> &Self {
        self.pb.inc(len);
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish_and_clear(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    prefix: Option<String>,
    finish: Option<String>,
    bytes:  bool,
}

impl ProgressTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Leave the bar on screen with `finish` instead of clearing it.
    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }

    /// Count bytes instead of items.
    pub fn bytes(mut self) -> Self {
        self.bytes = true;
        self
    }
}

impl TrackerBuilder<ProgressTracker, u64> for ProgressTrackerBuilder {
    fn build(self, bars: &MultiProgress) -> ProgressTracker {
        let pb = ProgressBar::new_spinner();
        let template = if self.bytes { &BYTES_TEMPLATE } else { &COUNT_TEMPLATE };
        let pb = match template.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }

        ProgressTracker {
            pb:     bars.add(pb),
            finish: self.finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> MultiProgress { MultiProgress::with_draw_target(ProgressDrawTarget::hidden()) }

    #[test]
    fn finish_message_is_kept() {
        let bars = hidden();
        let tracker = ProgressTrackerBuilder::default()
            .with_prefix("pages")
            .with_finish("catalog listed")
            .build(&bars);
        let pb = tracker.pb.clone();
        tracker.set_len(3);
        tracker.step(1).step(2);
        tracker.finish();

        assert!(pb.is_finished());
        assert_eq!(pb.position(), 3);
        assert_eq!(pb.prefix(), "pages");
        assert_eq!(pb.message(), "catalog listed");
    }

    #[test]
    fn without_finish_message_the_bar_is_cleared() {
        let bars = hidden();
        let tracker = ProgressTrackerBuilder::default().with_prefix("entries").build(&bars);
        let pb = tracker.pb.clone();
        tracker.set_message("some model");
        tracker.finish();

        assert!(pb.is_finished());
        assert_eq!(pb.message(), "some model");
    }

    #[test]
    fn observer_follows_fetch_progress() {
        let bars = hidden();
        let tracker = ProgressTrackerBuilder::default().bytes().build(&bars);
        let observe = tracker.fetch_observer();

        observe(&Progress {
            phase:            FetchPhase::Connecting,
            bytes_downloaded: 0,
            total_bytes:      None,
            attempt:          2,
        });
        assert_eq!(tracker.pb.message(), "attempt 2");

        observe(&Progress {
            phase:            FetchPhase::Downloading,
            bytes_downloaded: 40,
            total_bytes:      Some(100),
            attempt:          2,
        });
        assert_eq!(tracker.pb.position(), 40);
        assert_eq!(tracker.pb.length(), Some(100));
    }
}
