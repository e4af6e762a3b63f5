use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::{theme, Icons};
use indicatif::{HumanCount, HumanDuration, MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

fn visible(pb: ProgressBar) -> ProgressBar {
    if console::Term::stderr().is_term() && !crate::output::is_quiet() {
        pb
    } else {
        ProgressBar::hidden()
    }
}

/// Renders loader progress messages as terminal progress bars.
///
/// The loader sends `ProgressMessage`s over a channel; a background thread
/// owns the bars and updates them until every sender is dropped.
pub struct ProgressManager {
    mp: MultiProgress,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressManager {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();

        let scanning = visible(mp.add(
            ProgressBar::new(total_files as u64).with_message("Scanning prefixes"),
        ));
        let loading = visible(mp.add(ProgressBar::new_spinner().with_message("Loading statements")));
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            loading.set_style(style);
        }
        let finalizing = visible(mp.add(ProgressBar::new_spinner().with_message("Committing")));

        let mp_clone = mp.clone();
        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Scanning,
                        total,
                    } => {
                        scanning.set_length(total as u64);
                    }
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Scanning,
                        current,
                        file,
                    } => {
                        scanning.set_position(current as u64);
                        if let Some(f) = file {
                            scanning.set_message(format!("Scanned: {}", f));
                        }
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Scanning,
                    } => {
                        scanning.finish_with_message("Prefixes scanned");
                    }
                    ProgressMessage::Started {
                        phase: ProgressPhase::Loading,
                        total: _,
                    } => {
                        loading.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Loading,
                        current,
                        file,
                    } => {
                        let file = file.unwrap_or_default();
                        loading.set_message(format!("{} rows ({})", HumanCount(current as u64), file));
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Loading,
                    } => {
                        loading.finish();
                    }
                    ProgressMessage::Started {
                        phase: ProgressPhase::Finalizing,
                        total: _,
                    } => {
                        finalizing.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Finalizing,
                    } => {
                        finalizing.finish_with_message("Committed");
                    }
                    ProgressMessage::Warning(text) => {
                        mp_clone
                            .println(format!("{} {}", Icons::WARN, text.style(theme().warn.clone())))
                            .ok();
                    }
                    _ => {}
                }
            }
        });

        (
            Self {
                mp,
                handle: Some(handle),
            },
            tx,
        )
    }

    /// Wait for the render thread (all senders must be dropped first)
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        self.mp.clear().ok();
    }

    pub fn finish_with_summary(&mut self, duration: Duration, files: usize, rows: usize) {
        self.join();
        if crate::output::is_quiet() {
            return;
        }
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            files,
            Icons::PACKAGE.style(theme().info.clone()),
            HumanCount(rows as u64)
        );
    }
}
