//! Status reporting while a scenario runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use polyquorum_application::StatusObserver;
use polyquorum_domain::{Provider, Response, SlotId, SynthesisRequest};
use std::collections::HashMap;
use std::sync::Mutex;

/// Characters of live text shown next to a streaming source
const PREVIEW_CHARS: usize = 48;

/// Reports cycle progress with a quorum bar and one spinner per source
pub struct ConsoleStatus {
    multi: MultiProgress,
    quorum_bar: Mutex<Option<ProgressBar>>,
    sources: Mutex<HashMap<SlotId, ProgressBar>>,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            quorum_bar: Mutex::new(None),
            sources: Mutex::new(HashMap::new()),
        }
    }

    fn quorum_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn source_bar(&self, slot: SlotId) -> Option<ProgressBar> {
        let mut sources = self.sources.lock().ok()?;
        let bar = sources.entry(slot).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.set_prefix(format!("{:<12}", slot.display_name()));
            pb
        });
        Some(bar.clone())
    }

    fn clear_sources(&self) {
        if let Ok(mut sources) = self.sources.lock() {
            for (_, pb) in sources.drain() {
                pb.finish_and_clear();
            }
        }
    }

    fn println(&self, line: String) {
        if self.multi.println(&line).is_err() {
            println!("{}", line);
        }
    }
}

impl Default for ConsoleStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusObserver for ConsoleStatus {
    fn on_status(&self, completed: usize, total: usize) {
        let Ok(mut quorum_bar) = self.quorum_bar.lock() else {
            return;
        };

        if completed == 0 {
            // A new cycle (or a finished one) starts from a clean slate
            self.clear_sources();
            if let Some(pb) = quorum_bar.take() {
                pb.finish_and_clear();
            }
        }

        let pb = quorum_bar.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::quorum_style());
            pb.set_prefix("Quorum");
            pb.set_message("Waiting for answers...");
            pb
        });
        pb.set_length(total as u64);
        pb.set_position(completed as u64);
    }

    fn on_ready_for_manual_merge(&self) {
        if let Ok(quorum_bar) = self.quorum_bar.lock()
            && let Some(pb) = quorum_bar.as_ref()
        {
            pb.set_message(format!("{}", "ready to merge".green()));
        }
        self.println(format!(
            "{} Every source has answered; merge when ready",
            "->".cyan()
        ));
    }

    fn on_source_update(&self, slot: SlotId, text: &str, busy: bool) {
        if let Some(pb) = self.source_bar(slot) {
            let state = if busy { "streaming".yellow() } else { "idle".dimmed() };
            pb.set_message(format!("{} {}", state, preview(text)));
            pb.tick();
        }
    }

    fn on_source_complete(&self, slot: SlotId, provider: &Provider, response: &Response) {
        if let Some(pb) = self.source_bar(slot) {
            pb.finish_with_message(format!(
                "{} {} ({} chars)",
                "v".green(),
                provider.display_name(),
                response.char_count()
            ));
        }
    }

    fn on_merge(&self, sink: SlotId, request: &SynthesisRequest) {
        if let Ok(quorum_bar) = self.quorum_bar.lock()
            && let Some(pb) = quorum_bar.as_ref()
        {
            pb.set_message(format!(
                "{} {} windows into {}",
                "merged".green(),
                request.window_count(),
                sink.display_name()
            ));
        }
    }
}

/// Plain line-per-event status (no fancy UI)
pub struct SimpleStatus;

impl StatusObserver for SimpleStatus {
    fn on_status(&self, completed: usize, total: usize) {
        println!("{} {}/{} answered", "->".cyan(), completed, total);
    }

    fn on_ready_for_manual_merge(&self) {
        println!("{} {}", "->".cyan(), "Ready to merge".green().bold());
    }

    fn on_source_complete(&self, slot: SlotId, provider: &Provider, response: &Response) {
        println!(
            "  {} {} in {} ({} chars)",
            "v".green(),
            provider.display_name(),
            slot.display_name(),
            response.char_count()
        );
    }

    fn on_merge(&self, sink: SlotId, request: &SynthesisRequest) {
        println!(
            "{} Merged {} windows into {}",
            "->".cyan(),
            request.window_count(),
            sink.display_name().bold()
        );
    }
}

/// Last line of `text`, shortened for a status line
fn preview(text: &str) -> String {
    let last = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    let count = last.chars().count();
    if count <= PREVIEW_CHARS {
        return last.to_string();
    }
    let tail: String = last.chars().skip(count - PREVIEW_CHARS).collect();
    format!("...{}", tail)
}
