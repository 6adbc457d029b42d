use crate::utils::ffmpeg::{parse_progress_line, ProgressInfo};
use crate::utils::logging::{is_error_line, is_noise};
use crate::utils::{Error, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, error};

/// Bar resolution: 0.01 %.
const BAR_LENGTH: u64 = 10_000;

/// Stderr lines kept for the failure report.
const STDERR_TAIL: usize = 20;

/// Result of a finished ffmpeg run.
#[derive(Debug)]
pub struct EncodeOutcome {
    pub status: ExitStatus,
    pub stderr_tail: Vec<String>,
}

pub struct ProgressMonitor {
    progress_bar: ProgressBar,
    start_time: Instant,
    total_duration: f64,
    update_interval: Duration,
    last_update: Option<Instant>,
}

impl ProgressMonitor {
    pub fn new(total_duration: f64, label: &str, update_interval: Duration) -> Self {
        let progress_bar = ProgressBar::new(BAR_LENGTH);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent:>3}% | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
        progress_bar.set_style(style);
        progress_bar.set_message(format!("{}: starting", label));

        Self {
            progress_bar,
            start_time: Instant::now(),
            total_duration,
            update_interval,
            last_update: None,
        }
    }

    /// Drains ffmpeg's stderr, driving the bar, then waits for exit.
    pub async fn monitor_encoding(&mut self, mut child: Child) -> Result<EncodeOutcome> {
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ffmpeg("ffmpeg stderr was not captured"))?;

        let mut segments = BufReader::new(stderr).split(b'\r');
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

        while let Some(segment) = segments.next_segment().await? {
            let text = String::from_utf8_lossy(&segment);
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                self.handle_line(line);
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
        }

        let status = child.wait().await?;
        if status.success() {
            self.finish();
        } else {
            self.progress_bar.abandon();
        }

        Ok(EncodeOutcome {
            status,
            stderr_tail: tail.into_iter().collect(),
        })
    }

    fn handle_line(&mut self, line: &str) {
        if let Some(info) = parse_progress_line(line) {
            self.update_progress(&info);
        } else if is_error_line(line) {
            self.progress_bar
                .suspend(|| error!("FFmpeg error: {}", line));
        } else if !is_noise(line) {
            debug!("ffmpeg: {}", line);
        }
    }

    fn update_progress(&mut self, info: &ProgressInfo) {
        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < self.update_interval {
                return;
            }
        }
        self.last_update = Some(now);

        let percent = info.percentage(self.total_duration);
        self.progress_bar
            .set_position((percent / 100.0 * BAR_LENGTH as f64) as u64);

        let mut parts = Vec::new();
        if let Some(fps) = info.fps {
            parts.push(format!("{:.1}fps", fps));
        }
        if let Some(speed) = info.speed {
            parts.push(format!("{:.2}x", speed));
        }
        if let Some(remaining) = estimate_remaining(self.start_time.elapsed(), percent) {
            let eta = Local::now()
                + chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::zero());
            parts.push(format!(
                "ETA {} ({})",
                eta.format("%H:%M:%S"),
                format_duration(remaining)
            ));
        }

        if !parts.is_empty() {
            self.progress_bar.set_message(parts.join(" • "));
        }
    }

    fn finish(&self) {
        self.progress_bar.set_position(BAR_LENGTH);
        self.progress_bar.finish_with_message(format!(
            "Completed in {}",
            format_duration(self.start_time.elapsed())
        ));
    }
}

/// Linear extrapolation from elapsed time and percent done.
pub fn estimate_remaining(elapsed: Duration, percent: f64) -> Option<Duration> {
    if percent <= 0.0 || percent > 100.0 {
        return None;
    }
    let elapsed = elapsed.as_secs_f64();
    let total = elapsed / (percent / 100.0);
    Some(Duration::from_secs_f64((total - elapsed).max(0.0)))
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
