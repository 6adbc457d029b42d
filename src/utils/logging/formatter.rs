use chrono::Local;
use console::style;
use std::fmt::{self as std_fmt, Debug};
use tracing::Level;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};

use super::filters::is_noise;

/// Indentation tier of a console line, picked from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Source,
    Stage,
    Step,
}

const SOURCE_MARKERS: &[&str] = &["Processing source", "source(s) to process"];
const STAGE_MARKERS: &[&str] = &[
    "Selected main title",
    "No main title",
    "No playlist runs longer",
    "HDR format",
    "Starting encode",
    "Encoded ",
    "Analyzing ",
    "Batch finished",
];

impl Tier {
    pub fn of(message: &str) -> Self {
        if SOURCE_MARKERS.iter().any(|m| message.contains(m)) {
            Self::Source
        } else if STAGE_MARKERS.iter().any(|m| message.starts_with(m)) {
            Self::Stage
        } else {
            Self::Step
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Source => "▶",
            Self::Stage => "●",
            Self::Step => " ",
        }
    }
}

/// Console formatter: optional clock, tier prefix, level label only for
/// warnings and errors.
pub struct CleanFormatter {
    show_timestamps: bool,
    use_color: bool,
}

impl CleanFormatter {
    pub fn new(show_timestamps: bool, use_color: bool) -> Self {
        Self {
            show_timestamps,
            use_color,
        }
    }

    fn level_label(&self, level: &Level) -> Option<String> {
        let label = match *level {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
            Level::INFO => return None,
        };

        if !self.use_color {
            return Some(label.to_string());
        }
        let styled = match *level {
            Level::ERROR => style(label).red().bold(),
            Level::WARN => style(label).yellow().bold(),
            _ => style(label).dim(),
        };
        Some(styled.to_string())
    }

    pub fn render(&self, message: &str, level: &Level) -> String {
        let tier = Tier::of(message);
        let mut line = String::new();

        if self.show_timestamps {
            let clock = Local::now().format("%H:%M:%S").to_string();
            if self.use_color {
                line.push_str(&format!("[{}] ", style(clock).dim()));
            } else {
                line.push_str(&format!("[{}] ", clock));
            }
        }

        let prefix = if self.use_color {
            match tier {
                Tier::Source => style(tier.prefix()).cyan().bold().to_string(),
                Tier::Stage => style(tier.prefix()).blue().to_string(),
                Tier::Step => tier.prefix().to_string(),
            }
        } else {
            tier.prefix().to_string()
        };
        line.push_str(&prefix);
        line.push(' ');

        if let Some(label) = self.level_label(level) {
            line.push_str(&label);
            line.push(' ');
        }

        let body = match (tier, self.use_color) {
            (Tier::Source, true) => style(message).bold().to_string(),
            (Tier::Step, _) => format!("  {}", message),
            _ => message.to_string(),
        };
        line.push_str(&body);
        line
    }
}

impl<S, N> FormatEvent<S, N> for CleanFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std_fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if is_noise(&visitor.message) {
            return Ok(());
        }

        writeln!(writer, "{}", self.render(&visitor.message, event.metadata().level()))
    }
}

#[derive(Default)]
pub(super) struct MessageVisitor {
    pub message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
