//! Console logging for solver and job events.
//!
//! Solver crates emit `tracing` events tagged with an `event` field. The
//! layer installed by [`init`] prints the lifecycle ones as single lines;
//! everything else is left to other subscribers.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "shiftplan_solver=info";

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the console layer as the global subscriber.
///
/// Only the first call has an effect. Does nothing if another global
/// subscriber was installed first.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ConsoleLayer)
            .try_init();
    });
}

/// Formats tagged shiftplan events, one line each, on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("shiftplan") {
            return;
        }
        let mut fields = EventFields::default();
        event.record(&mut fields);
        if let Some(line) = format_event(*metadata.level(), &fields) {
            let _ = writeln!(io::stdout().lock(), "{}", line);
        }
    }
}

/// Fields of one event, in recording order.
#[derive(Debug, Default)]
struct EventFields {
    event: Option<String>,
    pairs: Vec<(&'static str, String)>,
}

impl EventFields {
    fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.event = Some(value.to_string());
        } else {
            self.pairs.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.record_str(field, s.trim_matches('"'));
    }
}

/// Renders lifecycle events; per-move and progress noise returns `None`.
fn format_event(level: Level, fields: &EventFields) -> Option<String> {
    let event = fields.event.as_deref()?;
    let label = match event {
        "solve_start" => "Solving started",
        "construction_end" => "Construction ended",
        "phase_start" => "Local search started",
        "phase_end" => "Local search ended",
        "new_best" => "New best",
        "solve_end" => "Solving ended",
        "job_submitted" => "Job submitted",
        "job_started" => "Job started",
        "job_completed" => "Job completed",
        "job_failed" => "Job failed",
        "job_cancel_requested" => "Cancel requested",
        "prefer_on_skipped" => "Request skipped",
        "empty_catalog" => "No usable pattern",
        _ => return None,
    };

    let mut line = format!("{} {:>5} {}", timestamp(), level, label);
    let details: Vec<String> = fields
        .pairs
        .iter()
        .filter(|(name, _)| *name != "message")
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    if !details.is_empty() {
        let _ = write!(line, ": {}", details.join(", "));
    }
    if event == "solve_end" {
        let verdict = match fields.get("feasible") {
            Some("true") => "feasible",
            Some(_) => "infeasible",
            None => "unknown",
        };
        let _ = write!(line, " [{}]", verdict);
    }
    Some(line)
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| format!("{:5}.{:03}", d.as_secs() % 100_000, d.subsec_millis()))
        .unwrap_or_else(|_| "    0.000".to_string())
}
