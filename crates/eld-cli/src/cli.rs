//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Electronic duty logbook.
///
/// Maintains a driver's duty-status timeline, merges status changes into it
/// under the regulatory continuity rules, and queues the results for push to
/// the carrier server.
#[derive(Debug, Parser)]
#[command(name = "eld", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Establish the driver identity used by recording commands.
    Init {
        /// The driver ID assigned by the carrier.
        #[arg(long)]
        driver: String,

        /// Human-friendly label (e.g. the driver's name).
        #[arg(long)]
        label: Option<String>,
    },

    /// Record a duty-status change for the current logbook slot.
    Duty {
        /// The new status: off-duty, sleeping, driving, on-duty or yard-move.
        status: String,

        /// Location description at the change.
        #[arg(long)]
        location: Option<String>,

        /// Odometer reading in miles.
        #[arg(long)]
        odometer: Option<f64>,

        /// Engine hour-meter reading.
        #[arg(long)]
        engine_hours: Option<f64>,

        /// Free-text note to attach to the resulting interval.
        #[arg(long)]
        note: Option<String>,
    },

    /// Rewrite a past span of the timeline to a different status.
    Amend {
        /// The status to record over the span.
        status: String,

        /// Span start (RFC 3339, or 'YYYY-MM-DD HH:MM' in UTC).
        #[arg(long)]
        from: String,

        /// Span end, exclusive (same formats as --from).
        #[arg(long)]
        to: String,

        /// How far continuity bookkeeping extends past the span.
        /// Defaults to the current logbook slot.
        #[arg(long)]
        horizon: Option<String>,

        /// Location description for the span.
        #[arg(long)]
        location: Option<String>,

        /// Odometer reading in miles.
        #[arg(long)]
        odometer: Option<f64>,

        /// Engine hour-meter reading.
        #[arg(long)]
        engine_hours: Option<f64>,

        /// Free-text note to attach to the resulting interval.
        #[arg(long)]
        note: Option<String>,
    },

    /// Decline a device-recorded driving interval back to the
    /// unidentified pool.
    Reject {
        /// ID of the closed automatic driving event.
        event_id: String,
    },

    /// Print the driver's timeline.
    Log {
        /// Emit JSON instead of the table.
        #[arg(long)]
        json: bool,
    },

    /// Show database, identity and outbox state.
    Status,

    /// Drain queued push records to stdout as JSONL.
    Export,
}
