//! Lightweight diagnostics for the fsman workspace.
//!
//! Provides configurable logging shared by every crate in the project.
//!
//! Usage:
//! - Set FSMAN_LOG=off (default) - no logs
//! - Set FSMAN_LOG=info - reconciliation progress logs
//! - Set FSMAN_LOG=debug - detailed polling/diff diagnostics

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

static INIT: Once = Once::new();

/// Initialize diagnostics based on the FSMAN_LOG environment variable.
///
/// Call once at process startup. Safe to call multiple times; subsequent
/// calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var("FSMAN_LOG").unwrap_or_else(|_| "off".to_string());

        let rt = match log_level.as_str() {
            "off" => return, // No setup needed
            "debug" => emit::setup()
                .emit_to(emit_term::stderr())
                .emit_when(emit::level::min_filter(emit::Level::Debug))
                .init(),
            "info" => emit::setup()
                .emit_to(emit_term::stderr())
                .emit_when(emit::level::min_filter(emit::Level::Info))
                .init(),
            "warn" => emit::setup()
                .emit_to(emit_term::stderr())
                .emit_when(emit::level::min_filter(emit::Level::Warn))
                .init(),
            "error" => emit::setup()
                .emit_to(emit_term::stderr())
                .emit_when(emit::level::min_filter(emit::Level::Error))
                .init(),
            _ => {
                let rt = emit::setup()
                    .emit_to(emit_term::stderr())
                    .emit_when(emit::level::min_filter(emit::Level::Info))
                    .init();
                eprintln!("Warning: Unknown FSMAN_LOG value '{}', using 'info'", log_level);
                rt
            }
        };

        // The emit runtime must outlive every emitted event.
        std::mem::forget(rt);
    });
}

/// Re-export emit's logging macros.
///
/// These are re-exported rather than wrapped in `macro_rules!` so that emit's
/// implicit template capture (`"... {value}"` reading a local `value`) keeps
/// working at the call site; forwarding through a declarative macro would break
/// that capture's hygiene.
///
/// - `info!`  — basic operations (creates, deletes, reconciliation progress).
/// - `debug!` — detailed diagnostics (poll iterations, diff decisions, raw state).
/// - `warn!`  — warning conditions (tolerated conflicts, already-absent resources).
/// - `error!` — critical error conditions (backend failures, aborted runs).
pub use emit::{debug, error, info, warn};

/// Re-export the init function for convenience
pub use init_diagnostics as init;
