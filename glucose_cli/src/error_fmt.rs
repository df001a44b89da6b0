//! Human-readable error descriptions and structured JSON error formatting.

use glucose_core::error::{BuildError, GlucoseError};

/// Exit code for a run that completed but had no status to report.
pub const EXIT_NO_STATUS: i32 = 3;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingGlucoseStatus => {
                "What happened: No glucose status was provided to the request builder.\nLikely causes: The history was empty or stale, so no status could be computed.\nHow to fix: Check the reading history or pass --allow-old-data.".to_string()
            }
            BuildError::MissingProfile => {
                "What happened: No therapy profile was provided to the request builder.\nLikely causes: The profile was not wired into the builder.\nHow to fix: Pass a profile via with_profile(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid request configuration ({msg}).\nLikely causes: Out-of-range profile or autosens values.\nHow to fix: Correct the profile values, then rerun."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GlucoseError>() {
        return match ge {
            GlucoseError::Store(msg) | GlucoseError::Conflict(msg) => format!(
                "What happened: The reading store rejected the batch ({msg}).\nLikely causes: Corrupt or conflicting readings.\nHow to fix: Inspect the history file and re-run with --log-level=debug."
            ),
            GlucoseError::InvalidInput(msg) => format!(
                "What happened: Input was rejected ({msg}).\nLikely causes: A value could not be encoded for the decision engine.\nHow to fix: Inspect the reading history and re-run with --log-level=debug."
            ),
            // Fallback to generic for other domain errors
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or CSV loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("readings csv must have headers") {
        return "Invalid headers in readings CSV. Expected 'timestamp,value,sensor' optionally followed by 'filled_gap' and 'nightscout_id'.".to_string();
    }

    if lower.contains("invalid csv row") || lower.contains("open readings csv") {
        return format!(
            "What happened: The reading history could not be loaded.\nLikely causes: Missing file or malformed rows.\nHow to fix: Check the path and the row reported here: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains(" must be ") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 1 for config or input problems, 2 for pipeline errors.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<GlucoseError>().is_some() || err.downcast_ref::<BuildError>().is_some()
    {
        return 2;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ge) = err.downcast_ref::<GlucoseError>() {
        return match ge {
            GlucoseError::Store(_) => "Store",
            GlucoseError::Conflict(_) => "Conflict",
            GlucoseError::Config(_) => "Config",
            GlucoseError::InvalidInput(_) => "InvalidInput",
            GlucoseError::Engine(_) => "Engine",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_survive_context() {
        let err = eyre::Report::new(GlucoseError::Store("disk full".into()))
            .wrap_err("ingest history.csv");
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("disk full"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Store");
    }

    #[test]
    fn header_errors_get_a_short_hint() {
        let err = eyre::eyre!("readings CSV must have headers 'timestamp,value,sensor', got: a,b");
        assert!(humanize(&err).starts_with("Invalid headers in readings CSV"));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
