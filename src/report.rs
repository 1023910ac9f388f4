//! Translation of a failed command into a message and an exit status.

use crate::{Error, error, logging};

use std::io;

/// Exit status for any reported failure.
pub const EX_FAILURE: u8 = 1;

/// Exit status when the failure could not be recorded in the error log.
pub const EX_SOFTWARE: u8 = 70;

/// Printed when no AWS region could be resolved.
pub const NO_REGION_MESSAGE: &str = "The AWS CLI is not configured. Please configure it using \
    instructions at http://docs.aws.amazon.com/cli/latest/userguide/cli-chap-getting-started.html";

/// Report `err` on `stderr` and return the exit status.
///
/// Verbose runs print the whole source chain. Otherwise the chain goes to
/// `error_log` and only a one-line summary is printed; when there is no log
/// or it cannot be written, the chain is printed and [`EX_SOFTWARE`] returned.
pub fn report(
    err: &Error,
    verbose: bool,
    error_log: Option<&logging::ErrorLog>,
    stderr: &mut impl io::Write,
) -> u8 {
    if matches!(err, Error::NoRegion) {
        let _ = writeln!(stderr, "{NO_REGION_MESSAGE}");
        return EX_FAILURE;
    }
    let trace = error::trace(err);
    if verbose {
        let _ = writeln!(stderr, "{trace}");
        return EX_FAILURE;
    }
    let Some(error_log) = error_log else {
        let _ = writeln!(stderr, "{trace}");
        return EX_SOFTWARE;
    };
    match error_log.append(&trace) {
        Ok(()) => {
            let _ = writeln!(
                stderr,
                "{}: {err}. See {} for error details.",
                err.kind(),
                error_log.path().display()
            );
            EX_FAILURE
        }
        Err(log_err) => {
            tracing::debug!(error = %log_err, path = %error_log.path().display(), "could not write error log");
            let _ = writeln!(stderr, "{trace}");
            EX_SOFTWARE
        }
    }
}
