//! `clap` argument definition and validation for the `textpipe` host binary.

use clap::{value_parser, Arg, Command};
use textpipe::pipeline::{MAX_CAPACITY, MIN_CAPACITY};

/// Process exit codes. Distinct from each other so a caller (a shell script,
/// a test harness) can tell an argument mistake apart from a runtime failure
/// without parsing stderr.
pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_RUNTIME: i32 = 1;

/// Parsed, validated command-line arguments.
pub struct Args {
    pub capacity: usize,
    pub stage_names: Vec<String>,
}

pub fn build_command() -> Command {
    Command::new("textpipe")
        .about("Runs a configurable chain of text-transform stages over stdin")
        .arg(
            Arg::new("capacity")
                .help("Hand-off buffer capacity for every stage (1..=1000000)")
                .required(true)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("stages")
                .help("One or more stage names, applied in the given order")
                .required(true)
                .num_args(1..),
        )
}

/// Parse `argv` (excluding the program name convention is handled by clap
/// itself) and validate the capacity bound. clap's own validation failures
/// (missing args, non-numeric capacity) surface as its usual `Error` with
/// [`EXIT_USAGE`]-equivalent behavior when `.exit()` is used by the caller;
/// this function additionally rejects an in-range-typed but out-of-bounds
/// capacity, which clap's `value_parser` cannot express on its own.
pub fn parse_args<I, T>(argv: I) -> clap::error::Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(argv)?;
    let capacity = *matches
        .get_one::<usize>("capacity")
        .expect("capacity is required");
    let stage_names: Vec<String> = matches
        .get_many::<String>("stages")
        .expect("stages is required")
        .cloned()
        .collect();

    if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
        let mut cmd = build_command();
        return Err(cmd.error(
            clap::error::ErrorKind::ValueValidation,
            format!("capacity must be in {MIN_CAPACITY}..={MAX_CAPACITY}, got {capacity}"),
        ));
    }

    Ok(Args { capacity, stage_names })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_capacity_and_stage_names() {
        let args = parse_args(["textpipe", "5", "uppercaser", "logger"]).unwrap();
        assert_eq!(args.capacity, 5);
        assert_eq!(args.stage_names, vec!["uppercaser".to_string(), "logger".to_string()]);
    }

    #[test]
    fn zero_capacity_is_rejected_before_pipeline_construction() {
        assert!(parse_args(["textpipe", "0", "logger"]).is_err());
    }

    #[test]
    fn missing_stage_names_is_a_usage_error() {
        assert!(parse_args(["textpipe", "5"]).is_err());
    }

    #[test]
    fn non_numeric_capacity_is_a_usage_error() {
        assert!(parse_args(["textpipe", "abc", "logger"]).is_err());
    }
}
