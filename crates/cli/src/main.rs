mod cli;

use cli::{parse_args, EXIT_OK, EXIT_RUNTIME, EXIT_USAGE};
use std::io::{self, BufRead};
use std::process::ExitCode;
use textpipe::pipeline::Pipeline;
use textpipe::registry::StageRegistry;
use textpipe::stages::register_builtin_stages;
use textpipe::Record;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textpipe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            let code = if e.exit_code() == 0 { EXIT_OK } else { EXIT_USAGE };
            return ExitCode::from(code as u8);
        }
    };

    match run(args.capacity, args.stage_names) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "textpipe exiting");
            eprintln!("error: {e}");
            ExitCode::from(EXIT_RUNTIME as u8)
        }
    }
}

/// Read lines from stdin, feeding each to the pipeline's head stage, until
/// either an explicit `<END>` line or plain EOF — the latter synthesizes the
/// sentinel automatically so a stream that never sends one still drains.
fn run(capacity: usize, stage_names: Vec<String>) -> Result<(), textpipe::PipelineError> {
    let mut registry = StageRegistry::new();
    register_builtin_stages(&mut registry);

    let pipeline = Pipeline::construct(&registry, &stage_names, capacity)?;
    tracing::info!(stages = pipeline.len(), capacity, "textpipe started");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let record = Record::from(line);
        if record.is_sentinel() {
            break;
        }
        pipeline.submit(record)?;
    }

    pipeline.drain()?;
    pipeline.teardown();
    Ok(())
}
