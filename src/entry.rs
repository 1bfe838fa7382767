use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use crate::args::{OutputFormat, RunArgs};
use crate::config::{load_config, resolve_config};
use crate::error::AppResult;
use crate::http::{ReqwestExecutor, RequestExecutor};
use crate::orchestrator::Orchestrator;
use crate::report::{export_summary, render_json, summary_lines};
use crate::shutdown::StopSignal;
use crate::shutdown_handlers::setup_signal_shutdown_handler;

/// Exit status for configuration and usage errors.
pub const EXIT_USAGE: u8 = 1;

/// Parse arguments, run the load test and map the verdict to an exit code.
#[must_use]
pub fn run() -> ExitCode {
    let args = match RunArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
            if let Err(print_err) = err.print() {
                eprintln!("Failed to print usage: {}", print_err);
            }
            return ExitCode::from(code);
        }
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    match run_blocking(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{}", err);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run_blocking(args: RunArgs) -> AppResult<u8> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

async fn run_async(args: RunArgs) -> AppResult<u8> {
    let file = load_config(args.config.as_deref())?;
    let config = Arc::new(resolve_config(&args, file.as_ref())?);
    let executor: Arc<dyn RequestExecutor> = Arc::new(ReqwestExecutor::new(
        config.request_timeout,
        config.request_timeout,
    )?);

    let orchestrator = Orchestrator::new(Arc::clone(&config), executor);
    let handler_done = StopSignal::new();
    let handler = setup_signal_shutdown_handler(orchestrator.abort_handle(), handler_done.token());
    let outcome = orchestrator.run().await;
    handler_done.stop();
    handler.await?;
    let report = outcome?;

    match config.output_format {
        OutputFormat::Text => {
            for line in summary_lines(&report) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if let Some(path) = config.summary_export.as_deref() {
        export_summary(path, &report).await?;
        info!("Summary written to {}", path.display());
    }

    Ok(report.exit_code())
}
