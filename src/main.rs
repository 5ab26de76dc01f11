use clap::Parser;
use dbtflow::cli::{self, Args};
use dbtflow::core::{AppError, DefaultErrorReporter, ErrorReporter};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _logging = match dbtflow::logging::init(&args) {
        Ok(guard) => Some(guard),
        Err(err) => {
            DefaultErrorReporter.report_warning("logging disabled", Some(format!("{:#}", err)));
            None
        }
    };

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<AppError>() {
                Some(app_error) => DefaultErrorReporter.report_error(app_error),
                None => eprintln!("[ERROR] {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
