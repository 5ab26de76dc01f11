use crate::cli::{Args, HistoryArgs};
use crate::core::flows::{self, FlowContext, FlowRequest};
use crate::core::{
    ConfigLoader, ConfigValidator, DbtflowConfig, ResultsProcessor, RunHistoryRecorder,
    RunRecord, Workspace,
};
use crate::Result;

fn load_config(args: &Args) -> Result<DbtflowConfig> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_from_root(&args.root)?,
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

fn open_workspace(args: &Args, config: &DbtflowConfig) -> Result<Workspace> {
    Ok(Workspace::new(&args.root, &config.paths)?)
}

fn emit(rendered: &str) {
    if rendered.ends_with('\n') {
        print!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}

pub fn flows(args: &Args) -> Result<()> {
    emit(&ResultsProcessor::default().render_flows(args.format)?);
    Ok(())
}

pub fn history(args: &Args, history_args: &HistoryArgs) -> Result<()> {
    let config = load_config(args)?;
    let workspace = open_workspace(args, &config)?;
    let runs = RunHistoryRecorder::new(workspace.runs_dir()).list(history_args.limit)?;
    emit(&ResultsProcessor::default().render_history(&runs, args.format)?);
    Ok(())
}

/// Run one flow, record it under `.dbtflow/runs`, and print the outcome.
///
/// A failed run is recorded and printed before the error is returned, so the
/// exit code reflects the failure while the record survives.
pub async fn run_flow(args: &Args, request: FlowRequest) -> Result<()> {
    let config = load_config(args)?;
    let workspace = open_workspace(args, &config)?;
    let recorder = RunHistoryRecorder::new(workspace.runs_dir());
    let processor = ResultsProcessor::default();

    let mut run = RunRecord::start(request.kind());
    tracing::info!(run_id = %run.run_id, flow = %run.flow, "run started");

    let outcome = match FlowContext::new(workspace, config) {
        Ok(ctx) => flows::run_flow(&ctx, request).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(value) => {
            run.complete(value);
            if let Err(err) = recorder.record(&run) {
                tracing::warn!("failed to record run {}: {}", run.run_id, err.message);
            }
            emit(&processor.render_run(&run, args.format)?);
            Ok(())
        }
        Err(err) => {
            run.fail(&err);
            if let Err(record_err) = recorder.record(&run) {
                tracing::warn!(
                    "failed to record run {}: {}",
                    run.run_id,
                    record_err.message
                );
            }
            emit(&processor.render_run(&run, args.format)?);
            Err(err.into())
        }
    }
}
