use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use confcal::{
  calibration::{default_report_files, evaluate_confidence_accuracy},
  confidence::LogitDerivation,
  config::{ApiConfig, EvalConfig},
  llm::openai::LlmClient,
  parsing::ParseFailurePolicy,
  pipeline,
  store::ResultStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name="confcal", version, about="Elicit and score model confidence on multiple-choice math problems")]
struct Cli {
  #[command(subcommand)]
  cmd: Cmd,
  /// OpenAI-compatible endpoint; defaults to api.openai.com
  #[arg(long, env="OPENAI_BASE_URL", global=true)] base_url: Option<String>,
  #[arg(long, env="OPENAI_API_KEY", hide_env_values=true, global=true)] api_key: Option<String>,
  /// Per-request timeout in seconds
  #[arg(long, default_value_t=120, global=true)] timeout_secs: u64,
}

#[derive(Subcommand)]
enum Cmd {
  /// One record per problem; unparseable answers kept as degraded records
  Run(RunArgs),
  /// One record per paraphrased variant, followed by accuracy summaries
  RunAugmented(RunArgs),
  /// Recompute accuracy summaries from an existing results file
  Score { #[arg(long)] results: PathBuf, #[arg(long, default_value="outputs")] output_dir: PathBuf, #[arg(long, default_value="")] suffix: String },
}

#[derive(Args)]
struct RunArgs {
  #[arg(long)] input_file: PathBuf,
  #[arg(long, default_value="outputs")] output_dir: PathBuf,
  /// Results file name inside the output directory
  #[arg(long)] output_file: Option<String>,
  #[arg(long)] model: Option<String>,
  /// Only evaluate the first N items
  #[arg(long)] limit: Option<usize>,
  /// Pause between model calls in milliseconds
  #[arg(long)] delay_ms: Option<u64>,
  #[arg(long, value_enum)] on_parse_failure: Option<ParseFailurePolicy>,
  #[arg(long, value_enum)] logit_derivation: Option<LogitDerivation>,
}

impl RunArgs {
  fn apply(self, mut cfg: EvalConfig) -> EvalConfig {
    if let Some(f) = self.output_file { cfg.output_file = f; }
    if let Some(m) = self.model { cfg.model = m; }
    if let Some(ms) = self.delay_ms { cfg.request_delay = Duration::from_millis(ms); }
    if let Some(p) = self.on_parse_failure { cfg.parse_policy = p; }
    if let Some(d) = self.logit_derivation { cfg.logit_derivation = d; }
    cfg.limit = self.limit;
    cfg
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
    .init();

  let cli = Cli::parse();
  let api = ApiConfig { base_url: cli.base_url, api_key: cli.api_key, timeout: Duration::from_secs(cli.timeout_secs) };

  match cli.cmd {
    Cmd::Run(args) => {
      let cfg = EvalConfig::standard(&args.input_file, &args.output_dir);
      let cfg = args.apply(cfg);
      let llm = LlmClient::from_config(&api)?;
      let summary = pipeline::run_standard(&llm, &cfg).await?;
      info!(recorded = summary.recorded, path = %summary.output_path.display(), "done");
    }
    Cmd::RunAugmented(args) => {
      let cfg = EvalConfig::augmented(&args.input_file, &args.output_dir);
      let cfg = args.apply(cfg);
      let llm = LlmClient::from_config(&api)?;
      let summary = pipeline::run_augmented(&llm, &cfg).await?;
      info!(recorded = summary.recorded, reports = summary.reports.len(), "done");
    }
    Cmd::Score { results, output_dir, suffix } => {
      let records = ResultStore::load(&results)?;
      let written = evaluate_confidence_accuracy(&records, &default_report_files(&suffix), &output_dir)?;
      info!(records = records.len(), reports = written.len(), "done");
    }
  }
  Ok(())
}
