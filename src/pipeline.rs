use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::calibration::{default_report_files, evaluate_confidence_accuracy};
use crate::confidence::aggregate;
use crate::config::EvalConfig;
use crate::llm::{call_api, Llm};
use crate::parsing::parse_response;
use crate::prompt::build_prompt;
use crate::store::ResultStore;
use crate::types::{AugmentedItem, ModelResponse, ProblemItem, ResultRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub items: usize,
    pub attempts: usize, // (item, variant) pairs sent to the model
    pub recorded: usize,
    pub api_failures: usize,
    pub parse_skips: usize,
    pub coercion_failures: usize,
    pub output_path: PathBuf,
    pub reports: Vec<PathBuf>,
}

enum Skipped {
    Api,
    Parse,
    Coercion,
}

/// Runs the standard dataset: one record per problem.
pub async fn run_standard(llm: &dyn Llm, cfg: &EvalConfig) -> Result<RunSummary> {
    let items: Vec<ProblemItem> = load_items(cfg.input_path(), cfg.limit)?;
    let pacer = pacer(cfg);
    let mut store = ResultStore::new(cfg.output_path());
    let mut summary = RunSummary { items: items.len(), output_path: store.path().to_path_buf(), ..Default::default() };
    info!(items = items.len(), model = %cfg.model, input = %cfg.input_path.display(), "starting standard run");

    for (idx, item) in items.iter().enumerate() {
        summary.attempts += 1;
        let outcome = query(llm, cfg, pacer.as_ref(), idx, item.prompt_question())
            .instrument(info_span!("item", idx))
            .await;
        let Some((model_response, raw_text)) = summary.tally(outcome) else { continue };
        store.append(ResultRecord {
            id: item.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            question_version: None,
            question: item.question.clone(),
            expected_answer: item.answer.clone(),
            model_response,
            raw_text,
            timestamp: now(),
        })?;
    }

    store.flush()?;
    summary.recorded = store.len();
    info!(?summary, "standard run finished");
    Ok(summary)
}

/// Runs the augmented dataset: one record per (item, variant), then writes
/// the accuracy summaries next to the results.
pub async fn run_augmented(llm: &dyn Llm, cfg: &EvalConfig) -> Result<RunSummary> {
    let items: Vec<AugmentedItem> = load_items(cfg.input_path(), cfg.limit)?;
    let pacer = pacer(cfg);
    let mut store = ResultStore::new(cfg.output_path());
    let mut summary = RunSummary { items: items.len(), output_path: store.path().to_path_buf(), ..Default::default() };
    info!(items = items.len(), model = %cfg.model, input = %cfg.input_path.display(), "starting augmented run");

    for (idx, item) in items.iter().enumerate() {
        for (key, variant) in item.variants() {
            summary.attempts += 1;
            let outcome = query(llm, cfg, pacer.as_ref(), idx, &variant.question)
                .instrument(info_span!("item", idx, variant = key))
                .await;
            let Some((model_response, raw_text)) = summary.tally(outcome) else { continue };
            store.append(ResultRecord {
                id: item.id.clone(),
                question_version: Some(key.to_string()),
                question: variant.question.clone(),
                expected_answer: variant.answer.clone(),
                model_response,
                raw_text,
                timestamp: now(),
            })?;
        }
    }

    store.flush()?;
    summary.recorded = store.len();
    summary.reports = evaluate_confidence_accuracy(
        store.records(),
        &default_report_files(&cfg.report_suffix),
        &cfg.output_dir,
    )?;
    info!(?summary, "augmented run finished");
    Ok(summary)
}

impl RunSummary {
    fn tally(&mut self, outcome: Result<(ModelResponse, String), Skipped>) -> Option<(ModelResponse, String)> {
        match outcome {
            Ok(v) => return Some(v),
            Err(Skipped::Api) => self.api_failures += 1,
            Err(Skipped::Parse) => self.parse_skips += 1,
            Err(Skipped::Coercion) => self.coercion_failures += 1,
        }
        None
    }
}

/// prompt -> model -> parse -> aggregate for a single question.
async fn query(
    llm: &dyn Llm,
    cfg: &EvalConfig,
    pacer: Option<&DefaultDirectRateLimiter>,
    idx: usize,
    question: &str,
) -> Result<(ModelResponse, String), Skipped> {
    if let Some(p) = pacer {
        p.until_ready().await;
    }
    let prompt = build_prompt(question);
    let raw = call_api(llm, &prompt, &cfg.model, idx).await.ok_or(Skipped::Api)?;
    let parsed = parse_response(&raw, idx, cfg.parse_policy).ok_or(Skipped::Parse)?;
    let response = aggregate(&parsed, cfg.logit_derivation).map_err(|e| {
        warn!(idx, error = %e, "cannot read confidence, skipping item");
        Skipped::Coercion
    })?;
    Ok((response, raw))
}

/// Fixed spacing between model calls; `None` when no delay is configured.
fn pacer(cfg: &EvalConfig) -> Option<DefaultDirectRateLimiter> {
    Quota::with_period(cfg.request_delay).map(RateLimiter::direct)
}

pub fn load_items<T: DeserializeOwned>(path: &Path, limit: Option<usize>) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read dataset {}", path.display()))?;
    let mut items: Vec<T> =
        serde_json::from_str(&content).with_context(|| format!("Invalid dataset {}", path.display()))?;
    if let Some(n) = limit {
        items.truncate(n);
    }
    Ok(items)
}

fn now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
