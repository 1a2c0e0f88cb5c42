use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::confidence::LogitDerivation;
use crate::parsing::ParseFailurePolicy;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const STANDARD_OUTPUT_FILE: &str = "prediction_with_uncertainties.json";
pub const AUGMENTED_OUTPUT_FILE: &str = "prediction_with_uncertainties_augmented.json";

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>, // None = api.openai.com
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: None, api_key: None, timeout: Duration::from_secs(120) }
    }
}

/// Everything one evaluation run needs, passed explicitly into the pipeline.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub model: String,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub limit: Option<usize>,     // first N items only
    pub request_delay: Duration,  // fixed pause between items; zero disables
    pub parse_policy: ParseFailurePolicy,
    pub logit_derivation: LogitDerivation,
    pub report_suffix: String,    // appended to accuracy summary file names
}

impl EvalConfig {
    /// Defaults of the standard pipeline: degraded records on parse failure,
    /// logit confidence from the distribution maximum, one second between calls.
    pub fn standard(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            output_file: STANDARD_OUTPUT_FILE.to_string(),
            limit: None,
            request_delay: Duration::from_secs(1),
            parse_policy: ParseFailurePolicy::Fallback,
            logit_derivation: LogitDerivation::MaxProbability,
            report_suffix: String::new(),
        }
    }

    /// Defaults of the augmented pipeline: unparseable responses are skipped,
    /// logit confidence is the mass on the predicted label, no pause.
    pub fn augmented(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_file: AUGMENTED_OUTPUT_FILE.to_string(),
            request_delay: Duration::ZERO,
            parse_policy: ParseFailurePolicy::Skip,
            logit_derivation: LogitDerivation::PredictedLabel,
            report_suffix: "_augmented".to_string(),
            ..Self::standard(input_path, output_dir)
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }
}
