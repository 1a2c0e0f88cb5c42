use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One multiple-choice problem from the standard dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemItem {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,          // uuid assigned when missing
    pub question: String,
    #[serde(default)]
    pub question_en: Option<String>, // translated text; preferred for the prompt
    pub answer: String,              // expected answer letter
}

impl ProblemItem {
    pub fn prompt_question(&self) -> &str {
        self.question_en.as_deref().unwrap_or(&self.question)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionVariant {
    pub question: String,
    pub answer: String,
}

/// A problem restated three ways; each variant is evaluated on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedItem {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    pub augmented_1: QuestionVariant,
    pub augmented_2: QuestionVariant,
    pub augmented_3: QuestionVariant,
}

impl AugmentedItem {
    pub const VARIANT_KEYS: [&'static str; 3] = ["augmented_1", "augmented_2", "augmented_3"];

    pub fn variants(&self) -> [(&'static str, &QuestionVariant); 3] {
        [
            (Self::VARIANT_KEYS[0], &self.augmented_1),
            (Self::VARIANT_KEYS[1], &self.augmented_2),
            (Self::VARIANT_KEYS[2], &self.augmented_3),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub self_eval_confidence: f64,
    pub logit_based_confidence: f64,
    pub internal_based_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub reasoning: String,
    pub predicted_answer: Option<String>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub confidence_distribution: BTreeMap<String, f64>, // as elicited, not normalised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_version: Option<String>, // augmented runs only
    pub question: String,
    pub expected_answer: String,
    pub model_response: ModelResponse,
    pub raw_text: String,
    pub timestamp: f64, // unix seconds
}

impl ResultRecord {
    pub fn is_correct(&self) -> bool {
        self.model_response.predicted_answer.as_deref() == Some(self.expected_answer.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(de)?.map(String::from))
}

fn required_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    RawId::deserialize(de).map(String::from)
}
