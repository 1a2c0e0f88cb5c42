/// Wraps a problem statement in the fixed tutor instructions.
///
/// The model is asked for a single JSON object; the field names here are the
/// ones `parsing` and `confidence` read back.
pub fn build_prompt(question: &str) -> String {
    format!(
        r#"
You are a careful math tutor. Solve the following high school math problem step-by-step.
Then:
1. Choose your final answer (A, B, C, or D).
2. Estimate your self-confidence (how likely you think your answer is correct) ∈ [0.0, 1.0].
3. Estimate your internal confidence (based on reasoning clarity and certainty) ∈ [0.0, 1.0].
4. Provide your confidence distribution over choices A–D as JSON (e.g. {{"A": 0.25, "B": 0.25, "C": 0.25, "D": 0.25}}).

Problem:
{question}

Return only a JSON with the following fields:
{{
  "reasoning": "...",
  "predicted_answer": "A",
  "self_confidence": 0.93,
  "internal_confidence": 0.91,
  "confidence_distribution": {{
    "A": 0.1, "B": 0.2, "C": 0.3, "D": 0.4
  }}
}}
"#
    )
}
