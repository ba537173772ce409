//! Prompt templates for the oracle.

use crate::models::{ChunkVerdict, Segment};

const INSTITUTION: &str = "the Bank of Canada";

/// Response schema shared by the single-shot and synthesis prompts.
const VERDICT_SCHEMA: &str = r#"{
  "stance": "HAWKISH|DOVISH|NEUTRAL|HOLD",
  "confidence": 85,
  "rate_change_probability": 60,
  "direction": "UP|DOWN|NONE",
  "key_signals": ["signal 1", "signal 2", ...],
  "summary": "Brief summary here",
  "inflation_concern": "HIGH|MEDIUM|LOW",
  "growth_outlook": "STRONG|MODERATE|WEAK"
}"#;

/// Prompt for analyzing a whole document in one call.
pub fn single_shot_prompt(content: &str, source_type: &str) -> String {
    format!(
        r#"You are a monetary policy analyst. Analyze the following {source_type} from {INSTITUTION} and provide a structured assessment.

Content to analyze:
{content}

Please analyze this content and provide:

1. **Policy Stance** (choose one):
   - HAWKISH (signals rate increases likely)
   - DOVISH (signals rate cuts likely)
   - NEUTRAL (balanced, no clear direction)
   - HOLD (maintaining current rates)

2. **Confidence Level** (0-100): How confident are you in this assessment?

3. **Rate Change Probability** (0-100): What's the probability of a rate change in the next 3 months?

4. **Direction**: If rate change likely, will it be UP or DOWN?

5. **Key Signals**: List 3-5 specific phrases or indicators that support your assessment

6. **Summary**: A brief 2-3 sentence summary of the monetary policy implications

7. **Inflation Concerns** (HIGH/MEDIUM/LOW): Level of concern about inflation

8. **Economic Growth Outlook** (STRONG/MODERATE/WEAK): How they view economic growth

Please respond in JSON format with these exact keys:
{VERDICT_SCHEMA}
"#
    )
}

/// Prompt for analyzing one segment of a longer document.
pub fn chunk_prompt(segment: &Segment, source_type: &str) -> String {
    let part = segment.index + 1;
    let total = segment.total;
    let index = segment.index;
    let text = &segment.text;

    format!(
        r#"You are analyzing PART {part} of {total} of a {source_type} from {INSTITUTION}.

Content to analyze (Part {part}/{total}):
{text}

Provide a focused analysis of THIS SECTION ONLY. Focus on the specific information present in this section.

Analyze and provide:
1. Key policy signals in THIS section
2. Inflation concerns mentioned HERE
3. Economic outlook discussed HERE
4. Any rate change indicators in THIS section

Respond in JSON format:
{{
  "chunk_index": {index},
  "key_signals": ["signal 1", "signal 2", ...],
  "inflation_concern": "HIGH|MEDIUM|LOW|UNCLEAR",
  "growth_outlook": "STRONG|MODERATE|WEAK|UNCLEAR",
  "summary": "Brief summary of this section's key points"
}}
"#
    )
}

/// Prompt for combining per-segment analyses into one verdict.
pub fn synthesis_prompt(chunks: &[ChunkVerdict], source_type: &str) -> String {
    let count = chunks.len();
    let analyses = serde_json::to_string_pretty(chunks).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You analyzed a {source_type} from {INSTITUTION} in {count} parts.
Here are the analyses from each part:

{analyses}

Now provide a FINAL OVERALL analysis synthesizing all parts. Consider:
- What is the overall policy stance across the entire document?
- What are the most important signals? (Pick top 5, don't list everything)
- What's the probability of rate change in next 3 months?
- Overall inflation concern level?
- Overall growth outlook?

Respond in JSON format with these exact keys:
{VERDICT_SCHEMA}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GrowthOutlook, InflationConcern};

    #[test]
    fn test_chunk_prompt_scopes_part() {
        let segment = Segment {
            text: "Inflation remains elevated.".to_string(),
            index: 2,
            total: 5,
        };
        let prompt = chunk_prompt(&segment, "Speech");

        assert!(prompt.contains("PART 3 of 5 of a Speech"));
        assert!(prompt.contains("(Part 3/5)"));
        assert!(prompt.contains("\"chunk_index\": 2"));
        assert!(prompt.contains("Inflation remains elevated."));
    }

    #[test]
    fn test_synthesis_prompt_embeds_chunks() {
        let chunks = vec![ChunkVerdict {
            chunk_index: 0,
            key_signals: vec!["core inflation sticky".to_string()],
            inflation_concern: InflationConcern::High,
            growth_outlook: GrowthOutlook::Weak,
            summary: "Sticky prices.".to_string(),
        }];
        let prompt = synthesis_prompt(&chunks, "Monetary Policy Report");

        assert!(prompt.contains("Monetary Policy Report from the Bank of Canada in 1 parts"));
        assert!(prompt.contains("core inflation sticky"));
        assert!(prompt.contains("\"inflation_concern\": \"HIGH\""));
        assert!(prompt.contains("FINAL OVERALL"));
    }

    #[test]
    fn test_single_shot_prompt() {
        let prompt = single_shot_prompt("Rates unchanged.", "Press Release");
        assert!(prompt.contains("Analyze the following Press Release"));
        assert!(prompt.contains("Rates unchanged."));
        assert!(prompt.contains("\"rate_change_probability\""));
    }
}
