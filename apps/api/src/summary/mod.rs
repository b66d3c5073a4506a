//! Summary Generator — a short fit summary for one resume against a JD.
//!
//! Primary: remote chat completion asked for `{summary, matches, gaps}` JSON.
//! A reply that is not that JSON comes back as `{raw}`. Only a failed call (or
//! no remote backend) drops to the rule-based keyword summary, so this never errors.

pub mod prompts;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::{strip_json_fences, ChatMessage, LlmClient};
use crate::summary::prompts::{build_summary_prompt, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE};

/// Words named in the rule-based sentence, per list.
const SENTENCE_WORDS: usize = 3;
/// Words returned in the rule-based `matches` / `gaps` lists.
const LIST_WORDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub summary: String,
    pub matches: Vec<String>,
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CandidateSummary {
    Structured(FitSummary),
    /// Model reply that did not parse as `FitSummary`.
    Raw { raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Llm,
    RuleBased,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryOutcome {
    #[serde(flatten)]
    pub summary: CandidateSummary,
    pub source: SummarySource, // for transparency
}

#[derive(Clone)]
pub struct SummaryGenerator {
    llm: Option<LlmClient>,
    model: String,
}

impl SummaryGenerator {
    /// `llm = None` means rule-based summaries only.
    pub fn new(llm: Option<LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub async fn generate_summary(&self, jd_text: &str, resume_text: &str) -> SummaryOutcome {
        if let Some(llm) = &self.llm {
            let messages = [ChatMessage::user(build_summary_prompt(jd_text, resume_text))];
            match llm
                .chat(&self.model, &messages, SUMMARY_TEMPERATURE, SUMMARY_MAX_TOKENS)
                .await
            {
                Ok(reply) => {
                    return SummaryOutcome {
                        summary: parse_reply(reply),
                        source: SummarySource::Llm,
                    }
                }
                Err(e) => warn!("Chat summary via '{}' failed, using rule-based: {e}", self.model),
            }
        }

        SummaryOutcome {
            summary: CandidateSummary::Structured(rule_based_summary(jd_text, resume_text)),
            source: SummarySource::RuleBased,
        }
    }
}

fn parse_reply(reply: String) -> CandidateSummary {
    match serde_json::from_str::<FitSummary>(strip_json_fences(&reply)) {
        Ok(parsed) => CandidateSummary::Structured(parsed),
        Err(_) => CandidateSummary::Raw { raw: reply },
    }
}

/// Keyword overlap between JD and resume.
///
/// The sentence names at most 3 matches and 3 gaps while the lists carry up to 6
/// of each. Both lists follow the JD's word order.
pub fn rule_based_summary(jd_text: &str, resume_text: &str) -> FitSummary {
    let jd_words = keyword_tokens(jd_text);
    let resume_words: HashSet<String> = keyword_tokens(resume_text).into_iter().collect();

    let (matches, gaps): (Vec<String>, Vec<String>) = jd_words
        .into_iter()
        .partition(|w| resume_words.contains(w));
    let matches: Vec<String> = matches.into_iter().take(LIST_WORDS).collect();
    let gaps: Vec<String> = gaps.into_iter().take(LIST_WORDS).collect();

    let summary = format!(
        "Auto summary: matches {}; gaps {}.",
        sentence_list(&matches),
        sentence_list(&gaps)
    );

    FitSummary {
        summary,
        matches,
        gaps,
    }
}

fn sentence_list(words: &[String]) -> String {
    if words.is_empty() {
        "none".to_string()
    } else {
        words
            .iter()
            .take(SENTENCE_WORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whitespace tokens longer than 2 chars, lowercased, with `.,()` trimmed from
/// both ends; unique, in first-occurrence order.
fn keyword_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(|w| {
            w.to_lowercase()
                .trim_matches(|c| matches!(c, '.' | ',' | '(' | ')'))
                .to_string()
        })
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn generator_for(server: &MockServer) -> SummaryGenerator {
        let llm = LlmClient::new("k".to_string(), &server.base_url(), Duration::from_secs(5))
            .unwrap()
            .with_max_retries(1);
        SummaryGenerator::new(Some(llm), "gpt-4o-mini")
    }

    fn chat_reply(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"content": content}}]})
    }

    #[test]
    fn test_rule_based_matches_and_gaps() {
        let s = rule_based_summary("Python SQL AWS", "Python Java AWS");
        assert!(s.matches.contains(&"python".to_string()));
        assert!(s.matches.contains(&"aws".to_string()));
        assert_eq!(s.gaps, vec!["sql".to_string()]);
        assert!(!s.matches.contains(&"java".to_string()));
        assert!(!s.gaps.contains(&"java".to_string()));
        assert_eq!(s.summary, "Auto summary: matches python, aws; gaps sql.");
    }

    #[test]
    fn test_rule_based_sentence_caps_at_three_lists_at_six() {
        let jd = "alpha bravo charlie delta echo foxtrot golf hotel";
        let s = rule_based_summary(jd, jd);

        assert_eq!(s.matches.len(), 6);
        assert!(s.gaps.is_empty());
        assert_eq!(
            s.summary,
            "Auto summary: matches alpha, bravo, charlie; gaps none."
        );
    }

    #[test]
    fn test_rule_based_no_overlap() {
        let s = rule_based_summary("Kubernetes", "Photoshop");
        assert!(s.matches.is_empty());
        assert_eq!(s.summary, "Auto summary: matches none; gaps kubernetes.");
    }

    #[test]
    fn test_tokens_trim_punctuation_and_drop_short_words() {
        // Length is checked before trimming, so "Go," survives as "go" but "Go" does not.
        let toks = keyword_tokens("Go, (Kubernetes) and AWS. Go SQL,");
        assert_eq!(toks, vec!["go", "kubernetes", "and", "aws", "sql"]);
    }

    #[tokio::test]
    async fn test_no_remote_uses_rule_based() {
        let generator = SummaryGenerator::new(None, "gpt-4o-mini");
        let outcome = generator
            .generate_summary("Python SQL AWS", "Python Java AWS")
            .await;
        assert_eq!(outcome.source, SummarySource::RuleBased);
        assert!(matches!(outcome.summary, CandidateSummary::Structured(_)));
    }

    #[tokio::test]
    async fn test_llm_json_reply_is_parsed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(chat_reply(
                "```json\n{\"summary\": \"Strong Go background.\", \"matches\": [\"go\"], \"gaps\": [\"aws\"]}\n```",
            ));
        });

        let outcome = generator_for(&server)
            .generate_summary("Go AWS", "Go")
            .await;

        assert_eq!(outcome.source, SummarySource::Llm);
        assert_eq!(
            outcome.summary,
            CandidateSummary::Structured(FitSummary {
                summary: "Strong Go background.".to_string(),
                matches: vec!["go".to_string()],
                gaps: vec!["aws".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_llm_prose_reply_is_wrapped_raw_not_rule_based() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(chat_reply("The candidate looks like a good fit."));
        });

        let outcome = generator_for(&server).generate_summary("Go", "Go").await;

        assert_eq!(outcome.source, SummarySource::Llm);
        assert_eq!(
            outcome.summary,
            CandidateSummary::Raw {
                raw: "The candidate looks like a good fit.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_rule_based() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "invalid api key"}}));
        });

        let outcome = generator_for(&server)
            .generate_summary("Python SQL AWS", "Python Java AWS")
            .await;

        assert_eq!(outcome.source, SummarySource::RuleBased);
        match outcome.summary {
            CandidateSummary::Structured(s) => assert_eq!(s.gaps, vec!["sql".to_string()]),
            other => panic!("expected structured fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = SummaryOutcome {
            summary: CandidateSummary::Raw {
                raw: "hi".to_string(),
            },
            source: SummarySource::Llm,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"raw": "hi", "source": "llm"})
        );
    }

    #[test]
    fn test_prompt_embeds_both_texts() {
        let prompt = build_summary_prompt("JD: Go {resume}", "CV: Rust {jd}");
        assert!(prompt.contains("Job Description:\nJD: Go {resume}"));
        assert!(prompt.contains("Candidate Resume:\nCV: Rust {jd}"));
    }
}
