// Prompt constants for the Summary Generator.

/// Candidate summary prompt. Replace `{jd}` and `{resume}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"
You are an HR assistant. Given this job description and a candidate's resume text, produce:
1) A 2-3 sentence summary of the candidate's fit.
2) Top 3 matching skills/keywords that match JD.
3) Top 3 gaps or missing keywords the candidate lacks relative to JD.

Job Description:
{jd}

Candidate Resume:
{resume}

Answer in JSON with fields: summary (string), matches (list), gaps (list).
"#;

pub const SUMMARY_TEMPERATURE: f32 = 0.2;
pub const SUMMARY_MAX_TOKENS: u32 = 400;

pub fn build_summary_prompt(jd_text: &str, resume_text: &str) -> String {
    // Resume first: a JD containing "{resume}" must not be substituted twice.
    SUMMARY_PROMPT_TEMPLATE
        .replace("{resume}", resume_text)
        .replacen("{jd}", jd_text, 1)
}
