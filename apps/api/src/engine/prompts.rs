// Prompt constants for the LLM engine.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role framing for tailoring. Combined with `JSON_ONLY_SYSTEM` at call time.
pub const TAILOR_SYSTEM: &str = "You are an expert resume writer and recruiter. \
    You tailor a candidate's own, factual profile to a specific job posting.";

/// Tailoring prompt template. Replace `{grounding_instruction}`, `{profile_json}`,
/// and `{posting_text}` before sending.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Tailor the candidate profile below to the job posting.

{grounding_instruction}

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "2-3 sentence professional summary aimed at this posting",
  "skills": ["skill phrases from the profile that the posting asks for"],
  "experience_bullets": ["one achievement or responsibility per bullet, at most 6"],
  "keywords": ["the 5-15 most important skills/technologies the posting asks for, lowercase"]
}

Rules:
- "keywords" come from the POSTING, whether or not the candidate has them.
- "skills" and "experience_bullets" come ONLY from the PROFILE.
- Each bullet is at most 30 words, starts with a verb, and has no leading bullet character.

CANDIDATE PROFILE:
{profile_json}

JOB POSTING:
{posting_text}
"#;
