// Shared prompt fragments. Each engine that calls the LLM keeps its own prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every generation prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Every claim you write must be supported by the candidate profile \
    provided. Do NOT infer, interpolate, or invent employers, titles, dates, metrics \
    or credentials. If the profile does not support a claim, omit it entirely.";
