// Shared prompt fragments. Each module that calls the model keeps its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// Appended to every prompt that expects a machine-readable reply.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
