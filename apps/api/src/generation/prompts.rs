// Instruction sent to the post-generation pipeline.
// The runtime only accepts free text per turn, so request fields are rendered
// as plain-text directives rather than structured fields.

/// Returns a one-line style directive for the tones the pipeline knows.
/// Unknown tones are passed through as-is with no extra guidance.
pub fn tone_guidance(tone: &str) -> Option<&'static str> {
    match tone.to_ascii_lowercase().as_str() {
        "professional" => Some(
            "Keep the voice polished and credible, conversational but never casual.",
        ),
        "casual" => Some("Write like you are talking to a colleague over coffee; keep it relaxed."),
        "enthusiastic" => Some("Show genuine excitement and energy without exaggeration."),
        "inspirational" => Some("Motivate the reader and close with an uplifting call-to-action."),
        "thought-leadership" | "thought leadership" => Some(
            "Take a clear position, back it with insight, and invite informed debate.",
        ),
        "educational" => Some("Teach one concrete thing the reader can apply today."),
        "storytelling" => Some("Frame the post around a short personal story with a clear lesson."),
        _ => None,
    }
}

/// Renders the single instruction message for one request.
pub fn build_instruction(topic: &str, context: Option<&str>, tone: &str) -> String {
    let context_line = context
        .map(|c| format!("Additional context: {c}\n"))
        .unwrap_or_default();
    let tone_guidance_line = tone_guidance(tone)
        .map(|g| format!("Style guidance: {g}\n"))
        .unwrap_or_default();

    // Single pass: braces inside user text are never treated as placeholders.
    format!("Create a LinkedIn post about: {topic}\n{context_line}Tone: {tone}\n{tone_guidance_line}")
        .trim_end()
        .to_string()
}
