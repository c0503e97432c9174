//! # Prompt Templates
//!
//! Deterministic prompt construction for the content transformation
//! endpoints. Every template is a pure function of the request fields: the
//! caller's content is bounded to a fixed prefix, selectors come from fixed
//! sets with defined fallbacks, and the assembled string goes to the model
//! verbatim.

/// Longest content prefix forwarded by the simplify endpoint.
pub const SIMPLIFY_CONTENT_LIMIT: usize = 3000;

/// Longest content prefix forwarded by the other transformation endpoints.
pub const CONTENT_LIMIT: usize = 2000;

/// Truncate to at most `max_chars` characters without splitting a char.
///
/// Byte-index truncation would panic on multi-byte boundaries, so this walks
/// char indices instead.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Per-disability writing guidance. Unrecognized values fall back to
/// "general" so a typo in the client never fails the request.
pub fn disability_guidance(disability_type: &str) -> &'static str {
    match disability_type.to_lowercase().as_str() {
        "dyslexia" => {
            "Use simple sentence structure, short paragraphs, and clear formatting. \
             Avoid complex words."
        }
        "adhd" => {
            "Break into small chunks, use bullet points, highlight key information, \
             keep it concise."
        }
        "autism" => {
            "Be literal and specific, avoid idioms and metaphors, use clear structure \
             and predictable patterns."
        }
        "intellectual" => {
            "Use very simple language, short sentences, concrete examples, and \
             repetition of key concepts."
        }
        _ => "Use clear and simple language appropriate for the reading level.",
    }
}

/// Prompt for the simplify endpoint.
pub fn simplify(content: &str, disability_type: &str, reading_level: u32) -> String {
    let guidance = disability_guidance(disability_type);
    format!(
        "You are an accessibility expert helping students with disabilities understand \
         educational content.\n\n\
         Original Content:\n{}\n\n\
         Task: Simplify this content for a student with {} at grade {} reading level.\n\n\
         Guidelines: {}\n\n\
         Provide simplified version that maintains all key information but is more accessible:",
        truncate_chars(content, SIMPLIFY_CONTENT_LIMIT),
        disability_type,
        reading_level,
        guidance,
    )
}

/// Prompt for a study-aid kind. Unrecognized kinds fall back to "summary".
pub fn study_aid(content: &str, aid_type: &str) -> (String, &'static str) {
    let content = truncate_chars(content, CONTENT_LIMIT);
    match aid_type.to_lowercase().as_str() {
        "flashcards" => (
            format!(
                "Create 5-7 flashcards from this content. Format as JSON array with \
                 'front' and 'back' keys.\n\n\
                 Content: {}\n\n\
                 Return only valid JSON array like: [{{\"front\": \"question\", \"back\": \"answer\"}}]",
                content
            ),
            "flashcards",
        ),
        "keyterms" => (
            format!(
                "Extract 5-7 key terms with definitions from this content. Format as \
                 JSON array.\n\n\
                 Content: {}\n\n\
                 Return only valid JSON array like: [{{\"term\": \"word\", \"definition\": \"meaning\"}}]",
                content
            ),
            "keyterms",
        ),
        "quiz" => (
            format!(
                "Create 5 multiple choice questions from this content. Format as JSON array.\n\n\
                 Content: {}\n\n\
                 Return only valid JSON array like: \
                 [{{\"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"correct\": 0}}]",
                content
            ),
            "quiz",
        ),
        _ => (
            format!(
                "Create a concise summary of this content in 3-4 bullet points:\n\n\
                 Content: {}",
                content
            ),
            "summary",
        ),
    }
}

/// Language codes the translate endpoint accepts, paired with the display
/// name used in prompts and responses. These are the codes the client UI
/// sends; anything else falls back to English.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Mandarin"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("ja", "Japanese"),
    ("pt", "Portuguese"),
];

/// Resolve a requested language code to its `(code, name)` pair.
pub fn resolve_language(code: &str) -> (&'static str, &'static str) {
    let lowered = code.to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == lowered)
        .copied()
        .unwrap_or(("en", "English"))
}

/// Prompt for the translate endpoint.
pub fn translate(content: &str, target_language: &str) -> String {
    let (_, language_name) = resolve_language(target_language);
    format!(
        "Translate this educational content into {} using simple, accessible language. \
         Keep the meaning intact and keep sentences short for students with reading \
         difficulties.\n\n\
         Content: {}",
        language_name,
        truncate_chars(content, CONTENT_LIMIT),
    )
}

/// Prompt sent alongside an uploaded image for the describe-image endpoint.
pub fn describe_image() -> &'static str {
    "Describe this image for a student who cannot see it. Explain what it shows, \
     any text it contains, and why it matters for understanding the surrounding \
     lesson. Use short, concrete sentences."
}

/// Prompt for the tutor-chat endpoint.
pub fn tutor_chat(question: &str, context: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a patient tutor for students with learning disabilities. Answer \
         clearly, one idea per sentence, and avoid jargon.\n\n",
    );
    if let Some(context) = context {
        prompt.push_str("Lesson context:\n");
        prompt.push_str(truncate_chars(context, CONTENT_LIMIT));
        prompt.push_str("\n\n");
    }
    prompt.push_str("Student question: ");
    prompt.push_str(truncate_chars(question, CONTENT_LIMIT));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_is_char_boundary_safe() {
        let text = "héllo wörld ünïcode";
        let truncated = truncate_chars(text, 7);
        assert_eq!(truncated.chars().count(), 7);
        assert_eq!(truncated, "héllo w");
    }

    #[test]
    fn test_truncation_leaves_short_content_alone() {
        assert_eq!(truncate_chars("short", 2000), "short");
    }

    #[test]
    fn test_simplify_bounds_content() {
        let content = "x".repeat(10_000);
        let prompt = simplify(&content, "dyslexia", 6);
        assert!(prompt.contains(&"x".repeat(SIMPLIFY_CONTENT_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(SIMPLIFY_CONTENT_LIMIT + 1)));
        assert!(prompt.contains("dyslexia"));
        assert!(prompt.contains("grade 6"));
    }

    #[test]
    fn test_unknown_disability_falls_back_to_general() {
        assert_eq!(
            disability_guidance("something else"),
            disability_guidance("general")
        );
        // Selection is case-insensitive.
        assert_eq!(disability_guidance("ADHD"), disability_guidance("adhd"));
    }

    #[test]
    fn test_unknown_aid_type_falls_back_to_summary() {
        let (prompt, resolved) = study_aid("material", "mindmap");
        assert_eq!(resolved, "summary");
        assert!(prompt.contains("3-4 bullet points"));
    }

    #[test]
    fn test_each_aid_kind_has_distinct_template() {
        let kinds = ["flashcards", "summary", "keyterms", "quiz"];
        let prompts: Vec<String> = kinds
            .iter()
            .map(|k| study_aid("material", k).0)
            .collect();
        for i in 0..prompts.len() {
            for j in (i + 1)..prompts.len() {
                assert_ne!(prompts[i], prompts[j]);
            }
        }
    }

    #[test]
    fn test_language_codes_resolve_to_names() {
        assert_eq!(resolve_language("zh"), ("zh", "Mandarin"));
        assert_eq!(resolve_language("hi"), ("hi", "Hindi"));
        assert_eq!(resolve_language("ar"), ("ar", "Arabic"));
        // Resolution is case-insensitive.
        assert_eq!(resolve_language("ES"), ("es", "Spanish"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(resolve_language("klingon"), ("en", "English"));
    }

    #[test]
    fn test_translate_prompt_names_the_language() {
        let prompt = translate("the water cycle", "zh");
        assert!(prompt.contains("into Mandarin"));
        assert!(prompt.contains("the water cycle"));
    }

    #[test]
    fn test_templates_are_deterministic() {
        assert_eq!(
            simplify("content", "autism", 8),
            simplify("content", "autism", 8)
        );
        assert_eq!(
            tutor_chat("why?", Some("ctx")),
            tutor_chat("why?", Some("ctx"))
        );
    }
}
