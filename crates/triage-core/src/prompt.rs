//! Prompt rendering for urgency classification

/// Render the classification prompt for one email.
///
/// Subject and body are embedded verbatim. Nothing is escaped, so an email that
/// contains its own instructions can steer the model; the verdict is still
/// schema-checked after extraction.
pub fn build_prompt(subject: &str, body: &str) -> String {
    format!(
        "Analyze this email.\n\
         Subject: {subject}\n\
         Body: {body}\n\
         \n\
         Return ONLY a raw JSON object with exactly these keys:\n\
         - urgency (URGENT | IMPORTANT | IGNORE)\n\
         - reason (1 sentence)\n\
         - action (1 sentence)\n\
         \n\
         Do NOT include markdown.\n\
         Do NOT include explanations.\n\
         Do NOT include text outside JSON."
    )
}
