//! Lexical content-type heuristics

use crate::model::ContentType;

const CODE_TOKENS: &[&str] = &["def ", "import ", "print(", "lambda ", "return "];
const MARKUP_TOKENS: &[&str] = &["# ", "## ", "**", "```"];

/// Guess whether copied text is code, markdown or prose
///
/// Code tokens win over markup tokens, since Python comments look like headings.
pub fn classify(content: &str) -> ContentType {
    if content.trim().is_empty() {
        return ContentType::Unknown;
    }
    if CODE_TOKENS.iter().any(|token| content.contains(token)) {
        return ContentType::Code;
    }
    if MARKUP_TOKENS.iter().any(|token| content.contains(token)) {
        return ContentType::Markdown;
    }
    ContentType::Text
}
