//! Prompt template for the remote OCR-necessity advisory.

/// Template sent to the advisory model. `{has_text}` is replaced with the
/// local probe's finding; the model answers with a single SIM/NÃO verdict.
pub const DECISION_PROMPT_TEMPLATE: &str = "\
Você é um assistente que decide se um PDF de nota fiscal precisa passar por OCR.

Um PDF precisa de OCR quando não contém texto pesquisável (é apenas imagem \
escaneada). Um PDF que já contém texto pesquisável NÃO precisa de OCR.

Verificação local: o PDF {has_text} texto pesquisável.

Este PDF precisa de OCR? Responda apenas SIM ou NÃO.";

/// Render the decision prompt for a PDF the local probe found text in (or
/// not).
pub fn decision_prompt(has_text: bool) -> String {
    let finding = if has_text { "contém" } else { "não contém" };
    DECISION_PROMPT_TEMPLATE.replace("{has_text}", finding)
}
