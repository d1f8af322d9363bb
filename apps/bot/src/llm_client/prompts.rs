// Prompt constants and prompt builders shared by the responder and the workers.
// Every prompt instructs the model to answer in Turkish.

/// System instruction for free-form chat.
pub const CHAT_SYSTEM: &str = "Sen yardımcı bir WhatsApp asistanısın. \
    Kısa, öz ve dostça yanıtlar ver. \
    Her zaman Türkçe konuş.";

pub const CHAT_MAX_TOKENS: u32 = 1000;

pub const DESCRIBE_MAX_TOKENS: u32 = 500;

/// Single-turn prompt asking the model to narrate detected image labels.
pub fn describe_labels_prompt(labels_text: &str) -> String {
    format!(
        "Bu fotoğrafta şunlar var: {labels_text}. \
         Kullanıcıya bu fotoğrafı 2-3 cümle ile kısa ve dostça açıkla. Türkçe konuş."
    )
}
