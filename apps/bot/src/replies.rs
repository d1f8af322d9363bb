// User-facing texts. The bot speaks Turkish; users only ever see these, never error codes.

pub const GENERIC_ERROR: &str = "Bir hata oluştu, tekrar dene!";

/// Logged in place of an empty body when only media arrives.
pub const MEDIA_PLACEHOLDER: &str = "[Medya gönderildi]";

pub const AUDIO_ACK: &str = "🎤 Ses mesajını dinliyorum, biraz bekle...";
pub const AUDIO_ENQUEUE_FAILED: &str = "Ses mesajını işleyemedim!";
pub const IMAGE_ACK: &str = "📸 Fotoğrafa bakıyorum, hemen sonuç göndereceğim...";
pub const IMAGE_ENQUEUE_FAILED: &str = "Fotoğrafı işleyemedim!";
pub const UNSUPPORTED_MEDIA: &str = "Bu medya türünü desteklemiyorum. Ses veya görüntü gönder!";

pub const CHAT_FALLBACK: &str = "Şu an yanıt veremiyorum, biraz sonra tekrar dene!";

pub const REMINDER_GUIDANCE: &str = "Süre belirt! Örnek: '30 dakika sonra toplantı hatırlat'";
pub const REMINDER_FAILED: &str = "Hatırlatıcı oluştururken sorun çıktı!";

pub const IMAGE_PLACEHOLDER: &str = "[Fotoğraf gönderildi]";
pub const IMAGE_FAILED: &str = "Fotoğrafı analiz edemedim!";
pub const NARRATION_FALLBACK: &str = "Açıklama yapamadım.";

pub const VOICE_FAILED: &str = "Ses mesajını anlayamadım!";

pub fn reminder_confirmation(message: &str) -> String {
    format!("✅ Tamam! '{message}' konusunu sana hatırlatacağım.")
}

pub fn reminder_notification(message: &str) -> String {
    format!("🔔 Hatırlatma: {message}")
}

pub fn image_report(narration: &str, labels_text: &str) -> String {
    format!("📸 Fotoğrafını inceledim!\n\n{narration}\n\n🔍 Gördüklerim: {labels_text}")
}

pub fn voice_report(transcript: &str, answer: &str) -> String {
    format!("🎤 Duyduğum: \"{transcript}\"\n\n{answer}")
}
