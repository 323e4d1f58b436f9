use reqwest::Client;
use std::time::Duration;

use crate::config::TranslateConfig;
use crate::error::{Result, JellysubError};

/// Line placed between subtitle segments when several are sent in one request
pub const SEGMENT_SEPARATOR: &str = "<<<>>>";

/// Build the HTTP client shared by the backends
pub fn build_client(config: &TranslateConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| JellysubError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Build the translation prompt for subtitle text
pub fn build_translation_prompt(text: &str, target_language: &str) -> String {
    let language_name = language_code_to_name(target_language);
    let mut prompt = format!(
        "You are a professional translator and you are translating a subtitle.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Maintain the original format: keep every line break where it is.\n\
         Return ONLY the translation. Do not include any explanations, alternatives, or notes.\n",
        language_name, language_name, target_language
    );

    if text.contains(SEGMENT_SEPARATOR) {
        prompt.push_str(&format!(
            "The text consists of separate subtitle lines divided by lines containing only {}.\n\
             Translate each part separately and keep every {} separator line, so the answer has \
             exactly the same number of parts in the same order.\n",
            SEGMENT_SEPARATOR, SEGMENT_SEPARATOR
        ));
    }

    prompt.push_str(&format!("\n[Text to translate]\n{}\n", text));
    prompt
}

/// Convert language code to full language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    let name = match code.to_lowercase().as_str() {
        "ja" | "jpn" => "Japanese",
        "ko" | "kor" => "Korean",
        "zh" | "zh-cn" | "zh-hans" | "chi" | "zho" => "Simplified Chinese",
        "zh-tw" | "zh-hant" => "Traditional Chinese",
        "fr" | "fre" | "fra" => "French",
        "de" | "ger" | "deu" => "German",
        "es" | "spa" => "Spanish",
        "ru" | "rus" => "Russian",
        "it" | "ita" => "Italian",
        "pt" | "por" => "Portuguese",
        "pl" | "pol" => "Polish",
        "nl" | "dut" | "nld" => "Dutch",
        "tr" | "tur" => "Turkish",
        "ar" | "ara" => "Arabic",
        "hi" | "hin" => "Hindi",
        "th" | "tha" => "Thai",
        "vi" | "vie" => "Vietnamese",
        "sv" | "swe" => "Swedish",
        "da" | "dan" => "Danish",
        "no" | "nor" => "Norwegian",
        "fi" | "fin" => "Finnish",
        "he" | "heb" => "Hebrew",
        "hu" | "hun" => "Hungarian",
        "cs" | "cze" | "ces" => "Czech",
        "uk" | "ukr" => "Ukrainian",
        "id" | "ind" => "Indonesian",
        "en" | "eng" => "English",
        _ => return code.to_string(), // Fallback to the code itself if not found
    };
    name.to_string()
}

/// Remove markdown code fences some models wrap their answer in
pub fn clean_translation_response(response: &str) -> String {
    let text = response.trim();

    if let Some(inner) = text.strip_prefix("```") {
        if let Some(inner) = inner.strip_suffix("```") {
            // Drop an info string such as ```text
            let inner = match inner.find('\n') {
                Some(newline) if !inner[..newline].trim().contains(' ') => &inner[newline + 1..],
                _ => inner,
            };
            return inner.trim().to_string();
        }
    }

    text.to_string()
}
