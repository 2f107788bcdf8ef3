//! Known preset voices per engine

/// Preset speakers shipped with pocket-tts
pub const POCKET_VOICES: &[&str] = &[
    "alba", "marius", "javert", "jean", "fantine", "cosette", "eponine", "azelma",
];

/// VibeVoice personas and what they sound like
pub const VIBEVOICE_VOICES: &[(&str, &str)] = &[
    ("en-Emma_woman", "Native English - Professional & Clear"),
    ("en-Grace_woman", "Native English - Warm & Natural"),
    ("en-Wayne_man", "Native English - Deep & Authoritative"),
    ("nl-Spk1_woman", "Native Dutch - High Quality Female"),
    ("de-Spk1_woman", "German Female (Cross-lingual capable)"),
    ("fr-Spk1_woman", "French Female (Cross-lingual capable)"),
];

pub fn is_pocket_preset(name: &str) -> bool {
    POCKET_VOICES.contains(&name)
}

/// VibeVoice persona the server should use when none was requested
pub fn default_vibevoice_voice(language: &str) -> &'static str {
    match language {
        "nl" => "nl-Spk1_woman",
        _ => "en-Emma_woman",
    }
}

/// `(engine, voice, description)` rows for listing
pub fn catalog() -> Vec<(&'static str, &'static str, &'static str)> {
    let pocket = POCKET_VOICES
        .iter()
        .map(|v| ("pocket_tts", *v, "pocket-tts preset speaker"));
    let vibe = VIBEVOICE_VOICES
        .iter()
        .map(|(v, desc)| ("vibevoice", *v, *desc));
    pocket.chain(vibe).collect()
}
