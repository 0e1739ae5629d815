//! Choice catalogues accepted by the external translator

/// An ordered list of values the translator accepts for one setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSet {
    /// Human readable name of the setting
    pub name: &'static str,
    /// Accepted values, in display order
    pub values: &'static [&'static str],
}

impl OptionSet {
    /// Check if a value is one of the accepted choices
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value)
    }

    /// Pick the stored value if it is a known choice, otherwise the first entry.
    pub fn resolve(&self, value: Option<&str>) -> &'static str {
        value
            .and_then(|v| self.values.iter().find(|known| **known == v))
            .copied()
            .unwrap_or_else(|| self.first())
    }

    /// The first (fallback) choice
    pub fn first(&self) -> &'static str {
        self.values[0]
    }
}

pub const LANGUAGES: OptionSet = OptionSet {
    name: "Target language",
    values: &[
        "CHS", "CHT", "ENG", "JPN", "KOR", "VIE", "IND", "THA", "RUS", "GER", "FRA", "ITA", "SPA",
        "POR", "ARA",
    ],
};

pub const TRANSLATORS: OptionSet = OptionSet {
    name: "Translator",
    values: &[
        "sugoi", "nllb", "jparacrawl", "m2m100", "mbart50", "chatgpt", "deepl", "baidu", "youdao",
        "papago", "caiyun", "deepseek", "groq", "gemini", "qwen2", "offline",
    ],
};

pub const DETECTORS: OptionSet = OptionSet {
    name: "Detector",
    values: &["default", "dbconvnext", "ctd", "craft", "paddle", "none"],
};

pub const INPAINTERS: OptionSet = OptionSet {
    name: "Inpainter",
    values: &["default", "lama_large", "lama_mpe", "sd", "none", "original"],
};

pub const RENDERERS: OptionSet = OptionSet {
    name: "Renderer",
    values: &["default", "manga2eng", "none"],
};

pub const ALIGNMENTS: OptionSet = OptionSet {
    name: "Alignment",
    values: &["auto", "left", "center", "right"],
};

pub const OCR_MODELS: OptionSet = OptionSet {
    name: "OCR model",
    values: &["32px", "48px", "48px_ctc", "mocr"],
};

/// Every catalogue, for listings
pub fn all_option_sets() -> [OptionSet; 7] {
    [
        LANGUAGES,
        TRANSLATORS,
        DETECTORS,
        INPAINTERS,
        RENDERERS,
        ALIGNMENTS,
        OCR_MODELS,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_value() {
        assert_eq!(TRANSLATORS.resolve(Some("deepl")), "deepl");
        assert_eq!(OCR_MODELS.resolve(Some("48px_ctc")), "48px_ctc");
    }

    #[test]
    fn test_resolve_falls_back_to_first() {
        assert_eq!(INPAINTERS.resolve(None), "default");
        assert_eq!(LANGUAGES.resolve(Some("XYZ")), "CHS");
        // Matching is exact, not case-insensitive
        assert_eq!(LANGUAGES.resolve(Some("eng")), "CHS");
    }

    #[test]
    fn test_catalogues_not_empty() {
        for set in all_option_sets() {
            assert!(!set.values.is_empty(), "{} has no values", set.name);
            assert!(set.contains(set.first()));
        }
    }
}
