use std::fmt;

/// Languages the prompt templates are written for.
///
/// Closed set by design: an unrecognized input never reaches a template
/// lookup because [`Language::detect`] is total and defaults to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Language {
    /// Classify text by script: any character in the Hangul syllable block
    /// makes the whole text Korean, otherwise English. First qualifying
    /// character short-circuits; this is a presence check, not a
    /// statistical classifier.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| ('가'..='힣').contains(&c)) {
            Language::Ko
        } else {
            Language::En
        }
    }

    /// Short language tag, matching the subtitle-file naming convention.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_korean() {
        assert_eq!(Language::detect("안녕하세요"), Language::Ko);
    }

    #[test]
    fn test_detect_english() {
        assert_eq!(Language::detect("hello world"), Language::En);
    }

    #[test]
    fn test_detect_empty_defaults_to_english() {
        assert_eq!(Language::detect(""), Language::En);
    }

    #[test]
    fn test_detect_mixed_text_is_korean() {
        assert_eq!(Language::detect("intro 영상 요약 outro"), Language::Ko);
    }

    #[test]
    fn test_detect_ignores_other_scripts() {
        assert_eq!(Language::detect("こんにちは 你好"), Language::En);
    }
}
