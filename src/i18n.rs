use serde::{Deserialize, Serialize};

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ru")]
    Russian,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            "ko" | "korean" | "한국어" | "韩文" => Ok(TargetLanguage::Korean),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            "ru" | "russian" | "русский" | "俄文" => Ok(TargetLanguage::Russian),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::Korean => "한국어",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
            TargetLanguage::Russian => "Русский",
        }
    }

    /// 追加到每个系统提示词末尾的语言指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Write every answer in English. Keep JSON keys exactly as specified."
            }
            TargetLanguage::Chinese => "请使用中文回答，JSON 字段名保持原样不要翻译。",
            TargetLanguage::Japanese => {
                "すべての回答を日本語で書いてください。JSON のキーは指定どおりのままにしてください。"
            }
            TargetLanguage::Korean => {
                "모든 답변은 한국어로 작성해 주세요. JSON 키는 지정된 그대로 유지해 주세요."
            }
            TargetLanguage::German => {
                "Bitte antworten Sie auf Deutsch. JSON-Schlüssel bleiben unverändert."
            }
            TargetLanguage::French => {
                "Veuillez répondre en français. Les clés JSON restent telles quelles."
            }
            TargetLanguage::Russian => {
                "Пожалуйста, отвечайте на русском языке. Ключи JSON оставляйте без изменений."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_english() {
        assert_eq!(TargetLanguage::default(), TargetLanguage::English);
        assert_eq!(TargetLanguage::default().to_string(), "en");
    }

    #[test]
    fn test_from_str_accepts_aliases() {
        assert_eq!("中文".parse::<TargetLanguage>().unwrap(), TargetLanguage::Chinese);
        assert_eq!("German".parse::<TargetLanguage>().unwrap(), TargetLanguage::German);
        assert!("klingon".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_prompt_instruction_is_not_empty() {
        for language in [
            TargetLanguage::English,
            TargetLanguage::Chinese,
            TargetLanguage::Japanese,
            TargetLanguage::Korean,
            TargetLanguage::German,
            TargetLanguage::French,
            TargetLanguage::Russian,
        ] {
            assert!(!language.prompt_instruction().is_empty());
            assert!(!language.display_name().is_empty());
        }
    }
}
