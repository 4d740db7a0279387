use regex::Regex;

/// 表示“可以开始”的默认触发短语
pub const DEFAULT_TRIGGER_PHRASES: &[&str] = &[
    "start the agent",
    "start agent",
    "yes",
    "ok",
    "okay",
    "run",
    "begin",
    "go",
    "go ahead",
    "proceed",
];

/// 包含触发词但并不表示同意的习惯用语，匹配前先从消息中移除
pub const DEFAULT_HEDGE_PHRASES: &[&str] = &["let's go", "go over", "go through", "go back", "go with"];

/// 触发短语匹配器
///
/// 大小写不敏感，只匹配完整的单词或短语，短语内部的空白匹配任意空白。
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    triggers: Vec<(String, Regex)>,
    hedges: Vec<Regex>,
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_PHRASES, DEFAULT_HEDGE_PHRASES)
    }
}

impl TriggerMatcher {
    pub fn new<S: AsRef<str>>(triggers: &[S], hedges: &[S]) -> Self {
        Self {
            triggers: triggers
                .iter()
                .filter_map(|p| phrase_regex(p.as_ref()).map(|r| (p.as_ref().to_string(), r)))
                .collect(),
            hedges: hedges
                .iter()
                .filter_map(|p| phrase_regex(p.as_ref()))
                .collect(),
        }
    }

    /// 消息是否表示可以继续
    pub fn is_ready(&self, message: &str) -> bool {
        self.matched_phrase(message).is_some()
    }

    /// 命中的触发短语
    pub fn matched_phrase(&self, message: &str) -> Option<&str> {
        let mut text = message.replace('\u{2019}', "'");
        for hedge in &self.hedges {
            text = hedge.replace_all(&text, " ").into_owned();
        }

        self.triggers
            .iter()
            .find(|(_, regex)| regex.is_match(&text))
            .map(|(phrase, _)| phrase.as_str())
    }
}

/// 空短语返回 None；转义后的模式总能编译
fn phrase_regex(phrase: &str) -> Option<Regex> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b{}\b", words.join(r"\s+"))).ok()
}
