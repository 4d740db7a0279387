use crate::config::LLMConfig;

/// 超过该长度的输入直接使用高质量模型
const EFFICIENT_INPUT_LIMIT: usize = 32 * 1024;

/// 按输入长度选择模型，返回（首选模型，兜底模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_INPUT_LIMIT {
        return (
            llm_config.model_efficient.clone(),
            Some(llm_config.model_powerful.clone()),
        );
    }
    (llm_config.model_powerful.clone(), None)
}
