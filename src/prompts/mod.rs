//! 提示词服务

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::i18n::TargetLanguage;
use crate::workflow::error::WorkflowError;
use crate::workflow::step::StepId;

pub mod defaults;

/// `{name}` 形式的占位符
static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").ok());

/// 覆盖文件中单个步骤的条目
#[derive(Debug, Deserialize, Default)]
struct PromptOverride {
    system: Option<String>,
    #[serde(default)]
    templates: HashMap<String, String>,
}

/// 管理所有步骤的系统提示词与用户提示词模板
#[derive(Debug, Clone)]
pub struct PromptService {
    system_prompts: HashMap<StepId, String>,
    templates: HashMap<StepId, HashMap<String, String>>,
    language: TargetLanguage,
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new(TargetLanguage::default())
    }
}

impl PromptService {
    /// 使用内置提示词
    pub fn new(language: TargetLanguage) -> Self {
        let mut system_prompts = HashMap::new();
        let mut templates = HashMap::new();

        for step in StepId::ALL {
            system_prompts.insert(step, defaults::system_prompt(step).to_string());
            let step_templates: HashMap<String, String> = defaults::templates(step)
                .iter()
                .map(|(name, template)| (name.to_string(), template.to_string()))
                .collect();
            templates.insert(step, step_templates);
        }

        Self {
            system_prompts,
            templates,
            language,
        }
    }

    /// 内置提示词叠加 TOML 文件中的覆盖项
    pub fn from_file(path: &Path, language: TargetLanguage) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read prompts file: {:?}", path))?;
        let mut service = Self::new(language);
        service.merge_overrides(&content)?;
        Ok(service)
    }

    /// 合并覆盖项
    ///
    /// ```toml
    /// [clarifier]
    /// system = "..."
    ///
    /// [clarifier.templates]
    /// interactive = "..."
    /// ```
    pub fn merge_overrides(&mut self, content: &str) -> Result<()> {
        let overrides: HashMap<String, PromptOverride> =
            toml::from_str(content).context("Failed to parse prompts file")?;

        for (step_name, entry) in overrides {
            let step = step_name
                .parse::<StepId>()
                .map_err(WorkflowError::Configuration)?;
            if let Some(system) = entry.system {
                self.system_prompts.insert(step, system);
            }
            self.templates
                .entry(step)
                .or_default()
                .extend(entry.templates);
        }
        Ok(())
    }

    pub fn language(&self) -> &TargetLanguage {
        &self.language
    }

    /// 系统提示词，末尾附加目标语言指令
    pub fn system_prompt(&self, step: StepId) -> String {
        let base = self
            .system_prompts
            .get(&step)
            .map(String::as_str)
            .unwrap_or_default();
        format!("{}\n\n{}", base, self.language.prompt_instruction())
    }

    /// 获取用户提示词模板
    pub fn get_template(&self, step: StepId, name: &str) -> Result<&str, WorkflowError> {
        self.templates
            .get(&step)
            .and_then(|templates| templates.get(name))
            .map(String::as_str)
            .ok_or_else(|| {
                WorkflowError::configuration(format!(
                    "prompt template '{}' is missing for step '{}'",
                    name, step
                ))
            })
    }

    /// 单遍替换模板中的 `{name}` 占位符。
    /// 未提供的占位符原样保留，代入的值不会再被展开。
    pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
        let Some(placeholder) = PLACEHOLDER.as_ref() else {
            return template.to_string();
        };
        placeholder
            .replace_all(template, |caps: &Captures| {
                vars.iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// 获取并渲染模板
    pub fn format(
        &self,
        step: StepId,
        name: &str,
        vars: &[(&str, &str)],
    ) -> Result<String, WorkflowError> {
        let template = self.get_template(step, name)?;
        Ok(Self::render(template, vars))
    }
}
