#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use crate::i18n::TargetLanguage;
    use crate::workflow::definition::WorkflowVariant;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["deep-research-rs"]).unwrap();

        assert!(args.config.is_none());
        assert!(args.workflow.is_none());
        assert!(args.documents.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "deep-research-rs",
            "--provider",
            "anthropic",
            "--api-key",
            "test-key",
            "--api-base-url",
            "https://example.com/v1",
            "--model-efficient",
            "small",
            "--model-powerful",
            "large",
            "--temperature",
            "0.7",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.api_base_url, "https://example.com/v1");
        assert_eq!(config.llm.model_efficient, "small");
        assert_eq!(config.llm.model_powerful, "large");
        assert_eq!(config.llm.temperature, 0.7);
    }

    #[test]
    fn test_args_workflow_and_language() {
        let args = Args::try_parse_from([
            "deep-research-rs",
            "-w",
            "refine",
            "--target-language",
            "de",
            "--prompts",
            "prompts.toml",
            "-v",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.workflow.variant, WorkflowVariant::Refine);
        assert_eq!(config.target_language, TargetLanguage::German);
        assert_eq!(config.prompts_path, Some(PathBuf::from("prompts.toml")));
        assert!(config.verbose);
    }

    #[test]
    fn test_args_reject_unknown_values() {
        let args = Args::try_parse_from(["deep-research-rs", "--provider", "mistral"]).unwrap();
        let err = args.into_config().unwrap_err();
        assert!(err.to_string().contains("mistral"));

        let args = Args::try_parse_from(["deep-research-rs", "--workflow", "fast"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("deep-research.toml");
        std::fs::write(
            &config_path,
            r#"
[llm]
model_efficient = "file-model"
temperature = 0.1

[workflow]
variant = "simple"
steps = ["clarifier", "ranking"]
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "deep-research-rs",
            "--config",
            config_path.to_str().unwrap(),
            "--temperature",
            "0.9",
            "--workflow",
            "default",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.llm.model_efficient, "file-model");
        assert_eq!(config.llm.temperature, 0.9);
        assert_eq!(config.workflow.variant, WorkflowVariant::Default);
        assert!(config.workflow.steps.is_none());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args =
            Args::try_parse_from(["deep-research-rs", "--config", "/nonexistent/config.toml"])
                .unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_load_documents() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("plan.txt");
        let second = temp_dir.path().join("notes.md");
        std::fs::write(&first, "Expand to Europe").unwrap();
        std::fs::write(&second, "Budget is tight").unwrap();

        let args = Args::try_parse_from([
            "deep-research-rs",
            "--document",
            first.to_str().unwrap(),
            "-d",
            second.to_str().unwrap(),
        ])
        .unwrap();

        let documents = args.load_documents().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].name, "plan.txt");
        assert_eq!(documents[0].content, "Expand to Europe");
        assert_eq!(documents[1].name, "notes.md");
    }

    #[test]
    fn test_load_documents_reports_missing_file() {
        let args =
            Args::try_parse_from(["deep-research-rs", "--document", "/nonexistent/doc.txt"])
                .unwrap();
        let err = args.load_documents().unwrap_err();
        assert!(err.to_string().contains("doc.txt"));
    }
}
