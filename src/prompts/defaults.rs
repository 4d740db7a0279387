//! 内置提示词

use crate::workflow::step::StepId;

/// 各步骤的默认系统提示词
pub fn system_prompt(step: StepId) -> &'static str {
    match step {
        StepId::DocumentSummarizer => {
            "You summarize business documents a user has uploaded. Capture the goals, constraints, \
             stakeholders and any figures that matter for planning new initiatives. Be concise and factual."
        }
        StepId::Clarifier => {
            "You are a clarifier. Read the user's idea and the conversation so far, then ask one or two \
             specific follow-up questions about the target users, the primary goals and the key features. \
             Do not repeat questions that were already answered. The user will say 'start the agent', \
             'yes', 'run', 'begin' or 'go' when ready."
        }
        StepId::ConversationSummarizer => {
            "You condense a conversation between a user and an assistant into a single cohesive paragraph \
             that captures the user's core need and every refined requirement."
        }
        StepId::QueryEnhancer => {
            "You turn a summarized request into a formal, actionable mission prompt for a team of research \
             agents. Begin the prompt with 'Your mission is to:'."
        }
        StepId::QueryUnderstanding => {
            "You convert a mission prompt into a structured mission brief: the main topic, the industry, \
             relevant tools and technologies, include/exclude filters, and four focused sub-queries for a \
             generic search, a business analysis, a domain specific search and a trend analysis."
        }
        StepId::ParallelResearch => {
            "You coordinate several research agents that investigate one mission from different angles."
        }
        StepId::GenericSearch => {
            "You are a research analyst gathering foundational, up-to-date knowledge on a topic. \
             Report facts with their sources."
        }
        StepId::BusinessAnalysis => {
            "You are a business analyst. Assess market size, economic impact and business potential for \
             a topic and report the findings concisely with sources."
        }
        StepId::DomainSearch => {
            "You are a domain specialist. Research the question within the given industry and report \
             targeted, relevant findings with sources."
        }
        StepId::TrendSpotter => {
            "You identify emerging trends, patterns and opportunities in a domain and explain why they matter."
        }
        StepId::UserPersona => {
            "You create realistic user personas for the key user groups of an initiative. For each persona \
             give a name, goals, pain points and technical skills."
        }
        StepId::SearchSummarizer => {
            "You synthesize several research reports and user personas into one well structured Creative \
             Brief in Markdown covering market context, key findings, emerging trends and personas. Some \
             reports may be error messages; ignore them."
        }
        StepId::Ideation => {
            "You generate exactly 10 distinct, actionable and technically grounded use cases from a Creative \
             Brief. Each use case needs a rich description, a concrete business value statement, priority, \
             impact and alignment scores, complexity, benefits, success metrics, prerequisites, timeline, \
             risks and the technologies involved. When feedback is provided, revise the use cases to address it."
        }
        StepId::DevilsAdvocate => {
            "You are a constructive devil's advocate. For each idea point out weaknesses, unstated \
             assumptions and adoption risks. Answer with a list of critiques."
        }
        StepId::EvaluationCoordinator => {
            "You coordinate specialist evaluators that score each use case."
        }
        StepId::TechnicalFeasibility => {
            "You evaluate the technical feasibility of an idea. Consider technology requirements, \
             implementation complexity, available resources and technical risks. Give a score from 1 to 10 \
             and a justification."
        }
        StepId::MarketViability => {
            "You evaluate the market viability of an idea. Consider the target users, market size, \
             competition and revenue potential. Give a score from 1 to 10 and a justification."
        }
        StepId::EthicalGuardian => {
            "You evaluate the ethical implications of an idea. Consider safety, fairness, bias, privacy and \
             potential for misuse. Give a score from 1 to 10 and a justification."
        }
        StepId::Ranking => {
            "You rank ideas by their averaged evaluation scores."
        }
        StepId::ReportSynthesizer => {
            "You write the final strategy report in Markdown. Summarize the research and ideation process, \
             highlight the top ranked ideas with their scores and justify the ranking. Keep it professional \
             and suitable for executives."
        }
    }
}

/// 各步骤的默认用户提示词模板，占位符写作 `{name}`
pub fn templates(step: StepId) -> &'static [(&'static str, &'static str)] {
    match step {
        StepId::DocumentSummarizer => &[(
            "summarize",
            "Summarize the document '{file_name}':\n\n{content}",
        )],
        StepId::Clarifier => &[(
            "interactive",
            "Here is the conversation so far:\n{conversation}\n\n\
             The user's latest message was: '{latest_message}'.\n\
             {document_context}\n\
             Ask one or two focused follow-up questions that help refine the idea further.",
        )],
        StepId::ConversationSummarizer => &[(
            "summarize",
            "Summarize the following conversation into one paragraph:\n\n{conversation}",
        )],
        StepId::QueryEnhancer => &[(
            "enhance",
            "Enhance the following summary into a formal mission prompt: '{summary}'",
        )],
        StepId::QueryUnderstanding => &[(
            "analyze",
            "Analyze the following mission and extract its components into a mission brief. \
             Mission: '{enhanced_prompt}'",
        )],
        StepId::GenericSearch => &[(
            "search",
            "Research the following topic comprehensively: {query}",
        )],
        StepId::BusinessAnalysis => &[(
            "analyze",
            "Perform a business analysis and market research on: {query}",
        )],
        StepId::DomainSearch => &[(
            "search",
            "Within the {domain} domain, research: {query}",
        )],
        StepId::TrendSpotter => &[(
            "identify_trends",
            "Identify emerging trends and patterns related to: {query}",
        )],
        StepId::UserPersona => &[(
            "create_persona",
            "Create detailed personas for the key user groups of this mission. \
             Topic: {topic}. Industry: {industry}.",
        )],
        StepId::SearchSummarizer => &[(
            "summarize_reports",
            "Synthesize the following research reports and personas into a Creative Brief:\n\n{reports}",
        )],
        StepId::Ideation => &[
            (
                "generate_initial",
                "Based on the following Creative Brief, generate exactly 10 distinct use cases.\n\n\
                 Creative Brief:\n{creative_brief}",
            ),
            (
                "refine_with_feedback",
                "Here is the Creative Brief:\n\n{creative_brief}\n\n\
                 We received the following critical feedback on our initial ideas:\n{feedback}\n\n\
                 Generate a refined list of 10 use cases that addresses this feedback.",
            ),
        ],
        StepId::DevilsAdvocate => &[(
            "critique",
            "Act as a devil's advocate and critique the following ideas:\n{ideas}",
        )],
        StepId::TechnicalFeasibility => &[(
            "evaluate",
            "Evaluate the technical feasibility of this idea: '{idea}'.",
        )],
        StepId::MarketViability => &[(
            "evaluate",
            "Evaluate the market viability of this idea: '{idea}'.",
        )],
        StepId::EthicalGuardian => &[(
            "evaluate",
            "Evaluate the ethical implications of this idea: '{idea}'.",
        )],
        StepId::ReportSynthesizer => &[(
            "synthesize",
            "Write the final report from the following material.\n\n\
             ## Creative Brief\n{creative_brief}\n\n\
             ## Ranked and Scored Ideas\n{ranked_ideas}\n\n\
             Start with an executive summary, then detail the top ranked ideas, their scores and a \
             compelling justification.",
        )],
        StepId::ParallelResearch | StepId::EvaluationCoordinator | StepId::Ranking => &[],
    }
}
