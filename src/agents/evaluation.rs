//! 专家评估与排名

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agents::{AgentDeps, chosen_use_cases};
use crate::config::Evaluator;
use crate::types::evaluation::{EvaluationScore, RankedEntry, ScoredIdea};
use crate::types::use_case::UseCase;
use crate::workflow::context::{ContextKeys, WorkflowContext};
use crate::workflow::handler::{StepHandler, StepOutcome, SyncStepHandler};

/// 按配置的评估专家逐个为用例打分
pub struct EvaluationCoordinator {
    deps: AgentDeps,
    evaluators: Vec<Evaluator>,
}

impl EvaluationCoordinator {
    pub fn new(deps: AgentDeps, evaluators: Vec<Evaluator>) -> Self {
        Self { deps, evaluators }
    }

    async fn evaluate(&self, evaluator: Evaluator, idea: &str) -> Result<EvaluationScore> {
        let step = evaluator.step_id();
        let mut score: EvaluationScore = self
            .deps
            .extract(step, "evaluate", &[("idea", idea)])
            .await?;
        score.agent = step.as_str().to_string();
        score.score = score.score.clamp(1, 10);
        Ok(score)
    }
}

#[async_trait]
impl StepHandler for EvaluationCoordinator {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let ideas = chosen_use_cases(context)?;
        let mut scored = Vec::with_capacity(ideas.len());

        for idea in &ideas {
            if cancel.is_cancelled() {
                anyhow::bail!("evaluation interrupted");
            }
            let headline = idea.headline();
            let mut scores = Vec::with_capacity(self.evaluators.len());
            for evaluator in &self.evaluators {
                scores.push(self.evaluate(*evaluator, &headline).await?);
            }
            debug!(idea = %idea.name, scores = scores.len(), "idea evaluated");
            scored.push(ScoredIdea {
                idea: headline,
                scores,
            });
        }

        info!(ideas = scored.len(), evaluators = self.evaluators.len(), "evaluation finished");
        context.store(ContextKeys::SCORED_IDEAS, &scored)?;
        Ok(StepOutcome::Completed)
    }
}

/// 平均分，保留两位小数；没有分数时为 0
pub fn overall_score(scores: &[EvaluationScore]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: u32 = scores.iter().map(|s| u32::from(s.score)).sum();
    let mean = f64::from(total) / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// 按平均分降序排列，同分保持原有顺序
pub fn rank(scored: Vec<ScoredIdea>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = scored
        .into_iter()
        .map(|idea| RankedEntry {
            overall_score: overall_score(&idea.scores),
            idea: idea.idea,
            scores: idea.scores,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// 没有专家评估时以用例自带的评分代替
fn self_assessed(idea: &UseCase) -> ScoredIdea {
    ScoredIdea {
        idea: idea.headline(),
        scores: vec![
            EvaluationScore {
                agent: "impact_score".to_string(),
                score: idea.impact_score,
                justification: "self-assessed impact".to_string(),
            },
            EvaluationScore {
                agent: "alignment_score".to_string(),
                score: idea.alignment_score,
                justification: "self-assessed alignment".to_string(),
            },
        ],
    }
}

/// 排名步骤，纯计算
pub struct Ranking;

impl SyncStepHandler for Ranking {
    fn execute(&self, context: &mut WorkflowContext) -> Result<StepOutcome> {
        let scored: Vec<ScoredIdea> = match context.get(ContextKeys::SCORED_IDEAS) {
            Some(scored) => scored,
            None => {
                debug!("no scored ideas, ranking by self-assessed scores");
                chosen_use_cases(context)?
                    .iter()
                    .map(self_assessed)
                    .collect()
            }
        };

        let ranked = rank(scored);
        if let Some(top) = ranked.first() {
            info!(top = %top.idea, score = top.overall_score, "ranking finished");
        }
        context.store(ContextKeys::RANKED_IDEAS, &ranked)?;
        Ok(StepOutcome::Completed)
    }
}
