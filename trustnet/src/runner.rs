//! Round runner.
//!
//! Drives one plugin through compile, staged rounds, and scoring:
//! - Walk each round's bindings in order; expression bindings evaluate
//!   immediately, call bindings start as `Null` placeholders and enter the
//!   round's batch
//! - Dedup the batch by request key, check policy caps, then provision the
//!   whole batch concurrently through the executor
//! - Rebind placeholders from the planning store and move to the next
//!   round, then evaluate the score expression and clamp it into [0, 1]
//!
//! Per-request failures land as `Null` bindings; compile errors, policy
//! violations, evaluation errors outside call arguments, and deadline
//! overruns fail the whole plugin.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use indexmap::IndexMap;

use tsl::{Binding, BindingValue, Environment, Evaluator, Round, Value};

use crate::context::{CapabilityContext, Collaborators};
use crate::error::{EngineError, EngineResult};
use crate::executor::{CapabilityExecutor, CapabilityRequest};
use crate::planning::{key_for_json, PlanningStore};
use crate::plugin::{Plugin, ProgramCache};
use crate::types::{EvaluationInput, EvaluationResult, Identity, IdentityReport};

/// Host limits for one plugin evaluation. Call caps count deduplicated
/// requests; repeats of an in-flight request and unplannable arguments are
/// free.
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    pub max_rounds: usize,
    pub max_calls_per_round: usize,
    pub max_total_calls: usize,
    pub max_source_bytes: usize,
    pub plugin_timeout: Duration,
    pub capability_timeout: Duration,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        EnginePolicy {
            max_rounds: 4,
            max_calls_per_round: 8,
            max_total_calls: 16,
            max_source_bytes: 16 * 1024,
            plugin_timeout: Duration::from_secs(5),
            capability_timeout: Duration::from_millis(1500),
        }
    }
}

pub struct RoundRunner {
    executor: Arc<CapabilityExecutor>,
    policy: EnginePolicy,
    cache: ProgramCache,
    evaluator: Evaluator,
}

impl RoundRunner {
    pub fn new(executor: Arc<CapabilityExecutor>, policy: EnginePolicy) -> Self {
        RoundRunner {
            executor,
            policy,
            cache: ProgramCache::new(),
            evaluator: Evaluator::default(),
        }
    }

    /// Evaluate every plugin for one target, sequentially against a shared
    /// planning store and a single clock reading, so identical requests
    /// execute at most once across the whole batch.
    pub async fn run_all(
        &self,
        plugins: &[Plugin],
        target: Identity,
        source: Option<Identity>,
        collaborators: &Collaborators,
    ) -> IdentityReport {
        let input = EvaluationInput::new(target, source);
        let ctx =
            CapabilityContext::for_input(&input, self.policy.capability_timeout, collaborators);
        let store = PlanningStore::new();

        let mut results = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            let result = self.run_plugin(plugin, &input, &ctx, &store).await;
            log::info!(
                "plugin `{}` scored {:.3} for `{}` in {} ms (success: {})",
                result.plugin_name,
                result.score,
                input.target,
                result.elapsed_ms,
                result.success
            );
            results.push(result);
        }
        IdentityReport::new(input.target, results)
    }

    /// Evaluate the plugin set for several targets. Each target gets its
    /// own planning store and clock reading.
    pub async fn run_batch(
        &self,
        plugins: &[Plugin],
        targets: &[Identity],
        source: Option<Identity>,
        collaborators: &Collaborators,
    ) -> Vec<IdentityReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            reports.push(
                self.run_all(plugins, target.clone(), source.clone(), collaborators)
                    .await,
            );
        }
        reports
    }

    /// Evaluate one plugin. Never panics and never errors out: every
    /// failure mode lands in the result record.
    pub async fn run_plugin(
        &self,
        plugin: &Plugin,
        input: &EvaluationInput,
        ctx: &CapabilityContext,
        store: &PlanningStore,
    ) -> EvaluationResult {
        let started = Instant::now();
        let deadline = self.policy.plugin_timeout;
        let outcome =
            tokio::time::timeout(deadline, self.evaluate(plugin, input, ctx, store)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(score)) => EvaluationResult {
                plugin_id: plugin.id.clone(),
                plugin_name: plugin.name().to_string(),
                score,
                success: true,
                error: None,
                elapsed_ms,
            },
            Ok(Err(err)) => {
                log::warn!("plugin `{}` failed: {}", plugin.name(), err);
                EvaluationResult::failure(&plugin.id, plugin.name(), err.to_string(), elapsed_ms)
            }
            Err(_) => {
                let err = EngineError::PluginTimeout(deadline.as_millis() as u64);
                log::warn!("plugin `{}` {}", plugin.name(), err);
                EvaluationResult::failure(&plugin.id, plugin.name(), err.to_string(), elapsed_ms)
            }
        }
    }

    async fn evaluate(
        &self,
        plugin: &Plugin,
        input: &EvaluationInput,
        ctx: &CapabilityContext,
        store: &PlanningStore,
    ) -> EngineResult<f64> {
        log::debug!(
            "evaluating plugin `{}` by `{}` (trusted: {}) for `{}`",
            plugin.name(),
            plugin.author,
            plugin.trusted,
            input.target
        );
        if plugin.source.len() > self.policy.max_source_bytes {
            return Err(EngineError::PolicyViolation(format!(
                "source is {} bytes, cap is {}",
                plugin.source.len(),
                self.policy.max_source_bytes
            )));
        }

        let program = self.cache.get_or_compile(&plugin.source)?;
        let mut env = input.plugin_environment();
        let mut total_calls = 0usize;
        for (round_index, round) in program.rounds.iter().enumerate() {
            // The cap gates round entry, so earlier rounds complete first.
            if round_index >= self.policy.max_rounds {
                return Err(EngineError::PolicyViolation(format!(
                    "program exceeds the round limit of {}",
                    self.policy.max_rounds
                )));
            }
            self.run_round(round_index, round, &mut env, ctx, store, &mut total_calls)
                .await?;
        }

        let score = self.evaluator.eval_expr(&program.score, &env)?;
        Ok(clamp_score(&score))
    }

    async fn run_round(
        &self,
        round_index: usize,
        round: &Round,
        env: &mut Environment,
        ctx: &CapabilityContext,
        store: &PlanningStore,
        total_calls: &mut usize,
    ) -> EngineResult<()> {
        log::debug!(
            "round {}: {} bindings",
            round_index,
            round.bindings.len()
        );

        // Stage 1: walk bindings, batching calls keyed for dedup.
        let mut batch: IndexMap<String, CapabilityRequest> = IndexMap::new();
        let mut pending: Vec<(String, Option<String>)> = Vec::new();
        for binding in &round.bindings {
            self.stage_binding(binding, env, &mut batch, &mut pending)?;
        }

        // Caps apply to the deduplicated batch, before anything executes.
        if batch.len() > self.policy.max_calls_per_round {
            return Err(EngineError::PolicyViolation(format!(
                "round {} plans {} calls, cap is {}",
                round_index,
                batch.len(),
                self.policy.max_calls_per_round
            )));
        }
        *total_calls += batch.len();
        if *total_calls > self.policy.max_total_calls {
            return Err(EngineError::PolicyViolation(format!(
                "evaluation plans {} calls, cap is {}",
                *total_calls, self.policy.max_total_calls
            )));
        }

        // Stage 2: provision the batch concurrently. Resolved values land
        // in the planning store; completion order is unobservable.
        let provisioning = batch
            .values()
            .map(|request| self.executor.execute(request, ctx, Some(store)));
        join_all(provisioning).await;

        // Stage 3: overwrite placeholders with provisioned values.
        for (name, key) in pending {
            let value = match key {
                Some(key) => store.get(&key).unwrap_or(Value::Null),
                None => Value::Null,
            };
            env.define(name, value);
        }
        Ok(())
    }

    /// Evaluate one binding. Expression bindings extend the environment
    /// directly; call bindings evaluate their argument, then take a `Null`
    /// placeholder and a store lookup key for rebinding after provisioning.
    /// An argument that fails to evaluate or has no JSON form leaves the
    /// binding `Null`.
    fn stage_binding(
        &self,
        binding: &Binding,
        env: &mut Environment,
        batch: &mut IndexMap<String, CapabilityRequest>,
        pending: &mut Vec<(String, Option<String>)>,
    ) -> EngineResult<()> {
        match &binding.value {
            BindingValue::Expr(expr) => {
                let value = self.evaluator.eval_expr(expr, env)?;
                env.define(binding.name.clone(), value);
            }
            BindingValue::Call {
                capability,
                argument,
            } => {
                // The argument sees the environment as it stood before this
                // binding: a self-reference is undefined, and a shadowed
                // name still holds its previous value. The placeholder is
                // bound afterwards, in time for later bindings in the round.
                let argument = self.evaluator.eval_expr(argument, env);
                env.define(binding.name.clone(), Value::Null);
                let argument = match argument {
                    Ok(value) => value,
                    Err(err) => {
                        log::warn!(
                            "binding `{}`: call argument failed to evaluate: {}",
                            binding.name,
                            err
                        );
                        pending.push((binding.name.clone(), None));
                        return Ok(());
                    }
                };
                match argument.to_json() {
                    Some(json) => {
                        let key = key_for_json(capability, &json);
                        if !batch.contains_key(&key) {
                            batch.insert(
                                key.clone(),
                                CapabilityRequest {
                                    key: key.clone(),
                                    capability: capability.clone(),
                                    argument: json,
                                    timeout: self.policy.capability_timeout,
                                },
                            );
                        }
                        pending.push((binding.name.clone(), Some(key)));
                    }
                    None => {
                        log::debug!(
                            "binding `{}`: argument for `{}` is unplannable",
                            binding.name,
                            capability
                        );
                        pending.push((binding.name.clone(), None));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Non-numeric and non-finite scores collapse to 0.0; numeric scores clamp
/// into [0, 1].
fn clamp_score(value: &Value) -> f64 {
    match value.as_f64() {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_numeric() {
        assert_eq!(clamp_score(&Value::Float(0.4)), 0.4);
        assert_eq!(clamp_score(&Value::Integer(1)), 1.0);
        assert_eq!(clamp_score(&Value::Float(2.5)), 1.0);
        assert_eq!(clamp_score(&Value::Float(-0.3)), 0.0);
    }

    #[test]
    fn test_clamp_score_non_numeric() {
        assert_eq!(clamp_score(&Value::Null), 0.0);
        assert_eq!(clamp_score(&Value::String("high".to_string())), 0.0);
        assert_eq!(clamp_score(&Value::Bool(true)), 0.0);
        assert_eq!(clamp_score(&Value::Float(f64::NAN)), 0.0);
        assert_eq!(clamp_score(&Value::Float(f64::INFINITY)), 0.0);
    }
}
