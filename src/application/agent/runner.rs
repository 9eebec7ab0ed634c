use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, AgentStep, RunStatus};
use super::project::{detect_project_directory, is_web_request, validate_project};
use super::retry::{CredentialPool, RetryController, RetryDirective};
use super::step::{DecodeOutcome, Step, decode_step};
use crate::application::tooling::ToolCommand;
use crate::domain::Conversation;
use crate::infrastructure::model::{ModelError, ModelProvider, ModelRequest};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Labeled interpreter transitions. Every decoded step maps to exactly one.
enum Transition {
    /// Think/observer content was logged; poll for the next step.
    Continue,
    /// Send this content back as an observer message, then keep looping.
    Feedback(String),
    /// Accept the output step and end the run.
    Finish(String),
}

pub struct Agent<P: ModelProvider> {
    provider: P,
    pool: CredentialPool,
    options: AgentOptions,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(provider: P, pool: CredentialPool, options: AgentOptions) -> Self {
        Self {
            provider,
            pool,
            options,
        }
    }

    /// Drive the step loop for one user request.
    ///
    /// The budget counts model exchanges; rate-limit and invalid-credential
    /// recoveries retry the same exchange without charging it. Credential
    /// rotation replays the conversation from its seed state, so the model
    /// restarts from the original query rather than a half-recorded history.
    pub async fn run(&self, query: String) -> Result<AgentOutcome, AgentError> {
        if self.pool.is_empty() {
            return Err(AgentError::NoCredentials);
        }

        let run_id = Uuid::new_v4().to_string();
        info!(run_id = run_id.as_str(), query = query.as_str(), "Agent run started");

        let mut retry = RetryController::new(self.pool.clone());
        let mut provider = self.provider.with_credential(retry.current());
        let mut conversation = Conversation::new(self.options.system_prompt.clone(), query.clone());

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut steps_used = 0usize;

        while steps_used < self.options.max_steps {
            steps_used += 1;
            debug!(
                steps_used,
                history = conversation.exchange_count(),
                "Requesting next step from model"
            );

            let request = ModelRequest {
                model: self.options.model.clone(),
                messages: conversation.request_messages(),
            };

            let reply = match provider.chat(request).await {
                Ok(reply) => {
                    retry.on_success();
                    reply
                }
                Err(ModelError::RateLimited { retry_after, .. }) => {
                    steps_used -= 1;
                    warn!(
                        streak = retry.consecutive_failures() + 1,
                        "Rate limit hit on current credential"
                    );
                    match retry.on_rate_limit(retry_after) {
                        RetryDirective::Rotate { credential } => {
                            provider = self.provider.with_credential(&credential);
                            conversation.reset();
                            info!("Reinitialized conversation with rotated credential");
                        }
                        RetryDirective::Backoff { delay } => {
                            tokio::time::sleep(delay).await;
                        }
                        RetryDirective::GiveUp => return Err(AgentError::CredentialsExhausted),
                    }
                    continue;
                }
                Err(ModelError::InvalidCredential { .. }) => {
                    steps_used -= 1;
                    match retry.on_invalid_credential() {
                        RetryDirective::Rotate { credential } => {
                            provider = self.provider.with_credential(&credential);
                            conversation.reset();
                            info!("Reinitialized conversation after invalid credential");
                        }
                        RetryDirective::Backoff { delay } => {
                            tokio::time::sleep(delay).await;
                        }
                        RetryDirective::GiveUp => return Err(AgentError::CredentialsExhausted),
                    }
                    continue;
                }
                Err(other) => return Err(other.into()),
            };

            match decode_step(&reply.content) {
                DecodeOutcome::Transient => {
                    debug!(raw = reply.content.as_str(), "Unusable reply; polling again");
                    conversation.push_assistant(reply.content);
                    conversation.push_user("");
                }
                DecodeOutcome::NonJson => {
                    warn!(raw = reply.content.as_str(), "Model left the step protocol");
                    return Ok(AgentOutcome {
                        run_id,
                        status: RunStatus::NonJsonReply,
                        response: None,
                        steps,
                    });
                }
                DecodeOutcome::UnknownKind(kind) => {
                    return Err(AgentError::UnrecognizedStep(kind));
                }
                DecodeOutcome::Step(step) => {
                    conversation.push_assistant(reply.content.clone());
                    let transition = self.apply_step(step, &query, &mut steps).await;
                    match transition {
                        Transition::Continue => conversation.push_user(""),
                        Transition::Feedback(content) => {
                            conversation.push_user(observer_payload(&content));
                        }
                        Transition::Finish(content) => {
                            info!(run_id = run_id.as_str(), "OUTPUT: {content}");
                            return Ok(AgentOutcome {
                                run_id,
                                status: RunStatus::Completed,
                                response: Some(content),
                                steps,
                            });
                        }
                    }
                }
            }
        }

        warn!(run_id = run_id.as_str(), "Step budget exhausted");
        Ok(AgentOutcome {
            run_id,
            status: RunStatus::BudgetExhausted,
            response: None,
            steps,
        })
    }

    async fn apply_step(
        &self,
        step: Step,
        query: &str,
        steps: &mut Vec<AgentStep>,
    ) -> Transition {
        match step {
            Step::Think { content } => {
                info!("THINK: {content}");
                Transition::Continue
            }
            Step::Observer { content } => {
                // The model is not supposed to produce these itself; log and move on.
                info!("OBSERVER: {content}");
                Transition::Continue
            }
            Step::Action { tool, input } => {
                info!(tool = tool.as_str(), "ACTION: dispatching tool");
                let Some(command) = ToolCommand::decode(&tool, &input) else {
                    warn!(tool = tool.as_str(), "Unknown tool requested by model");
                    return Transition::Feedback(format!("Error: Unknown tool {tool}"));
                };

                let output = command.run(self.options.command_timeout).await;
                debug!(tool = tool.as_str(), output = output.as_str(), "Tool finished");
                steps.push(AgentStep {
                    tool,
                    input,
                    output: output.clone(),
                });
                Transition::Feedback(output)
            }
            Step::Output { content } => {
                if is_web_request(query) {
                    let project_dir = detect_project_directory(query);
                    let validation = validate_project(&project_dir);
                    if !validation.complete {
                        info!(
                            project_dir = project_dir.as_str(),
                            missing = validation.missing.len(),
                            "Project incomplete; converting output into feedback"
                        );
                        return Transition::Feedback(validation.feedback);
                    }
                    info!(project_dir = project_dir.as_str(), "Project validation passed");
                }
                Transition::Finish(content)
            }
        }
    }
}

/// Tool results travel back as observer-tagged protocol messages.
fn observer_payload(content: &str) -> String {
    json!({ "step": "observer", "content": content }).to_string()
}
