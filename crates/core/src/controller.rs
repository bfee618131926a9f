use crate::completion::{ChatRequest, CompletionClient, CompletionError};
use crate::config::{ApiKey, CompletionConfig, ModelName, ENV_OPENAI_KEY};
use crate::form::{FailureKind, FormState, Notice, TranslationRequest, TranslationResult, UiStatus};
use crate::prompt::build_prompt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const LOG_TARGET: &str = "controller";
const EVENT_CAPACITY: usize = 32;

pub const EMPTY_INPUT_MESSAGE: &str = "Please input some text to translate.";
pub const EXECUTION_ERROR_MESSAGE: &str = "Error with the translation service. Please try again.";

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("source text is empty")]
    EmptyInput,

    #[error("completion api credential is not configured")]
    MissingCredential,

    #[error("completion api call failed: {0}")]
    ExternalService(#[from] CompletionError),
}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::EmptyInput => FailureKind::EmptyInput,
            SubmitError::MissingCredential => FailureKind::Configuration,
            SubmitError::ExternalService(_) => FailureKind::Execution,
        }
    }

    /// The notification shown to the user. External failures are reported
    /// generically; the cause only goes to the log.
    pub fn notice(&self) -> Notice {
        let message = match self {
            SubmitError::EmptyInput => EMPTY_INPUT_MESSAGE.to_owned(),
            SubmitError::MissingCredential => format!(
                "The translation service is not configured. Set the {ENV_OPENAI_KEY} environment \
                 variable or the api_key entry of the config file."
            ),
            SubmitError::ExternalService(_) => EXECUTION_ERROR_MESSAGE.to_owned(),
        };
        Notice {
            kind: self.kind(),
            message,
        }
    }
}

/// Published on every state change so views can re-render without polling.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    StatusChanged { status: UiStatus },
    Notification { notice: Notice },
}

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub model: ModelName,
    pub credential: Option<ApiKey>,
}

impl ControllerConfig {
    pub fn from_completion(cfg: &CompletionConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            credential: cfg.api_key.clone(),
        }
    }
}

pub struct Controller {
    config: ControllerConfig,
    client: Box<dyn CompletionClient>,
    events: broadcast::Sender<FormEvent>,
}

impl Controller {
    pub fn new(config: ControllerConfig, client: impl CompletionClient + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            client: Box::new(client),
            events,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.config.credential.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// Runs one submission: `Processing`, then `Done` or `Failed`. At most
    /// one completion call is made and it is never retried. On failure the
    /// previous result is kept as it was.
    pub async fn submit(&self, form: &mut FormState) -> Result<(), SubmitError> {
        form.clear_notice();
        self.transition(form, UiStatus::Processing);

        match self.run(form.request().clone()).await {
            Ok(text) => {
                form.store_result(TranslationResult::from_completion(text));
                self.transition(form, UiStatus::Done);
                Ok(())
            }
            Err(err) => {
                match &err {
                    SubmitError::ExternalService(cause) => {
                        tracing::warn!(target: LOG_TARGET, error = %cause, "completion call failed");
                    }
                    other => {
                        tracing::info!(target: LOG_TARGET, reason = %other, "submission rejected");
                    }
                }
                self.transition(form, UiStatus::Failed(err.kind()));
                let notice = err.notice();
                form.raise_notice(notice.clone());
                self.publish(FormEvent::Notification { notice });
                Err(err)
            }
        }
    }

    async fn run(&self, request: TranslationRequest) -> Result<String, SubmitError> {
        if !request.has_source_text() {
            return Err(SubmitError::EmptyInput);
        }
        let credential = self
            .config
            .credential
            .clone()
            .ok_or(SubmitError::MissingCredential)?;

        let prompt = build_prompt(&request);
        tracing::debug!(
            target: LOG_TARGET,
            output_language = %request.output_language,
            politeness = %request.politeness,
            prompt_len = prompt.len(),
            "prompt built"
        );

        let chat = ChatRequest::single_user(self.config.model.clone(), prompt);
        let text = self.client.complete(credential, chat).await?;
        tracing::info!(target: LOG_TARGET, response_len = text.len(), "completion received");
        Ok(text)
    }

    fn transition(&self, form: &mut FormState, status: UiStatus) {
        form.set_status(status);
        self.publish(FormEvent::StatusChanged { status });
    }

    fn publish(&self, event: FormEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
