use language_assistant_core::controller::Controller;
use language_assistant_core::form::{FormState, TranslationRequest};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Shared by every request handler. There is one form, so one session.
#[derive(Clone)]
pub struct AppState {
    pub app_name: Arc<str>,
    pub form: Arc<Mutex<FormState>>,
    pub controller: Arc<Controller>,
    in_flight: Arc<watch::Sender<Option<TranslationRequest>>>,
}

impl AppState {
    pub fn new(app_name: &str, controller: Controller) -> Self {
        let (in_flight, _) = watch::channel(None);
        Self {
            app_name: Arc::from(app_name),
            form: Arc::new(Mutex::new(FormState::new())),
            controller: Arc::new(controller),
            in_flight: Arc::new(in_flight),
        }
    }

    /// Marks a submission as running. Returns `None` if one already is.
    pub fn claim(&self, request: &TranslationRequest) -> Option<InFlight> {
        let claimed = self.in_flight.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(request.clone());
            true
        });
        claimed.then(|| InFlight {
            slot: self.in_flight.clone(),
        })
    }

    /// The request being translated right now, if any.
    pub fn in_flight(&self) -> Option<TranslationRequest> {
        self.in_flight.borrow().clone()
    }
}

/// Held for the lifetime of one submission; dropping it frees the slot.
pub struct InFlight {
    slot: Arc<watch::Sender<Option<TranslationRequest>>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.slot.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use language_assistant_core::completion::OpenAiCompletionClient;
    use language_assistant_core::config::parse_base_url;
    use language_assistant_core::controller::ControllerConfig;

    fn state() -> AppState {
        let config = ControllerConfig {
            model: Default::default(),
            credential: None,
        };
        let client =
            OpenAiCompletionClient::new(parse_base_url("http://127.0.0.1:9").expect("literal url"));
        AppState::new("Language Translator", Controller::new(config, client))
    }

    #[test]
    fn only_one_claim_at_a_time() {
        let state = state();
        let request = TranslationRequest::new("Hello");

        let first = state.claim(&request).expect("free slot");
        assert!(state.claim(&request).is_none());
        assert_eq!(state.in_flight(), Some(request.clone()));

        drop(first);
        assert_eq!(state.in_flight(), None);
        assert!(state.claim(&request).is_some());
    }
}
