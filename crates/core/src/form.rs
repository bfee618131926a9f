use crate::markup::to_display_markup;
use crate::options::{Language, Politeness, Proficiency};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of everything the user filled in on the form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_text: String,
    #[serde(default)]
    pub optional_instructions: String,
    #[serde(default)]
    pub input_language: Language,
    #[serde(default = "default_output_language")]
    pub output_language: Language,
    #[serde(default)]
    pub politeness: Politeness,
    #[serde(default)]
    pub proficiency: Proficiency,
}

fn default_output_language() -> Language {
    Language::Japanese
}

impl Default for TranslationRequest {
    fn default() -> Self {
        Self {
            source_text: String::new(),
            optional_instructions: String::new(),
            input_language: Language::default(),
            output_language: default_output_language(),
            politeness: Politeness::default(),
            proficiency: Proficiency::default(),
        }
    }
}

impl TranslationRequest {
    pub fn new<S: Into<String>>(source_text: S) -> Self {
        Self {
            source_text: source_text.into(),
            ..Default::default()
        }
    }

    /// Source text as it goes into the prompt.
    pub fn trimmed_source(&self) -> &str {
        self.source_text.trim()
    }

    pub fn has_source_text(&self) -> bool {
        !self.trimmed_source().is_empty()
    }
}

/// Output of one successful submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationResult {
    /// Model output exactly as returned.
    pub raw_response_text: String,
    /// Same text, HTML-escaped, with every line break turned into `<br/>`.
    pub display_markup: String,
}

impl TranslationResult {
    pub fn from_completion(text: String) -> Self {
        let display_markup = to_display_markup(&text);
        Self {
            raw_response_text: text,
            display_markup,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    EmptyInput,
    Configuration,
    Execution,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::EmptyInput => "empty input",
            FailureKind::Configuration => "configuration error",
            FailureKind::Execution => "execution error",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum UiStatus {
    #[default]
    Idle,
    Processing,
    Done,
    Failed(FailureKind),
}

/// User-visible notification raised by a failed submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: FailureKind,
    pub message: String,
}

/// The single session's form. Request fields are freely writable; status,
/// result and notice only change through [`crate::controller::Controller`].
#[derive(Clone, Debug, Default)]
pub struct FormState {
    request: TranslationRequest,
    status: UiStatus,
    result: Option<TranslationResult>,
    notice: Option<Notice>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source_text<S: Into<String>>(&mut self, text: S) {
        self.request.source_text = text.into();
    }

    pub fn set_optional_instructions<S: Into<String>>(&mut self, text: S) {
        self.request.optional_instructions = text.into();
    }

    pub fn set_input_language(&mut self, language: Language) {
        self.request.input_language = language;
    }

    pub fn set_output_language(&mut self, language: Language) {
        self.request.output_language = language;
    }

    pub fn set_politeness(&mut self, politeness: Politeness) {
        self.request.politeness = politeness;
    }

    pub fn set_proficiency(&mut self, proficiency: Proficiency) {
        self.request.proficiency = proficiency;
    }

    /// Replaces every request field at once.
    pub fn apply(&mut self, request: TranslationRequest) {
        self.request = request;
    }

    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn status(&self) -> UiStatus {
        self.status
    }

    pub fn is_processing(&self) -> bool {
        self.status == UiStatus::Processing
    }

    pub fn is_done(&self) -> bool {
        self.status == UiStatus::Done
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        self.result.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Hands the pending notice to the view exactly once.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub(crate) fn set_status(&mut self, status: UiStatus) {
        self.status = status;
    }

    pub(crate) fn store_result(&mut self, result: TranslationResult) {
        self.result = Some(result);
    }

    pub(crate) fn raise_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub(crate) fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            request: self.request.clone(),
            status: self.status,
            processing: self.is_processing(),
            done: self.is_done(),
            result: self.result.clone(),
            notice: self.notice.clone(),
        }
    }
}

/// Serializable view of [`FormState`] for JSON consumers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormSnapshot {
    pub request: TranslationRequest,
    pub status: UiStatus,
    pub processing: bool,
    pub done: bool,
    pub result: Option<TranslationResult>,
    pub notice: Option<Notice>,
}
