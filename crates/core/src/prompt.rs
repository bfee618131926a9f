//! Prompt templates for the completion API.
//!
//! The template is chosen by the output language's script. The model's answer
//! is shown verbatim, so nothing here is ever parsed back; the labels only
//! steer the model towards a stable layout.

use crate::form::TranslationRequest;
use crate::options::Script;

/// Separator the model is asked to put between glossary entries.
pub const GLOSSARY_DELIMITER: &str = "|";

/// Builds the single user message sent to the completion API. Pure: equal
/// requests always yield byte-identical prompts.
pub fn build_prompt(request: &TranslationRequest) -> String {
    let source = request.trimmed_source();
    let input = request.input_language.label();
    let output = request.output_language.label();
    let politeness = request.politeness.label();

    let mut prompt = format!(
        "You are a helpful {output} Translator. \
         Please Translate the sentence '{source}' from {input} to {politeness} {output} \
         and provide me with the word definitions of {threshold}. ",
        threshold = glossary_threshold(request),
    );

    prompt.push_str("The output should very strictly be in the following format: '");
    prompt.push_str(&format!(
        "Translated Sentence in {politeness} {output}: <{}>",
        sentence_placeholder(request)
    ));
    if let Some(reading) = reading_line(request) {
        prompt.push('\n');
        prompt.push_str(&reading);
    }
    prompt.push_str("'. ");

    prompt.push_str(&format!(
        "Give the {input} definitions for the hard {output} words used, \
         separating entries with '{delim}', and the output should very strictly be in the following format: \
         '{header}:\n{entry}{delim}{entry}'",
        header = glossary_header(request),
        entry = glossary_entry(request),
        delim = GLOSSARY_DELIMITER,
    ));

    let extra = request.optional_instructions.trim();
    if !extra.is_empty() {
        prompt.push_str(" Additional instructions: ");
        prompt.push_str(extra);
    }

    prompt
}

fn glossary_threshold(request: &TranslationRequest) -> String {
    let output = request.output_language.label();
    match request.output_language.script() {
        Script::Japanese => format!(
            "all the Japanese words used which are {} proficiency level and above",
            request.proficiency.jlpt_level()
        ),
        Script::Transliterated | Script::Latin => format!(
            "all the hard {output} words used that a learner at {} level would not know",
            request.proficiency.label()
        ),
    }
}

fn sentence_placeholder(request: &TranslationRequest) -> String {
    match request.output_language.script() {
        Script::Japanese => "Translated Sentence in Kanji".to_owned(),
        Script::Transliterated | Script::Latin => {
            format!("Translated Sentence in {}", request.output_language.label())
        }
    }
}

fn reading_line(request: &TranslationRequest) -> Option<String> {
    let input = request.input_language.label();
    match request.output_language.script() {
        Script::Japanese => Some(
            "Translated Sentence In Romaji: <Translated Sentence in Romaji>".to_owned(),
        ),
        Script::Transliterated => Some(format!(
            "Translated Sentence In {input} characters: <Translated Sentence written with {input} characters>"
        )),
        Script::Latin => None,
    }
}

fn glossary_header(request: &TranslationRequest) -> String {
    format!(
        "The {} definitions for hard {} words used",
        request.input_language.label(),
        request.output_language.label()
    )
}

fn glossary_entry(request: &TranslationRequest) -> String {
    let input = request.input_language.label();
    let output = request.output_language.label();
    match request.output_language.script() {
        Script::Japanese => format!("<Japanese Word in Kanji> (<Written in Romaji>): <{input} Definition>"),
        Script::Transliterated => {
            format!("<{output} Word> (<Written with {input} characters>): <{input} Definition>")
        }
        Script::Latin => format!("<{output} Word> (<Pronunciation>): <{input} Definition>"),
    }
}
