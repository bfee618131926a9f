//! Server-rendered single page for the translation form.

use language_assistant_core::form::{Notice, TranslationRequest, TranslationResult};
use language_assistant_core::markup::escape_html;
use language_assistant_core::options::{Language, Politeness, Proficiency};

/// What the page shows. `busy` means a submission holds the form right now.
pub struct PageView<'a> {
    pub app_name: &'a str,
    pub request: &'a TranslationRequest,
    pub busy: bool,
    pub result: Option<&'a TranslationResult>,
    pub notice: Option<Notice>,
}

const STYLE: &str = r#"
body { margin: 0; min-height: 100vh; font-family: system-ui, sans-serif; color: #1a1a1a;
  background: radial-gradient(circle at 22% 11%, rgba(62,180,137,.20), hsla(0,0%,100%,0) 19%),
              radial-gradient(circle at 82% 25%, rgba(33,150,243,.18), hsla(0,0%,100%,0) 35%),
              radial-gradient(circle at 25% 61%, rgba(250,128,114,.28), hsla(0,0%,100%,0) 55%); }
body.dark { background-color: #1a202c; color: #f0f0f0; }
main { display: flex; flex-direction: column; align-items: center; gap: 1em; padding-bottom: 10vh; }
h1 { padding-top: 15vh; margin: 0; font-size: 2.5em; text-align: center;
  background-image: linear-gradient(271.68deg, #EE756A 0.75%, #756AEE 88.52%);
  -webkit-background-clip: text; background-clip: text; color: transparent; }
.tagline { color: #A9A9A9; font-style: italic; text-align: center; margin: 0; }
form { display: flex; flex-direction: column; align-items: center; gap: 1em; width: min(90%, 50em); }
.row { display: flex; align-items: center; gap: 1em; }
input[type=text] { width: 100%; padding: .6em; border: 1px solid #eaeaef; border-radius: 6px;
  box-shadow: rgba(169,169,169,.8) 0 10px 10px -10px; }
button[type=submit] { width: 12em; padding: .7em; border: 0; border-radius: 1em; color: white; cursor: pointer;
  background-image: linear-gradient(144deg, #AF40FF, #5B42F3 50%, #00DDEB);
  box-shadow: #A9A9A9 0 15px 30px -10px; }
button[type=submit]:hover { opacity: .85; }
button[disabled] { opacity: .5; cursor: wait; }
#busy { display: flex; flex-direction: column; gap: 1em; width: min(90%, 20em); }
#busy[hidden] { display: none; }
#busy progress { width: 100%; }
#output { width: min(90%, 50em); padding: 1em; border: 1px solid #eaeaef; border-radius: 8px;
  box-shadow: rgba(169,169,169,.8) 0 10px 10px -10px; }
#theme-toggle { position: fixed; right: 1em; bottom: 1em; }
footer { text-align: center; color: #A9A9A9; padding-bottom: 2em; }
"#;

const SCRIPT: &str = r#"
(function () {
  var busy = document.getElementById('busy');
  var form = document.getElementById('translate-form');
  var submit = form.querySelector('button[type=submit]');
  form.addEventListener('submit', function () {
    busy.hidden = false;
    submit.disabled = true;
    var output = document.getElementById('output');
    if (output) { output.remove(); }
  });
  if (window.EventSource) {
    var events = new EventSource('/api/events');
    events.addEventListener('status_changed', function (e) {
      var state = JSON.parse(e.data).status.state;
      if (state === 'processing') {
        busy.hidden = false;
        submit.disabled = true;
      } else if (document.body.dataset.busy === 'true') {
        window.location.reload();
      }
    });
  }
  document.getElementById('theme-toggle').addEventListener('click', function () {
    document.body.classList.toggle('dark');
  });
})();
"#;

const ARROW_SVG: &str = r#"<svg width="48" height="48" viewBox="0 0 24 24" aria-hidden="true"><path d="M4 12h14m-5-5 5 5-5 5" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round"/></svg>"#;

pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(view.app_name)));
    html.push_str("<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n");
    html.push_str(&format!("<body data-busy=\"{}\">\n<main>\n", view.busy));

    html.push_str("<h1>Language Translator Assistant</h1>\n");
    html.push_str("<p class=\"tagline\">This is more than your average Language Translator!</p>\n");

    let req = view.request;
    html.push_str("<form id=\"translate-form\" method=\"post\" action=\"/translate\">\n");
    html.push_str("<div class=\"row\">\n");
    html.push_str(&select("input_lang", "Input", Language::ALL, req.input_language));
    html.push_str(ARROW_SVG);
    html.push_str(&select("output_lang", "Output", Language::ALL, req.output_language));
    html.push_str("</div>\n<div class=\"row\">\n");
    html.push_str(&select(
        "polite_level",
        "Level of politeness",
        Politeness::ALL,
        req.politeness,
    ));
    html.push_str(&select(
        "proficiency",
        "Vocabulary level",
        Proficiency::ALL,
        req.proficiency,
    ));
    html.push_str("</div>\n");
    html.push_str(&text_input("text", "Text to translate", &req.source_text));
    html.push_str(&text_input(
        "text_opt",
        "Optional instructions.",
        &req.optional_instructions,
    ));
    html.push_str(&format!(
        "<button type=\"submit\"{}>Translate</button>\n</form>\n",
        if view.busy { " disabled" } else { "" }
    ));

    html.push_str(&format!(
        "<div id=\"busy\"{}><progress></progress><progress></progress><progress></progress></div>\n",
        if view.busy { "" } else { " hidden" }
    ));

    if let Some(result) = view.result.filter(|_| !view.busy) {
        html.push_str("<div id=\"output\">");
        html.push_str(&result.display_markup);
        html.push_str("</div>\n");
    }

    html.push_str("</main>\n<footer>Made with &#10084;&#65039; by Kai Kaushik</footer>\n");
    html.push_str("<button id=\"theme-toggle\" type=\"button\" aria-label=\"Toggle color mode\">&#9790;</button>\n");
    html.push_str("<script>");
    html.push_str(SCRIPT);
    if let Some(notice) = &view.notice {
        html.push_str(&format!("window.alert({});\n", js_string(&notice.message)));
    }
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn select<T>(name: &str, label: &str, options: &[T], selected: T) -> String
where
    T: Copy + PartialEq + std::fmt::Display,
{
    let mut out = format!(
        "<select name=\"{name}\" aria-label=\"{}\">",
        escape_html(label)
    );
    for option in options {
        let value = escape_html(&option.to_string());
        let marker = if *option == selected { " selected" } else { "" };
        out.push_str(&format!("<option value=\"{value}\"{marker}>{value}</option>"));
    }
    out.push_str("</select>\n");
    out
}

fn text_input(name: &str, placeholder: &str, value: &str) -> String {
    format!(
        "<input type=\"text\" name=\"{name}\" placeholder=\"{}\" value=\"{}\">\n",
        escape_html(placeholder),
        escape_html(value)
    )
}

/// JSON string literal that is also safe inside a `<script>` element.
fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_owned())
        .replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use language_assistant_core::form::FailureKind;

    fn view<'a>(request: &'a TranslationRequest) -> PageView<'a> {
        PageView {
            app_name: "Language Translator",
            request,
            busy: false,
            result: None,
            notice: None,
        }
    }

    #[test]
    fn selected_options_follow_the_request() {
        let mut request = TranslationRequest::new("Hello");
        request.output_language = Language::MandarinChinese;
        let html = render(&view(&request));
        assert!(html.contains("<option value=\"Mandarin Chinese\" selected>"));
        assert!(html.contains("<option value=\"Workplace Casual\" selected>"));
        assert!(html.contains("value=\"Hello\""));
        assert!(html.contains("<div id=\"busy\" hidden>"));
    }

    #[test]
    fn user_text_is_escaped() {
        let request = TranslationRequest::new("<script>\"x\"</script>");
        let html = render(&view(&request));
        assert!(html.contains("value=\"&lt;script&gt;&quot;x&quot;&lt;/script&gt;\""));
    }

    #[test]
    fn busy_page_hides_result_and_disables_submit() {
        let request = TranslationRequest::default();
        let result = TranslationResult::from_completion("old".to_owned());
        let mut v = view(&request);
        v.busy = true;
        v.result = Some(&result);
        let html = render(&v);
        assert!(html.contains("<body data-busy=\"true\">"));
        assert!(html.contains("<button type=\"submit\" disabled>"));
        assert!(html.contains("<div id=\"busy\"><progress>"));
        assert!(!html.contains("<div id=\"output\">"));
    }

    #[test]
    fn notice_becomes_a_single_alert() {
        let request = TranslationRequest::default();
        let mut v = view(&request);
        v.notice = Some(Notice {
            kind: FailureKind::EmptyInput,
            message: "Please input some text to translate.".to_owned(),
        });
        let html = render(&v);
        assert_eq!(
            html.matches("window.alert(\"Please input some text to translate.\");").count(),
            1
        );
    }

    #[test]
    fn page_ends_with_the_author_footer() {
        let request = TranslationRequest::default();
        let html = render(&view(&request));
        let footer = html.find("<footer>Made with").expect("footer");
        assert!(footer > html.find("</main>").expect("main"));
    }

    #[test]
    fn js_string_cannot_close_the_script_element() {
        assert_eq!(js_string("</script>"), "\"\\u003c/script>\"");
    }
}
