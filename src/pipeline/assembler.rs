//! Document assembly: wraps synthesized markup in the fixed document shell.
//!
//! Pure and deterministic. The shell carries no timestamp, so identical input always
//! yields byte-identical output.

use crate::pipeline::types::{AssembledDocument, SectionFragment};
use serde::{Deserialize, Serialize};

/// Static head/metadata/behavior scaffold around every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShell {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Scripts loaded in `<head>`; also the allowlist for the external-script rule.
    #[serde(default = "default_head_scripts")]
    pub head_scripts: Vec<String>,
    #[serde(default = "default_body_class")]
    pub body_class: String,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_title() -> String {
    "Welcome".to_string()
}

fn default_head_scripts() -> Vec<String> {
    vec!["https://cdn.tailwindcss.com".to_string()]
}

fn default_body_class() -> String {
    "bg-white text-gray-900 antialiased".to_string()
}

impl Default for DocumentShell {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            title: default_title(),
            head_scripts: default_head_scripts(),
            body_class: default_body_class(),
        }
    }
}

const BEHAVIOR_SCRIPT: &str = r##"<script>
document.querySelectorAll('[data-menu-toggle]').forEach(function (button) {
  button.addEventListener('click', function () {
    var target = document.getElementById(button.getAttribute('data-menu-toggle'));
    if (target) { target.classList.toggle('hidden'); }
  });
});
document.querySelectorAll('a[href^="#"]').forEach(function (link) {
  link.addEventListener('click', function (event) {
    var target = document.querySelector(link.getAttribute('href'));
    if (target) { event.preventDefault(); target.scrollIntoView({ behavior: 'smooth' }); }
  });
});
</script>"##;

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    shell: DocumentShell,
}

impl Assembler {
    pub fn new(shell: DocumentShell) -> Self {
        Self { shell }
    }

    /// Structured mode: fragments in plan order. Content is inserted as given; the
    /// synthesizer has already removed any code fence.
    pub fn assemble_fragments(&self, fragments: &[SectionFragment]) -> AssembledDocument {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(&format!(
                "<!-- section: {} / {} -->\n",
                fragment.role, fragment.variant
            ));
            body.push_str(fragment.content.trim());
            body.push('\n');
        }
        self.wrap(body.trim_end())
    }

    /// Direct mode: a whole document (or bare body markup) from one call.
    pub fn assemble_direct(&self, raw_document: &str) -> AssembledDocument {
        self.wrap(extract_body(strip_code_fences(raw_document)))
    }

    fn wrap(&self, body: &str) -> AssembledDocument {
        let mut out = String::with_capacity(body.len() + 1024);
        out.push_str("<!DOCTYPE html>\n");
        out.push_str(&format!("<html lang=\"{}\">\n", escape_html(&self.shell.lang)));
        out.push_str("<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        out.push_str("<meta name=\"generator\" content=\"sitesmith\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape_html(&self.shell.title)));
        for script in &self.shell.head_scripts {
            out.push_str(&format!("<script src=\"{}\"></script>\n", escape_html(script)));
        }
        out.push_str("<style>html { scroll-behavior: smooth; }</style>\n");
        out.push_str("</head>\n");
        out.push_str(&format!(
            "<body class=\"{}\">\n<main>\n",
            escape_html(&self.shell.body_class)
        ));
        out.push_str(body);
        out.push_str("\n</main>\n");
        out.push_str(BEHAVIOR_SCRIPT);
        out.push_str("\n</body>\n</html>\n");
        AssembledDocument::new(out)
    }
}

/// Remove a Markdown code fence wrapped around model output.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None if open == 0 => body.trim(),
        None => trimmed[..open].trim(),
    }
}

/// Inner markup of `<body>`, or the input without `<html>`/`<head>` scaffolding.
fn extract_body(document: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with `document`.
    let lower = document.to_ascii_lowercase();

    if let Some(open) = lower.find("<body") {
        if let Some(tag_len) = lower[open..].find('>') {
            let start = open + tag_len + 1;
            let end = lower[start..]
                .find("</body>")
                .map(|i| start + i)
                .unwrap_or(document.len());
            return document[start..end].trim();
        }
    }

    if let Some(html_open) = lower.find("<html") {
        let start = match lower.find("</head>") {
            Some(head_close) => head_close + "</head>".len(),
            None => lower[html_open..]
                .find('>')
                .map(|i| html_open + i + 1)
                .unwrap_or(document.len()),
        };
        let end = lower[start..]
            .find("</html>")
            .map(|i| start + i)
            .unwrap_or(document.len());
        return document[start..end].trim();
    }

    document.trim()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
