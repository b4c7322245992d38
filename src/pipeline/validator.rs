//! Document validation: structural well-formedness plus pluggable policy rules.
//!
//! Pure over the document text. Errors drive the retry ladder; warnings are passed
//! through to the caller untouched.

use crate::pipeline::types::{IssueCategory, ValidationIssue, ValidationResult};

/// Output of one policy rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Injectable policy rule. Implementations must not perform I/O.
pub trait PolicyRule: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, document: &str) -> RuleReport;
}

pub struct Validator {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl Validator {
    /// Structural checks only.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: Box<dyn PolicyRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Structural checks plus the built-in policy rules.
    pub fn with_default_rules(allowed_script_prefixes: Vec<String>, max_document_bytes: usize) -> Self {
        Self::new()
            .with_rule(Box::new(ExternalScriptRule::new(allowed_script_prefixes)))
            .with_rule(Box::new(DocumentSizeRule::new(max_document_bytes)))
            .with_rule(Box::new(PlaceholderTextRule))
            .with_rule(Box::new(ImageAltRule))
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn validate(&self, document: &str) -> ValidationResult {
        let mut report = check_structure(document);
        for rule in &self.rules {
            let RuleReport { errors, warnings } = rule.check(document);
            report.errors.extend(errors);
            report.warnings.extend(warnings);
        }
        ValidationResult::from_issues(report.errors, report.warnings)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_structure(document: &str) -> RuleReport {
    let mut report = RuleReport::default();
    let lower = document.to_ascii_lowercase();

    if !lower.trim_start().starts_with("<!doctype html") {
        report.errors.push(ValidationIssue::new(
            IssueCategory::Structure,
            "missing_doctype",
            "Document does not start with <!DOCTYPE html>",
        ));
    }
    for tag in ["html", "head", "body"] {
        if find_tags(&lower, tag).is_empty() {
            report.errors.push(ValidationIssue::new(
                IssueCategory::Structure,
                "missing_element",
                format!("Document has no <{}> element", tag),
            ));
        } else if !lower.contains(&format!("</{}>", tag)) {
            report.errors.push(ValidationIssue::new(
                IssueCategory::Structure,
                "unclosed_element",
                format!("<{}> is never closed", tag),
            ));
        }
    }
    if find_tags(&lower, "title").is_empty() {
        report.warnings.push(ValidationIssue::new(
            IssueCategory::Structure,
            "missing_title",
            "Document has no <title>",
        ));
    }

    for tag in ["html", "head", "body"] {
        let count = find_tags(&lower, tag).len();
        if count > 1 {
            report.errors.push(ValidationIssue::new(
                IssueCategory::Structure,
                "duplicate_element",
                format!("<{}> appears {} times", tag, count),
            ));
        }
    }

    let opened = find_tags(&lower, "section").len();
    let closed = lower.matches("</section>").count();
    if opened != closed {
        report.errors.push(ValidationIssue::new(
            IssueCategory::Structure,
            "unbalanced_section",
            format!("{} <section> tags opened but {} closed", opened, closed),
        ));
    }

    if document.contains("```") {
        report.errors.push(ValidationIssue::new(
            IssueCategory::Content,
            "code_fence",
            "Document contains a leftover Markdown code fence",
        ));
    }

    if visible_text(body_slice(&lower)).trim().is_empty() {
        report.errors.push(ValidationIssue::new(
            IssueCategory::Content,
            "empty_body",
            "Document body has no visible content",
        ));
    }

    report
}

/// Rejects `<script src>` outside the allowlist.
pub struct ExternalScriptRule {
    allowed_prefixes: Vec<String>,
}

impl ExternalScriptRule {
    pub fn new(allowed_prefixes: Vec<String>) -> Self {
        Self { allowed_prefixes }
    }
}

impl PolicyRule for ExternalScriptRule {
    fn name(&self) -> &str {
        "external_script"
    }

    fn check(&self, document: &str) -> RuleReport {
        let mut report = RuleReport::default();
        let lower = document.to_ascii_lowercase();
        for (start, end) in find_tags(&lower, "script") {
            let Some(src) = attribute_value(&document[start..end], "src") else {
                continue;
            };
            if !self
                .allowed_prefixes
                .iter()
                .any(|prefix| source_matches(src, prefix))
            {
                report.errors.push(ValidationIssue::new(
                    IssueCategory::Policy,
                    "external_script",
                    format!("Script source '{}' is not allowed", src),
                ));
            }
        }
        report
    }
}

/// `src` equals `prefix` or continues it at a path, query or fragment boundary, so
/// `https://cdn.example.com` does not admit `https://cdn.example.com.evil.io`.
fn source_matches(src: &str, prefix: &str) -> bool {
    let Some(rest) = src.strip_prefix(prefix) else {
        return false;
    };
    rest.is_empty()
        || prefix.ends_with(['/', '?', '#'])
        || rest.starts_with(['/', '?', '#'])
}

/// Rejects documents above a byte budget.
pub struct DocumentSizeRule {
    max_bytes: usize,
}

impl DocumentSizeRule {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl PolicyRule for DocumentSizeRule {
    fn name(&self) -> &str {
        "document_size"
    }

    fn check(&self, document: &str) -> RuleReport {
        let mut report = RuleReport::default();
        if document.len() > self.max_bytes {
            report.errors.push(ValidationIssue::new(
                IssueCategory::Policy,
                "document_too_large",
                format!(
                    "Document is {} bytes, limit is {}",
                    document.len(),
                    self.max_bytes
                ),
            ));
        }
        report
    }
}

const PLACEHOLDER_MARKERS: &[&str] = &["lorem ipsum", "[your ", "placeholder text", "insert text here"];

/// Warns about copy that was obviously never filled in.
pub struct PlaceholderTextRule;

impl PolicyRule for PlaceholderTextRule {
    fn name(&self) -> &str {
        "placeholder_text"
    }

    fn check(&self, document: &str) -> RuleReport {
        let mut report = RuleReport::default();
        let text = visible_text(&document.to_ascii_lowercase());
        for marker in PLACEHOLDER_MARKERS {
            if text.contains(marker) {
                report.warnings.push(ValidationIssue::new(
                    IssueCategory::Content,
                    "placeholder_text",
                    format!("Document contains placeholder copy ('{}')", marker.trim()),
                ));
            }
        }
        report
    }
}

/// Warns about images without an `alt` attribute.
pub struct ImageAltRule;

impl PolicyRule for ImageAltRule {
    fn name(&self) -> &str {
        "image_alt"
    }

    fn check(&self, document: &str) -> RuleReport {
        let mut report = RuleReport::default();
        let lower = document.to_ascii_lowercase();
        let missing = find_tags(&lower, "img")
            .into_iter()
            .filter(|&(start, end)| attribute_value(&lower[start..end], "alt").is_none())
            .count();
        if missing > 0 {
            report.warnings.push(ValidationIssue::new(
                IssueCategory::Accessibility,
                "image_alt",
                format!("{} image(s) without alt text", missing),
            ));
        }
        report
    }
}

/// Byte ranges of every opening `<name ...>` tag in an already-lowercased document.
fn find_tags(lower: &str, name: &str) -> Vec<(usize, usize)> {
    let needle = format!("<{}", name);
    let mut tags = Vec::new();
    let mut offset = 0;
    while let Some(found) = lower[offset..].find(&needle) {
        let start = offset + found;
        let after = start + needle.len();
        let boundary = lower[after..].chars().next();
        offset = after;
        if !matches!(boundary, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            continue;
        }
        let end = lower[after..]
            .find('>')
            .map(|i| after + i + 1)
            .unwrap_or(lower.len());
        tags.push((start, end));
    }
    tags
}

/// Value of `name="..."`, `name='...'` or bare `name=value` inside one tag.
fn attribute_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=", name);
    let mut search_from = 0;
    let position = loop {
        let found = search_from + lower[search_from..].find(&needle)?;
        let preceded_by_space = lower[..found]
            .chars()
            .next_back()
            .map_or(false, char::is_whitespace);
        if preceded_by_space {
            break found;
        }
        search_from = found + needle.len();
    };
    let rest = &tag[position + needle.len()..];
    match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &rest[1..];
            inner.find(quote).map(|end| &inner[..end])
        }
        Some(_) => rest
            .split(|c: char| c.is_whitespace() || c == '>')
            .next()
            .filter(|value| !value.is_empty()),
        None => None,
    }
}

fn body_slice(lower: &str) -> &str {
    let start = lower
        .find("<body")
        .and_then(|open| lower[open..].find('>').map(|i| open + i + 1));
    match start {
        Some(start) => {
            let end = lower[start..]
                .find("</body>")
                .map(|i| start + i)
                .unwrap_or(lower.len());
            &lower[start..end]
        }
        None => "",
    }
}

/// Text outside of tags, with `<script>`/`<style>` contents removed.
fn visible_text(lower: &str) -> String {
    let mut text = String::new();
    let mut rest = lower;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        rest = &rest[open..];
        let skip_until = if rest.starts_with("<script") {
            Some("</script>")
        } else if rest.starts_with("<style") {
            Some("</style>")
        } else {
            None
        };
        rest = match skip_until {
            Some(close) => rest.find(close).map_or("", |i| &rest[i + close.len()..]),
            None => rest.find('>').map_or("", |i| &rest[i + 1..]),
        };
        text.push(' ');
    }
    text.push_str(rest);
    text
}
