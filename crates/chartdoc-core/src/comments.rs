//! Documentation comments in values files
//!
//! `serde_yaml` drops comments, so the source text is scanned separately and
//! every comment block is attached to the key path that follows it:
//!
//! ```yaml
//! image:
//!   # -- (string) Image tag, defaults to the chart appVersion
//!   # @default -- `.Chart.AppVersion`
//!   tag: ""
//! ```
//!
//! produces an [`Annotation`] for `image.tag`. Sequence items are addressed
//! by index (`ingress.hosts[0].host`) and keys that need it are quoted
//! (`podAnnotations."prometheus.io/scrape"`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// `(type) rest of the line`
static TYPE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([^)]+)\)\s*(.*)$").expect("valid regex"));

/// Old-style `# some.key.path -- description` anywhere in the file
static LEGACY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([A-Za-z0-9_"][A-Za-z0-9_.\-\[\]/"]*)\s+--\s?(.*)$"#).expect("valid regex")
});

/// YAML merge key, `<<: *anchor`
const MERGE_KEY: &str = "<<";

/// Documentation attached to a single key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Description text (joined continuation lines)
    pub description: String,

    /// Explicit type from `(type)` or `@notationType`
    pub value_type: Option<String>,

    /// Explicit default from `@default -- ...`
    pub default: Option<String>,

    /// Section name from `@section -- ...`
    pub section: Option<String>,

    /// Keep line breaks in the description
    pub raw: bool,

    /// Drop the key and its subtree from the documentation
    pub ignored: bool,
}

impl Annotation {
    /// Whether the key carries a description
    pub fn is_documented(&self) -> bool {
        !self.description.is_empty()
    }

    /// Parse a comment block (text after each leading `#`)
    ///
    /// Returns `None` when the block holds neither a `--` description nor any
    /// `@` directive.
    pub fn parse_block(lines: &[String]) -> Option<Self> {
        let mut annotation = Self::default();
        let mut description_lines: Vec<String> = Vec::new();
        let mut started = false;
        let mut found = false;

        for line in lines {
            let trimmed = line.trim();

            if !started && (trimmed == "--" || trimmed.starts_with("-- ")) {
                started = true;
                found = true;
                let rest = trimmed[2..].trim_start();
                let rest = match TYPE_PREFIX.captures(rest) {
                    Some(caps) => {
                        annotation.value_type = Some(caps[1].trim().to_string());
                        caps.get(2).map_or("", |m| m.as_str())
                    }
                    None => rest,
                };
                if !rest.is_empty() {
                    description_lines.push(rest.to_string());
                }
                continue;
            }

            if let Some(directive) = trimmed.strip_prefix('@') {
                found = true;
                annotation.apply_directive(directive);
                continue;
            }

            if started {
                // Strip the single space after `#`, keep the rest for @raw
                let content = line.strip_prefix(' ').unwrap_or(line);
                description_lines.push(content.trim_end().to_string());
            }
        }

        if !found {
            return None;
        }

        annotation.description = if annotation.raw {
            description_lines.join("\n").trim().to_string()
        } else {
            description_lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        };

        Some(annotation)
    }

    fn apply_directive(&mut self, directive: &str) {
        let (name, argument) = match directive.split_once("--") {
            Some((name, arg)) => (name.trim(), Some(arg.trim().to_string())),
            None => (directive.trim(), None),
        };

        match name {
            "raw" => self.raw = true,
            "ignored" | "ignore" => self.ignored = true,
            "default" => self.default = argument,
            "section" => self.section = argument.filter(|s| !s.is_empty()),
            "notationType" => self.value_type = argument.filter(|s| !s.is_empty()),
            other => tracing::debug!("Ignoring unknown comment directive @{}", other),
        }
    }

    /// Overlay another annotation on top of this one
    fn absorb(&mut self, other: Annotation) {
        if other.is_documented() {
            self.description = other.description;
            self.raw = other.raw;
        }
        if other.value_type.is_some() {
            self.value_type = other.value_type;
        }
        if other.default.is_some() {
            self.default = other.default;
        }
        if other.section.is_some() {
            self.section = other.section;
        }
        self.ignored |= other.ignored;
    }
}

/// Annotations keyed by value path
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    entries: HashMap<String, Annotation>,
}

impl CommentIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan YAML source text
    pub fn scan(source: &str) -> Self {
        Scanner::default().run(source)
    }

    /// Look up the annotation for a path
    pub fn get(&self, path: &str) -> Option<&Annotation> {
        self.entries.get(path)
    }

    /// Add or overlay an annotation
    pub fn insert(&mut self, path: String, annotation: Annotation) {
        match self.entries.get_mut(&path) {
            Some(existing) => existing.absorb(annotation),
            None => {
                self.entries.insert(path, annotation);
            }
        }
    }

    /// Merge another index into this one; `other` wins on conflicts
    pub fn extend(&mut self, other: CommentIndex) {
        for (path, annotation) in other.entries {
            self.insert(path, annotation);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append a mapping key to a value path, quoting it when needed
pub fn push_key(prefix: &str, key: &str) -> String {
    let needs_quotes = key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'));

    let segment = if needs_quotes {
        format!("\"{}\"", key.replace('"', "\\\""))
    } else {
        key.to_string()
    };

    if prefix.is_empty() {
        segment
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Append a sequence index to a value path
pub fn push_index(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

#[derive(Debug)]
struct Frame {
    indent: usize,
    path: String,
    next_index: usize,
    is_item: bool,
}

#[derive(Debug, Default)]
struct Scanner {
    index: CommentIndex,
    stack: Vec<Frame>,
    pending: Vec<String>,
    root_items: usize,
    skip_deeper_than: Option<usize>,
}

impl Scanner {
    fn run(mut self, source: &str) -> CommentIndex {
        for line in source.lines() {
            self.line(line);
        }
        self.index
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.pending.clear();
        self.root_items = 0;
        self.skip_deeper_than = None;
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(limit) = self.skip_deeper_than {
            if trimmed.is_empty() || indent > limit {
                return;
            }
            self.skip_deeper_than = None;
        }

        if trimmed.is_empty() {
            self.pending.clear();
            return;
        }

        if trimmed == "---" || trimmed.starts_with("--- ") || trimmed == "..." {
            self.reset();
            return;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            self.comment(comment);
            return;
        }

        self.content(trimmed, indent);
        self.pending.clear();
    }

    fn comment(&mut self, text: &str) {
        if self.block_open() {
            self.pending.push(text.to_string());
            return;
        }
        if let Some(caps) = LEGACY_LINE.captures(text) {
            let mut annotation = Annotation::parse_block(&[format!(
                "-- {}",
                caps.get(2).map_or("", |m| m.as_str())
            )])
            .unwrap_or_default();
            annotation.raw = false;
            self.index.insert(caps[1].to_string(), annotation);
            return;
        }
        self.pending.push(text.to_string());
    }

    /// Whether the pending comments already started a `# --` block
    fn block_open(&self) -> bool {
        self.pending.iter().any(|line| {
            let trimmed = line.trim();
            trimmed == "--" || trimmed.starts_with("-- ")
        })
    }

    fn content(&mut self, content: &str, indent: usize) {
        let (content, key_indent) = if content == "-" || content.starts_with("- ") {
            // A block above `- key: v` documents the item, not its first key
            let item_path = self.open_item(indent);
            self.attach(&item_path);
            let rest = content[1..].trim_start();
            let offset = content.len() - rest.len();

            if rest.is_empty() || rest.starts_with('#') || split_key(rest).is_none() {
                if starts_block_scalar(rest) {
                    self.skip_deeper_than = Some(indent);
                }
                return;
            }
            (rest, indent + offset)
        } else {
            (content, indent)
        };

        let Some((key, value)) = split_key(content) else {
            return;
        };

        while self
            .stack
            .last()
            .is_some_and(|frame| frame.indent >= key_indent)
        {
            self.stack.pop();
        }

        let parent = self.stack.last().map_or("", |f| f.path.as_str());
        let path = if key == MERGE_KEY {
            // Merged keys belong to the enclosing mapping
            let path = parent.to_string();
            self.pending.clear();
            path
        } else {
            let path = push_key(parent, &key);
            self.attach(&path);
            path
        };

        if has_inline_value(value) {
            // Continuation lines of a plain or block scalar are not keys
            self.skip_deeper_than = Some(key_indent);
        }

        self.stack.push(Frame {
            indent: key_indent,
            path,
            next_index: 0,
            is_item: false,
        });
    }

    /// Register a `- ` sequence item and return its path
    fn open_item(&mut self, indent: usize) -> String {
        while self.stack.last().is_some_and(|frame| {
            frame.indent > indent || (frame.indent == indent && frame.is_item)
        }) {
            self.stack.pop();
        }

        let path = match self.stack.last_mut() {
            Some(parent) => {
                let path = push_index(&parent.path, parent.next_index);
                parent.next_index += 1;
                path
            }
            None => {
                let path = push_index("", self.root_items);
                self.root_items += 1;
                path
            }
        };

        self.stack.push(Frame {
            indent,
            path: path.clone(),
            next_index: 0,
            is_item: true,
        });
        path
    }

    fn attach(&mut self, path: &str) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(annotation) = Annotation::parse_block(&self.pending) {
            self.index.insert(path.to_string(), annotation);
        }
        self.pending.clear();
    }
}

/// Split `key: value` into the unquoted key and the raw value text
fn split_key(content: &str) -> Option<(String, &str)> {
    let first = content.chars().next()?;

    if first == '"' || first == '\'' {
        let (key, consumed) = read_quoted(content, first)?;
        let rest = content[consumed..].trim_start();
        let value = rest.strip_prefix(':')?;
        if !value.is_empty() && !value.starts_with([' ', '\t']) {
            return None;
        }
        return Some((key, value));
    }

    if matches!(first, '{' | '[' | '?' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`') {
        return None;
    }

    let bytes = content.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && i > 0 && bytes[i - 1] == b' ' {
            return None;
        }
        if b == b':' && (i + 1 == bytes.len() || matches!(bytes[i + 1], b' ' | b'\t')) {
            let key = content[..i].trim_end();
            if key.is_empty() {
                return None;
            }
            return Some((key.to_string(), &content[i + 1..]));
        }
    }
    None
}

/// Read a quoted scalar, returning its text and the bytes consumed
fn read_quoted(content: &str, quote: char) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = content.char_indices().skip(1).peekable();

    while let Some((i, c)) = chars.next() {
        if quote == '"' && c == '\\' {
            if let Some((_, escaped)) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if c == quote {
            if quote == '\'' && chars.peek().is_some_and(|(_, next)| *next == '\'') {
                chars.next();
                out.push('\'');
                continue;
            }
            return Some((out, i + c.len_utf8()));
        }
        out.push(c);
    }
    None
}

/// Whether the text after `key:` holds a value on the same line
fn has_inline_value(value: &str) -> bool {
    value
        .split_whitespace()
        .take_while(|token| !token.starts_with('#'))
        .any(|token| !token.starts_with('&') && !token.starts_with('!'))
}

fn starts_block_scalar(value: &str) -> bool {
    value.starts_with('|') || value.starts_with('>')
}
