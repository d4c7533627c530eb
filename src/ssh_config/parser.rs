//! Line-level parser for SSH config bodies.
//!
//! Accepts `Key Value`, `Key=Value` and `Key = Value` forms. Values wrapped in
//! double quotes are unquoted. Nothing here touches the filesystem.

/// Why a non-comment line could not be read as a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformation {
    MissingKey,
    MissingValue { key: String },
    InvalidKey { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    Directive { key: &'a str, value: &'a str },
    Malformed(Malformation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// 1-based
    pub number: usize,
    pub kind: LineKind<'a>,
}

pub fn parse_lines(content: &str) -> Vec<ParsedLine<'_>> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| ParsedLine {
            number: i + 1,
            kind: parse_line(line),
        })
        .collect()
}

pub fn parse_line(line: &str) -> LineKind<'_> {
    let line = line.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with('#') {
        return LineKind::Comment;
    }

    let split_at = line
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(line.len());
    let (key, rest) = line.split_at(split_at);

    if key.is_empty() {
        return LineKind::Malformed(Malformation::MissingKey);
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return LineKind::Malformed(Malformation::InvalidKey {
            key: key.to_string(),
        });
    }

    let value = unquote(argument_text(rest));

    if value.is_empty() {
        return LineKind::Malformed(Malformation::MissingValue {
            key: key.to_string(),
        });
    }

    LineKind::Directive { key, value }
}

/// Text after the keyword, with the optional `=` separator removed.
fn argument_text(rest: &str) -> &str {
    let rest = rest.trim_start();
    rest.strip_prefix('=').unwrap_or(rest).trim()
}

/// Split on unquoted whitespace. Quotes group words and are dropped.
pub fn split_arguments(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].trim()
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub line: usize,
    /// Lowercased keyword
    pub key: String,
    pub value: String,
}

/// A `Host` line and the directives that follow it, up to the next `Host` or
/// `Match` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBlock {
    pub line: usize,
    pub patterns: Vec<String>,
    pub directives: Vec<Directive>,
}

impl HostBlock {
    /// First value for `key`, the way ssh resolves repeated options.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }

    /// Patterns that name a single host, i.e. no wildcards or negation.
    pub fn literal_names(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .filter(|p| is_literal_pattern(p))
    }
}

pub fn is_literal_pattern(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '!'])
}

pub fn host_blocks(content: &str) -> Vec<HostBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<HostBlock> = None;

    for parsed in parse_lines(content) {
        let LineKind::Directive { key, value } = parsed.kind else {
            continue;
        };

        match key.to_lowercase().as_str() {
            "host" => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                current = Some(HostBlock {
                    line: parsed.number,
                    patterns: value
                        .split_whitespace()
                        .map(|p| p.trim_matches('"').to_string())
                        .filter(|p| !p.is_empty())
                        .collect(),
                    directives: Vec::new(),
                });
            }
            "match" => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            lower => {
                if let Some(block) = current.as_mut() {
                    block.directives.push(Directive {
                        line: parsed.number,
                        key: lower.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

/// Number of `Host` declaration lines in a body.
pub fn count_hosts(content: &str) -> usize {
    parse_lines(content)
        .iter()
        .filter(|p| matches!(p.kind, LineKind::Directive { key, .. } if key.eq_ignore_ascii_case("host")))
        .count()
}

/// Every `Include` pattern in a body, with its line number, in file order.
pub fn include_patterns(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match parse_line(line) {
            LineKind::Directive { key, .. } if key.eq_ignore_ascii_case("include") => {
                let rest = &line.trim()[key.len()..];
                Some((i + 1, argument_text(rest)))
            }
            _ => None,
        })
        .flat_map(|(line, text)| {
            split_arguments(text)
                .into_iter()
                .map(move |pattern| (line, pattern))
        })
        .collect()
}
