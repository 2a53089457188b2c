//! Response formatting: lightweight markup to display tokens
//!
//! Raw service text uses two delimiters:
//! - `**strong**` → `<b>strong</b>`, paired by position (1st opens, 2nd closes, ...)
//! - `*` → `<br/>` for every remaining occurrence
//!
//! The converted markup is split into words so the reveal scheduler can
//! disclose it one token at a time.

/// Delimiter wrapping emphasized text
pub const STRONG_DELIMITER: &str = "**";

/// Delimiter converted to a line break
pub const BREAK_DELIMITER: &str = "*";

const STRONG_OPEN: &str = "<b>";
const STRONG_CLOSE: &str = "</b>";
const BREAK_TAG: &str = "<br/>";

/// Tags that separate words when markup is flattened to plain text
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "img", "a",
];

/// A formatted response, ready for progressive reveal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedResponse {
    tokens: Vec<String>,
}

impl FormattedResponse {
    /// Display tokens in reveal order
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Consume into the display tokens
    #[must_use]
    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    /// Whether the response produced no tokens at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The full markup as it reads once every token has been revealed
    #[must_use]
    pub fn markup(&self) -> String {
        join_tokens(&self.tokens)
    }

    /// Markup-free text for speech and summaries
    #[must_use]
    pub fn plain_text(&self) -> String {
        to_plain_text(&self.markup())
    }
}

/// Format raw service text into display tokens
///
/// Never fails: malformed input degrades to plain text.
#[must_use]
pub fn format_response(raw: &str) -> FormattedResponse {
    let markup = to_markup(raw);
    FormattedResponse {
        tokens: markup.split_whitespace().map(ToString::to_string).collect(),
    }
}

/// Resolve strong emphasis and line breaks without tokenizing
///
/// An unpaired final `**` is kept verbatim rather than opening emphasis,
/// and is not itself turned into line breaks.
#[must_use]
pub fn to_markup(raw: &str) -> String {
    let segments: Vec<&str> = raw.split(STRONG_DELIMITER).collect();
    let delimiters = segments.len() - 1;
    let paired = delimiters - delimiters % 2;

    let mut out = String::with_capacity(raw.len() + delimiters * STRONG_OPEN.len());
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            // Delimiter number `i` sits in front of segment `i`
            if i > paired {
                out.push_str(STRONG_DELIMITER);
            } else if i % 2 == 1 {
                out.push_str(STRONG_OPEN);
            } else {
                out.push_str(STRONG_CLOSE);
            }
        }
        out.push_str(&segment.replace(BREAK_DELIMITER, BREAK_TAG));
    }
    out
}

/// Reassemble tokens the way the reveal scheduler appends them
///
/// Every token keeps one trailing space.
#[must_use]
pub fn join_tokens(tokens: &[String]) -> String {
    let len = tokens.iter().map(|t| t.len() + 1).sum();
    tokens.iter().fold(String::with_capacity(len), |mut acc, t| {
        acc.push_str(t);
        acc.push(' ');
        acc
    })
}

/// Strip markup tags, leaving text suitable for speech
///
/// A tag is `<`, an optional `/`, at least one non-`>` character, then
/// `>` or end of input. Block-level tags turn into word breaks; the
/// result has its whitespace collapsed.
#[must_use]
pub fn to_plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let body_start = usize::from(after.starts_with('/'));
        let body = &after[body_start..];

        // Needs at least one non-`>` character to count as a tag
        if body.is_empty() || body.starts_with('>') {
            out.push('<');
            rest = after;
            continue;
        }

        let (inner, remaining) = match body.find('>') {
            Some(end) => (&body[..end], &body[end + 1..]),
            None => (body, ""),
        };
        if is_block_tag(inner) {
            out.push(' ');
        }
        rest = remaining;
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_block_tag(inner: &str) -> bool {
    let name: String = inner
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}
