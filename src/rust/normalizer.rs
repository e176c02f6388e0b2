//! Markup-to-plain-text normalization.
//!
//! [`normalize`] turns raw text that may contain HTML into plain text. It is a
//! pure function and never fails: malformed markup degrades to literal text.
//!
//! Output rules:
//! - tags are removed, text nodes keep their reading order
//! - block-level tags (`p`, `div`, `br`, `li`, headings, ...) start a new line
//! - `<script>` and `<style>` bodies, comments, doctypes and processing
//!   instructions are dropped
//! - `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;` and numeric
//!   references are decoded; anything else stays literal
//! - whitespace runs collapse to one space, lines are trimmed, empty lines
//!   are dropped and the remaining lines are joined with `\n`

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "nav", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Longest character reference we try to decode, `&` and `;` included.
const MAX_ENTITY_LEN: usize = 12;

/// Strips markup from `raw` and returns visually equivalent plain text.
///
/// # Example
/// ```
/// use labelwise::normalize;
///
/// let text = normalize("<p>Hello&nbsp;<b>world</b></p><p>again</p>");
/// assert_eq!(text, "Hello world\nagain");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut out = LineWriter::default();
    let mut rest = raw;

    while let Some(pos) = rest.find(['<', '&']) {
        out.push_text(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with('&') {
            let (decoded, consumed) = decode_reference(tail);
            match decoded {
                Some(c) => out.push_char(c),
                None => out.push_text(&tail[..consumed]),
            }
            rest = &tail[consumed..];
            continue;
        }

        match parse_markup(tail) {
            Markup::Skip(len) => rest = &tail[len..],
            Markup::Tag { name, closing, len } => {
                if BLOCK_TAGS.contains(&name.as_str()) {
                    out.break_line();
                }
                rest = &tail[len..];
                if !closing && RAW_TEXT_TAGS.contains(&name.as_str()) {
                    rest = skip_raw_text(rest, &name);
                }
            }
            Markup::Literal => {
                out.push_char('<');
                rest = &tail[1..];
            }
        }
    }

    out.push_text(rest);
    out.finish()
}

enum Markup {
    /// Comment, doctype or processing instruction of the given byte length
    Skip(usize),
    Tag { name: String, closing: bool, len: usize },
    /// A `<` that does not start markup
    Literal,
}

fn parse_markup(tail: &str) -> Markup {
    if let Some(body) = tail.strip_prefix("<!--") {
        // An unterminated comment swallows the rest of the input, as browsers do.
        return match body.find("-->") {
            Some(end) => Markup::Skip(4 + end + 3),
            None => Markup::Skip(tail.len()),
        };
    }
    if tail.starts_with("<!") || tail.starts_with("<?") {
        return match tail.find('>') {
            Some(end) => Markup::Skip(end + 1),
            None => Markup::Literal,
        };
    }

    let (closing, name_start) = if tail.starts_with("</") { (true, 2) } else { (false, 1) };
    let name: String = tail[name_start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Markup::Literal;
    }

    match find_tag_end(&tail[name_start + name.len()..]) {
        Some(end) => Markup::Tag {
            name: name.to_ascii_lowercase(),
            closing,
            len: name_start + name.len() + end + 1,
        },
        None => Markup::Literal,
    }
}

/// Byte offset of the `>` closing a tag, ignoring `>` inside quoted attribute values.
fn find_tag_end(attrs: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in attrs.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

/// Skips the body of a `<script>`/`<style>` element, including its end tag.
fn skip_raw_text<'a>(rest: &'a str, name: &str) -> &'a str {
    let bytes = rest.as_bytes();
    let mut from = 0;
    while let Some(found) = rest[from..].find("</") {
        let start = from + found;
        let name_start = start + 2;
        let matches = bytes
            .get(name_start..name_start + name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        if matches {
            return match rest[start..].find('>') {
                Some(end) => &rest[start + end + 1..],
                None => "",
            };
        }
        from = name_start;
    }
    ""
}

/// Decodes the character reference at the start of `tail`.
///
/// Returns the decoded character, if any, and the number of bytes consumed.
/// Unknown references consume only the `&`.
fn decode_reference(tail: &str) -> (Option<char>, usize) {
    let window = match tail.char_indices().nth(MAX_ENTITY_LEN) {
        Some((i, _)) => &tail[..i],
        None => tail,
    };
    let Some(semi) = window.find(';') else {
        return (None, 1);
    };
    let name = &tail[1..semi];
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name.strip_prefix('#').and_then(decode_numeric),
    };
    match decoded {
        Some(c) => (Some(c), semi + 1),
        None => (None, 1),
    }
}

/// Decodes the digits of `&#65;` or `&#x41;`. Signs and NUL are rejected.
fn decode_numeric(num: &str) -> Option<char> {
    let (digits, radix) = match num.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (num, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    match u32::from_str_radix(digits, radix).ok()? {
        0 => None,
        code => char::from_u32(code),
    }
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineWriter {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            self.push_char(c);
        }
    }

    fn push_char(&mut self, c: char) {
        if c.is_whitespace() {
            self.pending_space = !self.current.is_empty();
            return;
        }
        if self.pending_space {
            self.current.push(' ');
            self.pending_space = false;
        }
        self.current.push(c);
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(normalize("buy now cheap"), "buy now cheap");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t  "), "");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(normalize("  hello \n\n  world  "), "hello world");
    }

    #[test]
    fn test_block_tags_break_lines() {
        assert_eq!(
            normalize("<div>first</div><div>second<br>third</div>"),
            "first\nsecond\nthird"
        );
        assert_eq!(normalize("<ul><li>a</li><li>b</li></ul>"), "a\nb");
    }

    #[test]
    fn test_inline_tags_keep_line() {
        assert_eq!(normalize("a <b>bold</b> <i>move</i>"), "a bold move");
        assert_eq!(normalize("<span>x</span><span>y</span>"), "xy");
    }

    #[test]
    fn test_script_style_and_comments_dropped() {
        let html = "<html><head><style>p { color: red }</style>\
                    <SCRIPT>var x = '<p>';</SCRIPT></head>\
                    <body><!-- hidden -->visible</body></html>";
        assert_eq!(normalize(html), "visible");
        assert_eq!(normalize("<!DOCTYPE html><p>doc</p>"), "doc");
        assert_eq!(normalize("before<!-- never closed"), "before");
    }

    #[test]
    fn test_entities() {
        assert_eq!(normalize("fish &amp; chips"), "fish & chips");
        assert_eq!(normalize("&lt;p&gt; is a tag"), "<p> is a tag");
        assert_eq!(normalize("&#72;&#x69;"), "Hi");
        assert_eq!(normalize("a&nbsp;&nbsp;b"), "a b");
        assert_eq!(normalize("R&D &bogus; &"), "R&D &bogus; &");
    }

    #[test]
    fn test_signed_and_nul_references_stay_literal() {
        assert_eq!(normalize("&#+65; &#x+41; &#0;x"), "&#+65; &#x+41; &#0;x");
        assert_eq!(normalize("&#-65; &#x; &#;"), "&#-65; &#x; &#;");
        assert_eq!(normalize("&#65;&#X42;"), "AB");
    }

    #[test]
    fn test_many_raw_text_elements() {
        let mut html = "<style></style>".repeat(50_000);
        html.push_str("<p>kept</p><STYLE>a{}</Style>tail");
        assert_eq!(normalize(&html), "kept\ntail");
    }

    #[test]
    fn test_raw_text_ignores_other_end_tags() {
        assert_eq!(
            normalize("<script>if (a </b) { x = '</scr' }</SCRIPT >after"),
            "after"
        );
        assert_eq!(normalize("<style>never closed"), "");
    }

    #[test]
    fn test_malformed_markup_is_literal() {
        assert_eq!(normalize("a < b and c > d"), "a < b and c > d");
        assert_eq!(normalize("1 <2"), "1 <2");
        assert_eq!(normalize("text <unterminated"), "text <unterminated");
    }

    #[test]
    fn test_quoted_attributes() {
        assert_eq!(normalize("<a title=\"x > y\" href='z'>link</a>"), "link");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let input = "<p>Hi <b>there</b></p>\n<p>&amp; bye</p>";
        assert_eq!(normalize(input), normalize(input));
    }
}
