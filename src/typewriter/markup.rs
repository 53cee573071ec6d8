//! Splits formatted HTML into reveal units.
//!
//! Tags are zero-width and never cut in half. Character references such as
//! `&amp;` count as a single visible character.

/// Elements that never take a closing tag.
const VOID_ELEMENTS: [&str; 7] = ["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Longest character reference we recognize, including `&` and `;`.
const MAX_ENTITY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    /// Self-contained: void elements, `<x/>`, comments, doctypes.
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub raw: String,
    pub name: String,
    pub kind: TagKind,
}

impl Tag {
    fn parse(raw: &str) -> Self {
        let inner = raw.trim_start_matches('<').trim_end_matches('>');
        let (closing, body) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let name: String = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        let kind = if closing {
            TagKind::Close
        } else if name.is_empty() || inner.ends_with('/') || VOID_ELEMENTS.contains(&name.as_str())
        {
            TagKind::Void
        } else {
            TagKind::Open
        };

        Self {
            raw: raw.to_string(),
            name,
            kind,
        }
    }
}

/// One step of the reveal: either a visible glyph or a piece of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// A visible character, or a whole character reference.
    Text(String),
    Tag(Tag),
}

impl Unit {
    pub fn is_visible(&self) -> bool {
        matches!(self, Unit::Text(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Unit::Text(text) => text,
            Unit::Tag(tag) => &tag.raw,
        }
    }
}

/// Tokenizes formatted HTML. A `<` without a matching `>` is plain text.
pub fn tokenize(html: &str) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        if c == '<'
            && opens_tag(rest)
            && let Some(end) = rest.find('>')
        {
            units.push(Unit::Tag(Tag::parse(&rest[..=end])));
            rest = &rest[end + 1..];
            continue;
        }

        if c == '&'
            && let Some(len) = entity_len(rest)
        {
            units.push(Unit::Text(rest[..len].to_string()));
            rest = &rest[len..];
            continue;
        }

        units.push(Unit::Text(c.to_string()));
        rest = &rest[c.len_utf8()..];
    }

    units
}

fn opens_tag(s: &str) -> bool {
    matches!(s[1..].chars().next(), Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Byte length of a character reference at the start of `s`, if any.
fn entity_len(s: &str) -> Option<usize> {
    let end = s.char_indices().take(MAX_ENTITY_LEN).find(|(_, c)| *c == ';')?.0;
    let body = &s[1..end];
    let valid = match body.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric()),
    };
    valid.then_some(end + 1)
}
