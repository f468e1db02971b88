//! Query Normalizer
//!
//! Produces the canonical form that keyword matching runs against:
//!
//! 1. `//` line comments are removed up to (not including) the line break
//! 2. `/* ... */` block comments are removed, across line breaks; an
//!    unterminated block comment swallows the rest of the input
//! 3. `\uXXXX` escape sequences become a single space
//! 4. the whole text is uppercased
//!
//! Comment markers inside quoted literals or backtick identifiers are data,
//! not comments, so the scanner tracks quoting while it strips. Removing a
//! comment can splice two fragments into a new marker (`/` + `/*x*/` + `/`),
//! and uppercasing can turn a ligature into hex digits, so the steps are
//! repeated until the text stops changing. That makes `normalize`
//! idempotent.

use std::fmt;

/// Query text after comment removal, escape neutralisation and case folding.
///
/// Deliberately has no `Debug` output of its contents: the text may carry
/// sensitive literal values and must not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizedQuery({} bytes)", self.0.len())
    }
}

impl AsRef<str> for NormalizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes raw query text. Pure and total: never fails, never consults
/// external state.
pub fn normalize(text: &str) -> NormalizedQuery {
    let mut current = strip_comments_and_escapes(text).to_uppercase();

    // From here on every round that changes anything shrinks the text
    let max_rounds = current.chars().count() + 1;
    for _ in 0..max_rounds {
        let next = strip_comments_and_escapes(&current).to_uppercase();
        if next == current {
            break;
        }
        current = next;
    }

    NormalizedQuery(current)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(char),
}

fn strip_comments_and_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut state = ScanState::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && is_unicode_escape(&chars[i + 1..]) {
            out.push(' ');
            i += 6;
            continue;
        }

        match state {
            ScanState::Code => match (c, chars.get(i + 1)) {
                ('/', Some('/')) => {
                    i += 2;
                    while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                        i += 1;
                    }
                }
                ('/', Some('*')) => {
                    i += 2;
                    loop {
                        if i >= chars.len() {
                            break;
                        }
                        if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                ('\'' | '"' | '`', _) => {
                    state = ScanState::Quoted(c);
                    out.push(c);
                    i += 1;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            },
            ScanState::Quoted(quote) => {
                if c == '\\' && quote != '`' {
                    out.push(c);
                    if let Some(&escaped) = chars.get(i + 1) {
                        out.push(escaped);
                    }
                    i += 2;
                } else {
                    if c == quote {
                        state = ScanState::Code;
                    }
                    out.push(c);
                    i += 1;
                }
            }
        }
    }

    out
}

/// `rest` starts right after a backslash
fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 5
        && matches!(rest[0], 'u' | 'U')
        && rest[1..5].iter().all(|c| c.is_ascii_hexdigit())
}
