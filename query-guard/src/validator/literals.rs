//! String-Literal Stripper
//!
//! Single-pass scanner that empties single- and double-quoted literals while
//! keeping the quote characters, so `n.name = 'CREATE'` becomes
//! `n.name = ''`. Backslash escapes inside a literal are consumed as a pair,
//! which keeps `'it\'s'` from closing early. A literal still open at the end
//! of the input runs to the end of the input.
//!
//! Backtick-quoted identifiers are copied verbatim: their contents are not
//! data, but a quote character inside them must not open a literal either.

#[derive(Clone, Copy, PartialEq, Eq)]
enum LiteralState {
    Code,
    Literal { quote: char, escape_pending: bool },
    Identifier,
}

pub fn strip_string_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = LiteralState::Code;

    for c in text.chars() {
        state = match state {
            LiteralState::Code => {
                out.push(c);
                match c {
                    '\'' | '"' => LiteralState::Literal {
                        quote: c,
                        escape_pending: false,
                    },
                    '`' => LiteralState::Identifier,
                    _ => LiteralState::Code,
                }
            }
            LiteralState::Literal {
                quote,
                escape_pending: true,
            } => LiteralState::Literal {
                quote,
                escape_pending: false,
            },
            LiteralState::Literal { quote, .. } if c == '\\' => LiteralState::Literal {
                quote,
                escape_pending: true,
            },
            LiteralState::Literal { quote, .. } if c == quote => {
                out.push(c);
                LiteralState::Code
            }
            literal @ LiteralState::Literal { .. } => literal,
            LiteralState::Identifier => {
                out.push(c);
                if c == '`' {
                    LiteralState::Code
                } else {
                    LiteralState::Identifier
                }
            }
        };
    }

    out
}
