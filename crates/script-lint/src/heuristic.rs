//! Bracket and quote balance check used when no shell interpreter exists.
//!
//! This is a sanity net, not a parser: comments, escapes and nested quoting
//! are deliberately ignored.

/// Why a snippet failed the balance check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Imbalance {
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedClose { found: char, offset: usize },

    #[error("mismatched '{found}' at offset {offset}, expected '{expected}'")]
    Mismatched {
        found: char,
        expected: char,
        offset: usize,
    },

    #[error("unclosed bracket, expected '{expected}' before end of input")]
    Unclosed { expected: char },

    #[error("unterminated {quote} quote")]
    UnterminatedQuote { quote: char },
}

fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '{' => Some('}'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Check that `()`, `{}`, `[]` nest correctly and every quote is closed.
pub fn check_balance(snippet: &str) -> Result<(), Imbalance> {
    let mut expected: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;

    for (offset, ch) in snippet.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            ')' | '}' | ']' => match expected.pop() {
                None => return Err(Imbalance::UnexpectedClose { found: ch, offset }),
                Some(want) if want != ch => {
                    return Err(Imbalance::Mismatched {
                        found: ch,
                        expected: want,
                        offset,
                    })
                }
                Some(_) => {}
            },
            _ => {
                if let Some(close) = closer_for(ch) {
                    expected.push(close);
                }
            }
        }
    }

    if let Some(q) = quote {
        return Err(Imbalance::UnterminatedQuote { quote: q });
    }
    if let Some(want) = expected.pop() {
        return Err(Imbalance::Unclosed { expected: want });
    }
    Ok(())
}
