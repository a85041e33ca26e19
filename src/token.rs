//! Tokenization for intra-line diffing.
//!
//! A line body is split into maximal runs of word characters, punctuation and
//! whitespace, followed by one synthetic newline marker. Concatenating the
//! token texts of a line (marker included) reconstructs `line + "\n"` exactly,
//! which is what lets edit scripts be mapped back onto byte ranges.

/// Category of a token within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Alphanumeric characters and underscores
    Word,
    /// Anything that is neither word nor whitespace
    Punct,
    /// Non-newline whitespace
    Space,
    /// Synthetic end-of-line marker, one per line
    Newline,
}

/// A span of a line body plus its category.
///
/// `start` is the byte offset of the span within the line; the newline marker
/// sits at `line.len()` with the fixed text `"\n"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
    pub start: usize,
}

impl Token<'_> {
    /// Byte range of this token within its line (empty for the newline marker)
    pub fn range(&self) -> std::ops::Range<usize> {
        match self.kind {
            TokenKind::Newline => self.start..self.start,
            _ => self.start..self.start + self.text.len(),
        }
    }
}

fn char_kind(c: char) -> TokenKind {
    if c.is_alphanumeric() || c == '_' {
        TokenKind::Word
    } else if c.is_whitespace() {
        TokenKind::Space
    } else {
        TokenKind::Punct
    }
}

/// Split a line body into tokens, ending with the synthetic newline marker.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut run_kind = None;

    for (pos, c) in line.char_indices() {
        let kind = char_kind(c);
        match run_kind {
            Some(current) if current == kind => {}
            Some(current) => {
                tokens.push(Token {
                    text: &line[run_start..pos],
                    kind: current,
                    start: run_start,
                });
                run_start = pos;
                run_kind = Some(kind);
            }
            None => run_kind = Some(kind),
        }
    }
    if let Some(current) = run_kind {
        tokens.push(Token {
            text: &line[run_start..],
            kind: current,
            start: run_start,
        });
    }

    tokens.push(Token {
        text: "\n",
        kind: TokenKind::Newline,
        start: line.len(),
    });
    tokens
}

/// Junk predicate for alignment: non-newline whitespace never seeds a match.
///
/// Operates on the token text so the aligner can stay generic over keys. The
/// newline marker text is `"\n"` and is deliberately not junk: it anchors
/// line boundaries in the edit script.
pub fn is_junk(text: &str) -> bool {
    !text.is_empty() && text != "\n" && text.chars().all(char::is_whitespace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn texts(line: &str) -> Vec<&str> {
        tokenize(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_into_maximal_runs() {
        assert_eq!(texts("x = foo(1)"), vec!["x", " ", "=", " ", "foo", "(", "1", ")", "\n"]);
    }

    #[test]
    fn underscore_counts_as_word() {
        assert_eq!(texts("my_var2"), vec!["my_var2", "\n"]);
    }

    #[test]
    fn empty_line_yields_only_marker() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Newline);
        assert_eq!(tokens[0].start, 0);
    }

    #[test]
    fn mixed_whitespace_is_one_token() {
        let tokens = tokenize("a \t b");
        assert_eq!(tokens[1].text, " \t ");
        assert_eq!(tokens[1].kind, TokenKind::Space);
    }

    #[test]
    fn offsets_match_byte_positions() {
        let line = "if x>1:";
        for token in tokenize(line) {
            if token.kind != TokenKind::Newline {
                assert_eq!(&line[token.range()], token.text);
            }
        }
    }

    #[test]
    fn reconstruction_is_exact() {
        let line = "  let total = a + b; // done";
        let joined: String = tokenize(line).iter().map(|t| t.text).collect();
        assert_eq!(joined, format!("{line}\n"));
    }

    #[test]
    fn junk_is_whitespace_but_not_newline_marker() {
        assert!(is_junk(" "));
        assert!(is_junk("\t  "));
        assert!(!is_junk("\n"));
        assert!(!is_junk("word"));
        assert!(!is_junk("+"));
        assert!(!is_junk(""));
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Tokens of any newline-free line concatenate back to the line
            #[test]
            fn tokens_reconstruct_line(line in "[^\n]{0,60}") {
                let joined: String = tokenize(&line).iter().map(|t| t.text).collect();
                prop_assert_eq!(joined, format!("{}\n", line));
            }

            /// Every non-marker token covers a valid, non-empty byte range
            #[test]
            fn token_ranges_are_valid(line in "[^\n]{0,60}") {
                for token in tokenize(&line) {
                    if token.kind == TokenKind::Newline {
                        continue;
                    }
                    prop_assert!(!token.text.is_empty());
                    prop_assert_eq!(&line[token.range()], token.text);
                }
            }
        }
    }
}
