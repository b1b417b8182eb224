//! A module splitting raw console input into argument words.

/// States of the word splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Outside a quoted span: spaces separate words.
    Plain,
    /// Inside a double-quoted span: spaces are ordinary characters.
    Quoted,
}

struct Splitter {
    state: State,
    escaped: bool,
    buffer: String,
    words: Vec<String>,
}

impl Splitter {
    fn new() -> Self {
        Splitter {
            state: State::Plain,
            escaped: false,
            buffer: String::new(),
            words: Vec::new(),
        }
    }

    fn feed(&mut self, ch: char) {
        if self.escaped {
            // The preceding backslash claims this character verbatim,
            // even when it is a quote.
            self.escaped = false;
            self.buffer.push(ch);
            return;
        }
        match (self.state, ch) {
            (State::Plain, '"') => self.state = State::Quoted,
            (State::Quoted, '"') => self.state = State::Plain,
            (State::Quoted, '\\') => self.escaped = true,
            (State::Plain, ' ') => self.flush(),
            (_, c) => self.buffer.push(c),
        }
    }

    /// Ends the current word; empty words (doubled separators) are dropped.
    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.words.push(std::mem::take(&mut self.buffer));
        }
    }

    fn finish(mut self) -> Vec<String> {
        // An unterminated quote closes silently here.
        self.flush();
        self.words
    }
}

/// Split one input line into argument words.
///
/// Rules, in order of precedence:
/// - an unescaped `"` toggles a quoted span and is not part of any word;
/// - a `\` inside a quoted span escapes the next character (so `\"` stays
///   in the word without closing the span); outside quotes a backslash is
///   an ordinary character;
/// - a space outside a quoted span ends the current word;
/// - everything else, including spaces inside a quoted span, accumulates
///   into the current word.
///
/// Splitting never fails: a quote left open at the end of the line closes
/// there, and empty words are dropped entirely.
pub fn split_into_words(line: &str) -> Vec<String> {
    let mut splitter = Splitter::new();
    for ch in line.chars() {
        splitter.feed(ch);
    }
    splitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_into_words(line)
    }

    #[test]
    fn plain_words() {
        assert_eq!(words("a b c"), ["a", "b", "c"]);
    }

    #[test]
    fn quoted_span_keeps_spaces() {
        assert_eq!(words("a \"b c\" d"), ["a", "b c", "d"]);
    }

    #[test]
    fn escaped_quote_inside_span() {
        assert_eq!(words("a \"b\\\"c\" d"), ["a", "b\"c", "d"]);
    }

    #[test]
    fn repeated_separators_collapse() {
        assert_eq!(words("  a   b "), ["a", "b"]);
    }

    #[test]
    fn empty_line_has_no_words() {
        assert_eq!(words(""), Vec::<String>::new());
    }

    #[test]
    fn unterminated_quote_closes_at_end_of_line() {
        assert_eq!(words("a \"b c"), ["a", "b c"]);
    }

    #[test]
    fn backslash_outside_quotes_is_literal() {
        assert_eq!(words("a\\b \\"), ["a\\b", "\\"]);
    }

    #[test]
    fn quotes_join_adjacent_text() {
        assert_eq!(words("a\"b c\"d"), ["ab cd"]);
    }

    #[test]
    fn backslash_escapes_backslash_in_quotes() {
        assert_eq!(words("\"a\\\\b\""), ["a\\b"]);
    }

    #[test]
    fn quoted_empty_word_is_dropped() {
        assert_eq!(words("a \"\" b"), ["a", "b"]);
    }
}
