//! The line counting state machine.
//!
//! [`count`] is a pure function of (text, language rules): a single
//! pass over physical lines, tracking whether the scanner sits in
//! normal code, inside a block comment (with nesting depth for
//! languages that nest), or inside a string literal. Sub-line
//! transitions are handled by scanning each line left to right, so a
//! line like `code(); /* c` counts as code while the continuation
//! `c */ more();` also counts as code.
//!
//! Classification per physical line applies one tie-break after the
//! scan: code beats comment beats blank. A line is never counted in
//! more than one category.

use crate::language::LanguageSpec;
use crate::stats::LineCounts;

/// Scanner state carried across physical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Inside a block comment; `pair` indexes the language's delimiter
    /// pair so only the matching closer ends it
    InBlockComment { pair: usize, depth: u32 },
    /// Inside a string literal; `delim` indexes the language's string
    /// delimiter table
    InString { delim: usize },
}

/// What the current line has contributed so far.
#[derive(Debug, Default, Clone, Copy)]
struct LineContext {
    has_code: bool,
    has_comment: bool,
}

/// Count blank, comment, and code lines in `text` using the lexical
/// rules of `spec`.
///
/// Deterministic and side-effect free; an empty input yields all
/// zeroes, a final line without a terminator still counts, and an
/// unterminated block comment runs to end of input as comment.
pub fn count(text: &str, spec: &LanguageSpec) -> LineCounts {
    let mut counts = LineCounts::new();
    let mut state = State::Normal;

    for (lineno, line) in text.lines().enumerate() {
        let mut ctx = LineContext::default();

        // cloc convention: the shebang line is code, not a comment,
        // for languages that flag it.
        if lineno == 0 && state == State::Normal && spec.shebang_is_code && line.starts_with("#!")
        {
            counts.code += 1;
            continue;
        }

        let mut pos = 0;
        while pos < line.len() {
            let rest = &line[pos..];
            match state {
                State::Normal => {
                    if let Some(width) = leading_whitespace(rest) {
                        pos += width;
                    } else if let Some((pair, open_len)) = match_block_open(spec, rest, pos) {
                        state = State::InBlockComment { pair, depth: 1 };
                        ctx.has_comment = true;
                        pos += open_len;
                    } else if has_line_comment(spec, rest) {
                        ctx.has_comment = true;
                        break;
                    } else if let Some((delim, delim_len)) = match_string_open(spec, rest) {
                        state = State::InString { delim };
                        ctx.has_code = true;
                        pos += delim_len;
                    } else {
                        ctx.has_code = true;
                        pos += char_width(rest);
                    }
                }
                State::InBlockComment { pair, depth } => {
                    let delims = &spec.block_comments[pair];
                    // Column-restricted delimiters (Ruby's =begin/=end)
                    // are only recognized at the start of a line.
                    let position_ok = !delims.column0 || pos == 0;
                    if spec.nested_blocks && position_ok && rest.starts_with(delims.open) {
                        state = State::InBlockComment {
                            pair,
                            depth: depth + 1,
                        };
                        ctx.has_comment = true;
                        pos += delims.open.len();
                    } else if position_ok && rest.starts_with(delims.close) {
                        ctx.has_comment = true;
                        pos += delims.close.len();
                        state = if depth > 1 {
                            State::InBlockComment {
                                pair,
                                depth: depth - 1,
                            }
                        } else {
                            State::Normal
                        };
                    } else {
                        if leading_whitespace(rest).is_none() {
                            ctx.has_comment = true;
                        }
                        pos += char_width(rest);
                    }
                }
                State::InString { delim } => {
                    let string = &spec.strings[delim];
                    if let Some(esc) = string.escape {
                        if rest.starts_with(esc) {
                            ctx.has_code = true;
                            pos += esc.len_utf8();
                            // The escaped character never closes the string
                            pos += char_width(&line[pos.min(line.len())..]);
                            continue;
                        }
                    }
                    if rest.starts_with(string.delim) {
                        ctx.has_code = true;
                        pos += string.delim.len();
                        state = State::Normal;
                    } else {
                        if leading_whitespace(rest).is_none() {
                            ctx.has_code = true;
                        }
                        pos += char_width(rest);
                    }
                }
            }
        }

        // Plain string literals do not continue past the line break.
        if let State::InString { delim } = state {
            if !spec.strings[delim].multiline {
                state = State::Normal;
            }
        }

        if ctx.has_code {
            counts.code += 1;
        } else if ctx.has_comment {
            counts.comment += 1;
        } else {
            counts.blank += 1;
        }
    }

    counts
}

/// Width of a single leading whitespace character, if any.
fn leading_whitespace(rest: &str) -> Option<usize> {
    let c = rest.chars().next()?;
    c.is_whitespace().then(|| c.len_utf8())
}

fn char_width(rest: &str) -> usize {
    rest.chars().next().map_or(0, char::len_utf8)
}

fn match_block_open(spec: &LanguageSpec, rest: &str, pos: usize) -> Option<(usize, usize)> {
    spec.block_comments
        .iter()
        .enumerate()
        .find(|(_, delims)| (!delims.column0 || pos == 0) && rest.starts_with(delims.open))
        .map(|(pair, delims)| (pair, delims.open.len()))
}

fn has_line_comment(spec: &LanguageSpec, rest: &str) -> bool {
    spec.line_comments
        .iter()
        .any(|marker| rest.starts_with(marker))
}

fn match_string_open(spec: &LanguageSpec, rest: &str) -> Option<(usize, usize)> {
    spec.strings
        .iter()
        .enumerate()
        .find(|(_, string)| rest.starts_with(string.delim))
        .map(|(delim, string)| (delim, string.delim.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::registry;
    use crate::stats::LineCounts;

    fn lang(name: &str) -> &'static LanguageSpec {
        registry().by_name(name).expect("language in registry")
    }

    fn counts(blank: u64, comment: u64, code: u64) -> LineCounts {
        LineCounts {
            blank,
            comment,
            code,
        }
    }

    #[test]
    fn empty_file_is_all_zero() {
        assert_eq!(count("", lang("Rust")), counts(0, 0, 0));
    }

    #[test]
    fn blank_lines_only() {
        assert_eq!(count("\n\n  \t\n", lang("Python")), counts(3, 0, 0));
    }

    #[test]
    fn final_line_without_terminator_counts() {
        assert_eq!(count("x = 1", lang("Python")), counts(0, 0, 1));
        assert_eq!(count("# note", lang("Python")), counts(0, 1, 0));
    }

    #[test]
    fn full_line_comments() {
        let text = "# one\n# two\n# three\n";
        assert_eq!(count(text, lang("Python")), counts(0, 3, 0));
    }

    #[test]
    fn hash_comment_then_code() {
        let text = "# comment\nx = 1\n";
        assert_eq!(count(text, lang("Python")), counts(0, 1, 1));
    }

    #[test]
    fn trailing_comment_counts_as_code() {
        let text = "x = 1  # trailing\n";
        assert_eq!(count(text, lang("Python")), counts(0, 0, 1));
    }

    #[test]
    fn block_comment_spanning_lines() {
        let text = "/*\n comment\n*/\nint x;\n";
        assert_eq!(count(text, lang("C")), counts(0, 3, 1));
    }

    #[test]
    fn blank_line_inside_block_comment_is_blank() {
        let text = "/*\n\n comment\n*/\n";
        assert_eq!(count(text, lang("C")), counts(1, 3, 0));
    }

    #[test]
    fn code_around_block_comment_wins() {
        // Line 1 has code before the opener, line 2 has code after the
        // closer: both are code.
        let text = "code(); /* c\nc */ more();\n";
        assert_eq!(count(text, lang("C")), counts(0, 0, 2));
    }

    #[test]
    fn block_comment_opened_and_closed_midline() {
        let text = "int x; /* mid */ int y;\n";
        assert_eq!(count(text, lang("C")), counts(0, 0, 1));
        let text = "/* only comment */\n";
        assert_eq!(count(text, lang("C")), counts(0, 1, 0));
    }

    #[test]
    fn unterminated_block_comment_runs_to_eof() {
        let text = "/* open\nstill comment\nand still";
        assert_eq!(count(text, lang("C")), counts(0, 3, 0));
    }

    #[test]
    fn nested_block_comments() {
        let text = "/* outer /* inner */ still outer */\nfn f() {}\n";
        assert_eq!(count(text, lang("Rust")), counts(0, 1, 1));
    }

    #[test]
    fn non_nesting_language_closes_at_first_closer() {
        // In C the first */ ends the comment, so the rest is code.
        let text = "/* a /* b */ int x; */\n";
        assert_eq!(count(text, lang("C")), counts(0, 0, 1));
    }

    #[test]
    fn comment_marker_inside_string_is_code() {
        let text = "s = \"not a # comment\"\n";
        assert_eq!(count(text, lang("Python")), counts(0, 0, 1));
        let text = "char* s = \"/* not open */\";\nint x;\n";
        assert_eq!(count(text, lang("C")), counts(0, 0, 2));
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let text = "s = \"a \\\" b # still string\"\n";
        assert_eq!(count(text, lang("Python")), counts(0, 0, 1));
    }

    #[test]
    fn multiline_string_contents_are_code() {
        let text = "s = \"\"\"\nline // not comment\n\"\"\"\n";
        assert_eq!(count(text, lang("Python")), counts(0, 0, 3));
    }

    #[test]
    fn blank_line_inside_multiline_string_is_blank() {
        let text = "s = \"\"\"\n\ntext\n\"\"\"\n";
        assert_eq!(count(text, lang("Python")), counts(1, 0, 3));
    }

    #[test]
    fn unterminated_plain_string_does_not_leak() {
        // A single-quoted string with no closer ends at the line break.
        let text = "echo 'oops\n# comment\n";
        assert_eq!(count(text, lang("Bourne Shell")), counts(0, 1, 1));
    }

    #[test]
    fn shebang_counts_as_code() {
        let text = "#!/usr/bin/env python3\n# comment\nx = 1\n";
        assert_eq!(count(text, lang("Python")), counts(0, 1, 2));
    }

    #[test]
    fn shebang_only_file_is_one_code_line() {
        assert_eq!(count("#!/bin/sh\n", lang("Bourne Shell")), counts(0, 0, 1));
    }

    #[test]
    fn lua_block_comment_wins_over_line_marker() {
        let text = "--[[ block\nstill block ]]\nprint(1) -- trailing\n";
        assert_eq!(count(text, lang("Lua")), counts(0, 2, 1));
    }

    #[test]
    fn ruby_begin_end_only_at_column_zero() {
        // =begin mid-line is ordinary code, not a comment opener.
        let text = "x =begin_marker\n=begin\nnotes\n=end\ny = 1\n";
        assert_eq!(count(text, lang("Ruby")), counts(0, 3, 2));

        // An indented =end does not close the block.
        let text = "=begin\n  =end\n=end\n";
        assert_eq!(count(text, lang("Ruby")), counts(0, 3, 0));
    }

    #[test]
    fn haskell_nested_blocks() {
        let text = "{- a {- b -} c -}\nmain = return ()\n";
        assert_eq!(count(text, lang("Haskell")), counts(0, 1, 1));
    }

    #[test]
    fn json_has_no_comments() {
        let text = "{\n  \"a\": 1\n}\n";
        assert_eq!(count(text, lang("JSON")), counts(0, 0, 3));
    }

    #[test]
    fn html_block_comments() {
        let text = "<!-- header -->\n<p>hi</p>\n<!--\nmultiline\n-->\n";
        assert_eq!(count(text, lang("HTML")), counts(0, 4, 1));
    }

    #[test]
    fn pascal_brace_comments() {
        let text = "{ comment }\nbegin end.\n(* other *)\n";
        assert_eq!(count(text, lang("Pascal")), counts(0, 2, 1));
    }

    #[test]
    fn crlf_terminators() {
        let text = "# c\r\nx = 1\r\n\r\n";
        assert_eq!(count(text, lang("Python")), counts(1, 1, 1));
    }

    #[test]
    fn count_is_pure() {
        let text = "// a\nfn main() {}\n\n/* b */\n";
        let spec = lang("Rust");
        assert_eq!(count(text, spec), count(text, spec));
    }
}
