//! Terminal output sanitization
//!
//! Names, authors and descriptions come from third-party archives and are printed
//! verbatim by the CLI. They are passed through [`strip_control_sequences`] first so that an
//! `info.json` cannot recolor the terminal, move the cursor or set the window title.

/// Strip ANSI CSI and OSC escape sequences and other control characters.
///
/// Tabs and newlines are kept.
///
/// # Examples
///
/// ```
/// use mod_triage::utils::terminal::strip_control_sequences;
///
/// let name = "\x1b[31mRed Car\x1b[0m";
/// assert_eq!(strip_control_sequences(name), "Red Car");
/// ```
pub fn strip_control_sequences(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            match chars.peek() {
                // CSI: ESC [ params final-letter
                Some('[') => {
                    chars.next();
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
                // OSC: ESC ] ... terminated by BEL or ESC \
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        if ch.is_control() && ch != '\t' && ch != '\n' {
            continue;
        }
        result.push(ch);
    }

    result
}
