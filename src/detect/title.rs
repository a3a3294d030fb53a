//! Picks a display title out of raw OCR text.
//!
//! Lines are scanned top to bottom. Code is taken verbatim (truncated), menu bars
//! and fragments are skipped, and the first prose line that survives cleaning
//! wins. With nothing usable the app name is returned.

const MAX_CODE_TITLE_CHARS: usize = 50;
const MIN_LINE_CHARS: usize = 4;
const MENU_BAR_STOP_WORD_HITS: usize = 2;

const STOP_WORDS: &[&str] = &[
    "File", "Edit", "View", "History", "Window", "Help", "Chrome", "Safari", "http", "https",
    "www", "com", "Login",
];

const CODE_INDICATORS: &[&str] = &[
    "func ", "var ", "let ", "const ", "class ", "struct ", "import ", "#include", "def ",
    "pub fn", "=>", "return", "{", "}", "://", "git",
];

const DECORATIVE_GLYPHS: &[char] = &['|', '—', '•', '»', '«'];

pub fn derive_title(ocr_text: &str, fallback_app_name: &str) -> String {
    let lines = ocr_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    for line in lines {
        if is_code(line) {
            return line.chars().take(MAX_CODE_TITLE_CHARS).collect();
        }

        if line.chars().count() < MIN_LINE_CHARS || is_menu_bar(line) {
            continue;
        }

        let cleaned = strip_decorations(line);
        if cleaned.chars().count() > MIN_LINE_CHARS {
            return cleaned;
        }
    }

    fallback_app_name.to_string()
}

fn is_code(line: &str) -> bool {
    if CODE_INDICATORS
        .iter()
        .any(|indicator| line.contains(indicator))
    {
        return true;
    }

    let camel_case = line.chars().any(char::is_uppercase)
        && line.chars().any(char::is_lowercase)
        && !line.contains(' ');
    let snake_case = line.contains('_');

    camel_case || snake_case
}

fn is_menu_bar(line: &str) -> bool {
    line.split_whitespace()
        .filter(|word| STOP_WORDS.contains(word))
        .count()
        >= MENU_BAR_STOP_WORD_HITS
}

fn strip_decorations(line: &str) -> String {
    let without_glyphs: String = line
        .chars()
        .filter(|ch| !DECORATIVE_GLYPHS.contains(ch))
        .collect();

    without_glyphs.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_line_is_returned_verbatim() {
        let line = "func doWork() { return }";
        assert_eq!(derive_title(line, "Xcode"), line);
    }

    #[test]
    fn long_code_line_is_truncated_to_fifty_chars() {
        let line = "let configuration = ServiceConfiguration(timeout: 30, retries: 5)";
        let title = derive_title(line, "Xcode");
        assert_eq!(title.chars().count(), 50);
        assert!(line.starts_with(&title));
    }

    #[test]
    fn menu_bar_is_skipped_and_glyphs_are_stripped() {
        let text = "File Edit View\nTotal: $42.00 — Thank you";
        assert_eq!(derive_title(text, "Receipts"), "Total: $42.00 Thank you");
    }

    #[test]
    fn falls_back_to_app_name_for_chrome_only() {
        let text = "File Edit View History\nSafari Window Help\nok";
        assert_eq!(derive_title(text, "Safari"), "Safari");
    }

    #[test]
    fn short_code_fragment_beats_length_filter() {
        assert_eq!(derive_title("{}\nQuarterly planning notes", "Notes"), "{}");
    }

    #[test]
    fn snake_and_camel_case_count_as_code() {
        assert_eq!(derive_title("user_id", "App"), "user_id");
        assert_eq!(derive_title("getUserName", "App"), "getUserName");
    }

    #[test]
    fn line_that_is_only_decoration_is_skipped() {
        let text = "» | « •\nMeeting agenda for Monday";
        assert_eq!(derive_title(text, "Calendar"), "Meeting agenda for Monday");
    }

    #[test]
    fn empty_text_uses_fallback() {
        assert_eq!(derive_title("", "Finder"), "Finder");
        assert_eq!(derive_title("  \n\t\n", "Finder"), "Finder");
    }

    #[test]
    fn is_deterministic() {
        let text = "Inbox | 3 unread\nweekly report";
        assert_eq!(derive_title(text, "Mail"), derive_title(text, "Mail"));
        assert_eq!(derive_title(text, "Mail"), "Inbox 3 unread");
    }
}
