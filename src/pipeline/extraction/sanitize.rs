/// Sanitize extracted text before structuring.
///
/// Strips control characters (tabs and newlines survive), normalizes line
/// endings, trims trailing whitespace and collapses runs of blank lines to
/// one. Leading indentation and in-line spacing are kept: table detection
/// and the formatting checks read them.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let cleaned: String = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .filter(|c| *c != '\u{FEFF}')
        .collect();

    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in cleaned.lines() {
        let line = line.trim_end();
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
