//! Single-line CSV tokenizer
//!
//! The dialect is comma-delimited with optional double-quote grouping. Quotes
//! only toggle grouping and never appear in the output; a doubled quote is not
//! an escape. An unterminated quote keeps the rest of the line grouped.

/// Field delimiter
const DELIMITER: char = ',';

/// Grouping character
const QUOTE: char = '"';

/// Splits one CSV line into trimmed fields.
///
/// The final accumulator is always flushed, so `"a,"` yields `["a", ""]` and
/// a line of `n` commas yields `n + 1` empty fields.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
