//! Outbound text shaping: chunking to the platform limit and mention sanitising
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Count characters instead of bytes, add mention sanitising
//! - 1.0.0: Initial line-aware chunker

/// Maximum characters in one outbound text message
pub const MESSAGE_LIMIT: usize = 2000;
/// Maximum characters in an embed description
pub const EMBED_LIMIT: usize = 4096;

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Split text into pieces of at most `max_chars` characters, preferring line breaks
///
/// - Never splits inside a UTF-8 character
/// - Keeps whole lines together when they fit
/// - Falls back to hard splits for lines longer than the limit
///
/// Concatenating the chunks (re-joining split lines with `\n`) preserves
/// the original order of the text.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // `current` holds at least one line, possibly a blank one
    let mut has_line = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if has_line { line_len + 1 } else { line_len };

        if current_len + needed <= max_chars {
            if has_line {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            has_line = true;
            continue;
        }

        // A chunk made of a lone blank line cannot be sent
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.clear();
        current_len = 0;

        if line_len > max_chars {
            let mut pieces = split_chars(line, max_chars);
            // Last piece may still share a chunk with the following lines
            if let Some(tail) = pieces.pop() {
                chunks.extend(pieces);
                current_len = tail.chars().count();
                current = tail;
            }
        } else {
            current.push_str(line);
            current_len = line_len;
        }
        has_line = true;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_chars(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Chunk text for plain message sends
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Truncate text to the embed description limit, adding an ellipsis if cut
pub fn truncate_for_embed(text: &str) -> String {
    if text.chars().count() <= EMBED_LIMIT {
        return text.to_string();
    }
    let kept: String = text.chars().take(EMBED_LIMIT - 3).collect();
    format!("{kept}...")
}

/// Neutralise mass mentions so echoed user input cannot ping everyone
pub fn sanitise_mentions(text: &str) -> String {
    text.replace("@everyone", &format!("@{ZERO_WIDTH_SPACE}everyone"))
        .replace("@here", &format!("@{ZERO_WIDTH_SPACE}here"))
}
