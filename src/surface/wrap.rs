//! Greedy word wrapping against an arbitrary width function.

/// Split `text` into lines no wider than `max_width`.
///
/// Whitespace runs collapse to a single space. Breaks happen between words;
/// a word that is wider than `max_width` on its own is broken between
/// characters. Blank input yields no lines.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            place_word(word, max_width, &measure, &mut lines, &mut current);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            place_word(word, max_width, &measure, &mut lines, &mut current);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Start a fresh line with `word`, splitting it by characters if it cannot
/// fit on a line of its own. The unfinished tail is left in `current`.
fn place_word<F>(
    word: &str,
    max_width: f32,
    measure: &F,
    lines: &mut Vec<String>,
    current: &mut String,
) where
    F: Fn(&str) -> f32,
{
    if measure(word) <= max_width {
        current.push_str(word);
        return;
    }

    for ch in word.chars() {
        current.push(ch);
        if measure(current) > max_width && current.chars().count() > 1 {
            current.pop();
            lines.push(std::mem::take(current));
            current.push(ch);
        }
    }
}
