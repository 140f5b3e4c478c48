/// Split `text` into exactly `rows` lines of roughly equal length.
///
/// Words are never broken and keep their order. Each line takes words while
/// it stays within the remaining length divided by the remaining rows; the
/// last line takes whatever is left. With fewer words than rows the trailing
/// lines are empty.
pub fn balance_lines(text: &str, rows: usize) -> Vec<String> {
    let rows = rows.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut lines = Vec::with_capacity(rows);
    let mut next = 0;

    for row in 0..rows {
        let remaining_rows = rows - row;
        if remaining_rows == 1 {
            lines.push(words[next..].join(" "));
            next = words.len();
            continue;
        }
        let target = joined_len(&words[next..]) as f32 / remaining_rows as f32;
        let mut line = String::new();
        let mut line_len = 0;
        while let Some(word) = words.get(next) {
            let word_len = word.chars().count();
            if line_len > 0 && (line_len + 1 + word_len) as f32 > target {
                break;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(word);
            line_len += word_len;
            next += 1;
        }
        lines.push(line);
    }

    lines
}

/// `balance_lines` without the trailing empty rows, i.e. what gets drawn.
pub fn visible_lines(text: &str, rows: usize) -> Vec<String> {
    let mut lines = balance_lines(text, rows);
    while lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn joined_len(words: &[&str]) -> usize {
    let chars: usize = words.iter().map(|word| word.chars().count()).sum();
    chars + words.len().saturating_sub(1)
}
