//! Text measurement for layout. plotters cannot measure glyphs before
//! drawing, so widths are estimated from the character count.

/// Average DejaVu Sans advance is 0.6 em.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    (text.chars().count() as u32 * font_px * 3).div_ceil(5)
}

/// Widest line and line count of a possibly multi-line label.
pub fn block_size_px(text: &str, font_px: u32) -> (u32, usize) {
    let width = text
        .lines()
        .map(|l| estimate_text_width_px(l, font_px))
        .max()
        .unwrap_or(0);
    (width, text.lines().count().max(1))
}

/// Cut `text` to `max_px`, ending in an ellipsis when shortened.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let budget = max_px.saturating_sub(estimate_text_width_px("…", font_px));
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) > budget {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

/// Greedy word wrap; words wider than a line are split by characters.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    if max_px <= font_px {
        return vec![truncate_to_width(text, font_px, max_px)];
    }
    let fits = |s: &str| estimate_text_width_px(s, font_px) <= max_px;
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if fits(&candidate) {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if fits(word) {
            cur = word.to_string();
            continue;
        }
        for ch in word.chars() {
            cur.push(ch);
            if !fits(&cur) {
                cur.pop();
                lines.push(std::mem::take(&mut cur));
                cur.push(ch);
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_words_then_characters() {
        // 10 px font: 6 px per character, 60 px fits 10 characters.
        assert_eq!(wrap_text_to_width("alpha beta gamma", 10, 60), ["alpha beta", "gamma"]);
        assert_eq!(wrap_text_to_width("abcdefghijkl", 10, 60), ["abcdefghij", "kl"]);
    }

    #[test]
    fn truncation_keeps_budget() {
        let t = truncate_to_width("a long legend label", 10, 60);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 10) <= 60);
        assert_eq!(block_size_px("v\ngroup", 10), (30, 2));
    }
}
