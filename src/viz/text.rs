//! Text measurement and truncation for axis labels.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Shorten `text` so it fits `max_px`, ending with a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out: String = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        "…".to_string()
    } else {
        format!("{trimmed}…")
    }
}
