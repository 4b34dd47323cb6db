use chrono::{DateTime, Utc};
use rat_widget::focus::HasFocus;
use ratatui::style::{Color, Style, Stylize};
use textwrap::core::display_width;

pub fn get_border_style(state: &impl HasFocus) -> Style {
    if state.is_focused() {
        Style::new().fg(Color::Cyan)
    } else {
        Style::new().dim()
    }
}

/// Coarse age of a timestamp: "Just now", "5m ago", "3h ago", "2d ago".
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// Cuts `input` to at most `max_width` display columns, ending with an ellipsis when cut.
pub fn truncate(input: &str, max_width: usize) -> String {
    if display_width(input) <= max_width {
        return input.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in input.chars() {
        let w = display_width(ch.encode_utf8(&mut [0; 4]));
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn formats_relative_times() {
        let now = Utc::now();
        assert_eq!(relative_time(now - TimeDelta::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - TimeDelta::minutes(13), now), "13m ago");
        assert_eq!(relative_time(now - TimeDelta::hours(5), now), "5h ago");
        assert_eq!(relative_time(now - TimeDelta::hours(49), now), "2d ago");
        // clock skew
        assert_eq!(relative_time(now + TimeDelta::minutes(3), now), "Just now");
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer line", 8), "a longe…");
        assert_eq!(truncate("😀😀😀", 5), "😀😀…");
    }
}
