use flashmaster_lib::flashcards::{ReviewStats, SchedulingState};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Scheduling state label, colored like the progress bar segments
pub fn state_label(state: SchedulingState, use_color: bool) -> String {
    let color = match state {
        SchedulingState::New => Color::BLUE,
        SchedulingState::Learning => Color::YELLOW,
        SchedulingState::Review => Color::MAGENTA,
    };
    paint(&state.to_string(), color, use_color)
}

/// Render the study progress bar: completed, new, learning, due
pub fn progress_bar(stats: &ReviewStats, width: usize, use_color: bool) -> String {
    if stats.total_cards == 0 {
        return paint(&"\u{2591}".repeat(width), Color::DIM, use_color);
    }

    let segments = [
        (stats.completed_cards, Color::MAGENTA),
        (stats.new_cards, Color::BLUE),
        (stats.learning_cards, Color::YELLOW),
        (stats.due_cards, Color::GREEN),
    ];

    let mut cells: Vec<usize> = segments
        .iter()
        .map(|(count, _)| count * width / stats.total_cards)
        .collect();
    // Rounding leftovers go to the largest segment
    let leftover = width.saturating_sub(cells.iter().sum());
    if let Some(largest) = (0..segments.len()).max_by_key(|&i| segments[i].0) {
        cells[largest] += leftover;
    }

    let mut bar = String::new();
    for ((_, color), n) in segments.iter().zip(cells) {
        if n > 0 {
            bar.push_str(&paint(&"\u{2588}".repeat(n), color, use_color));
        }
    }
    bar
}

/// Truncate to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= width {
        flat
    } else {
        let kept: String = flat.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
