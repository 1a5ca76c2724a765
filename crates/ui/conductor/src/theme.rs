use std::env;

use form_engine::{BadgeMeta, Tone};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    TrueColor,
    Ansi16,
}

impl ColorMode {
    pub fn detect() -> Self {
        if let Ok(v) = env::var("CONDUCTOR_COLOR_MODE") {
            return match v.to_ascii_lowercase().as_str() {
                "24bit" | "truecolor" | "rgb" => ColorMode::TrueColor,
                _ => ColorMode::Ansi16,
            };
        }
        match env::var("COLORTERM") {
            Ok(v) if v.contains("truecolor") || v.contains("24bit") => ColorMode::TrueColor,
            _ => ColorMode::Ansi16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UiGroup {
    Border,
    Dimmed,
    Title,
    Label,
    Value,
    Focused,
    Disabled,
    Error,
    Help,
    Success,
    Warn,
    Info,
}

#[derive(Clone, Copy, Debug)]
struct Rgb(u8, u8, u8);

#[derive(Clone, Debug)]
pub struct Theme {
    pub mode: ColorMode,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ColorMode::detect(),
        }
    }
}

impl Theme {
    pub fn style(&self, group: UiGroup) -> Style {
        let base = Style::default();
        match group {
            UiGroup::Border => base.fg(self.color(Rgb(59, 63, 81), Color::DarkGray)),
            UiGroup::Dimmed => base.fg(self.color(Rgb(107, 112, 137), Color::DarkGray)),
            UiGroup::Title => base
                .fg(self.color(Rgb(192, 202, 245), Color::White))
                .add_modifier(Modifier::BOLD),
            UiGroup::Label => base.fg(self.color(Rgb(192, 202, 245), Color::White)),
            UiGroup::Value => base.fg(self.color(Rgb(125, 207, 255), Color::Cyan)),
            UiGroup::Focused => base.fg(Color::Black).bg(Color::White),
            UiGroup::Disabled => base
                .fg(self.color(Rgb(107, 112, 137), Color::DarkGray))
                .add_modifier(Modifier::ITALIC),
            UiGroup::Error => base.fg(self.color(Rgb(247, 118, 142), Color::LightRed)),
            UiGroup::Help => base.fg(self.color(Rgb(107, 112, 137), Color::Gray)),
            UiGroup::Success => base
                .fg(self.color(Rgb(158, 206, 106), Color::LightGreen))
                .add_modifier(Modifier::BOLD),
            UiGroup::Warn => base
                .fg(self.color(Rgb(224, 175, 104), Color::Yellow))
                .add_modifier(Modifier::BOLD),
            UiGroup::Info => base.fg(self.color(Rgb(122, 162, 247), Color::LightBlue)),
        }
    }

    pub fn tone(&self, tone: Tone) -> Style {
        match tone {
            Tone::Neutral => self.style(UiGroup::Dimmed),
            Tone::Info => self.style(UiGroup::Info),
            Tone::Success => self.style(UiGroup::Success),
            Tone::Warning => self.style(UiGroup::Warn),
            Tone::Danger => self.style(UiGroup::Error),
        }
    }

    /// Badge as a styled span: glyph plus label.
    pub fn badge(&self, meta: &BadgeMeta) -> Span<'static> {
        Span::styled(
            format!("{} {}", icon_glyph(meta.icon), meta.label),
            self.tone(meta.tone),
        )
    }

    fn color(&self, rgb: Rgb, fallback: Color) -> Color {
        match self.mode {
            ColorMode::TrueColor => Color::Rgb(rgb.0, rgb.1, rgb.2),
            ColorMode::Ansi16 => fallback,
        }
    }
}

/// Glyph for a badge icon key; unknown keys get a bullet.
pub fn icon_glyph(key: &str) -> &'static str {
    match key {
        "check" => "✔",
        "cross" => "✘",
        "clock" => "◷",
        "pause" => "⏸",
        "undo" => "↺",
        "shield" => "⛨",
        "music" => "♪",
        "user" => "☺",
        "calendar" => "▦",
        "archive" => "▤",
        _ => "•",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_span_uses_tone_and_glyph() {
        let theme = Theme {
            mode: ColorMode::Ansi16,
        };
        let span = theme.badge(&BadgeMeta::new("Paid", Tone::Success, "check"));
        assert_eq!(span.content, "✔ Paid");
        assert_eq!(span.style.fg, Some(Color::LightGreen));
    }

    #[test]
    fn unknown_icons_fall_back() {
        assert_eq!(icon_glyph("rocket"), "•");
    }
}
