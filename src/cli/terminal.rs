//! Coloured terminal output, plain when stdout cannot show colour

use std::sync::OnceLock;

use owo_colors::{OwoColorize, Style, colors::css};

/// Whether stdout shows colour, detected once per process.
fn colour_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| supports_color::on(supports_color::Stream::Stdout).is_some())
}

fn paint(text: &str, style: Style) -> String {
    if colour_enabled() {
        text.style(style).to_string()
    } else {
        text.to_owned()
    }
}

/// Output styles of the `codify` commands.
pub trait Colorize {
    /// A freshly issued document code (bold green)
    fn issued(&self) -> String;
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn issued(&self) -> String {
        paint(self.as_ref(), Style::new().bold().fg::<css::Green>())
    }

    fn success(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Green>())
    }

    fn info(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::LightBlue>())
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), Style::new().dimmed())
    }
}
