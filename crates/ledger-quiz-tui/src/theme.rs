use clap::ValueEnum;
use crossterm::style::Color;

/// Selectable theme names
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
}

impl ThemeName {
    /// Next theme in the `t` key cycle
    pub fn next(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::HighContrast,
            ThemeName::HighContrast => ThemeName::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeName::Dark => "Dark",
            ThemeName::Light => "Light",
            ThemeName::HighContrast => "High contrast",
        }
    }
}

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub bg: Color,
    /// Default text color
    pub fg: Color,
    /// Frame and separator color
    pub border: Color,
    /// Highlighted answer background
    pub selected_bg: Color,
    /// Correct answers, saved scores
    pub success: Color,
    /// Wrong answers, failures
    pub error: Color,
    /// Secondary text color
    pub info: Color,
    /// Key binding and score color
    pub key: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
            ThemeName::HighContrast => Self::high_contrast(),
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb { r: 20, g: 22, b: 30 },
            fg: Color::Rgb { r: 230, g: 230, b: 240 },
            border: Color::Rgb { r: 70, g: 75, b: 90 },
            selected_bg: Color::Rgb { r: 70, g: 90, b: 140 },
            success: Color::Rgb { r: 90, g: 255, b: 130 },
            error: Color::Rgb { r: 255, g: 90, b: 90 },
            info: Color::Rgb { r: 160, g: 165, b: 185 },
            key: Color::Rgb { r: 255, g: 210, b: 100 },
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb { r: 248, g: 248, b: 252 },
            fg: Color::Rgb { r: 30, g: 30, b: 40 },
            border: Color::Rgb { r: 180, g: 180, b: 195 },
            selected_bg: Color::Rgb { r: 180, g: 200, b: 255 },
            success: Color::Rgb { r: 40, g: 160, b: 60 },
            error: Color::Rgb { r: 220, g: 50, b: 50 },
            info: Color::Rgb { r: 90, g: 90, b: 110 },
            key: Color::Rgb { r: 200, g: 120, b: 20 },
        }
    }

    /// High contrast theme
    pub fn high_contrast() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::White,
            border: Color::Grey,
            selected_bg: Color::Blue,
            success: Color::Green,
            error: Color::Red,
            info: Color::Grey,
            key: Color::Yellow,
        }
    }
}
