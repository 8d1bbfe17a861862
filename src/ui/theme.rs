use ratatui::style::Color;

/// Theme configuration for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    /// Star outline
    pub outline: Color,
    /// Filled dot on the current vertex
    pub marker: Color,
    /// Idle vertices
    pub vertex: Color,
    pub border: Color,
    pub highlight: Color,
    pub dimmed: Color,
    pub button_bg: Color,
}

impl Theme {
    /// Default theme - white star and red dot on the terminal background
    pub fn default_theme() -> Self {
        Self {
            name: "default",
            bg: Color::Reset,
            fg: Color::Reset,
            outline: Color::White,
            marker: Color::Red,
            vertex: Color::DarkGray,
            border: Color::White,
            highlight: Color::Magenta,
            dimmed: Color::DarkGray,
            button_bg: Color::Rgb(51, 51, 51),
        }
    }

    /// Classic green CRT phosphor look
    pub fn phosphor_green() -> Self {
        Self {
            name: "phosphor-green",
            bg: Color::Black,
            fg: Color::Rgb(0, 255, 0),
            outline: Color::Rgb(0, 200, 0),
            marker: Color::Rgb(180, 255, 180),
            vertex: Color::Rgb(0, 80, 0),
            border: Color::Rgb(0, 180, 0),
            highlight: Color::Rgb(150, 255, 150),
            dimmed: Color::Rgb(0, 60, 0),
            button_bg: Color::Rgb(0, 40, 0),
        }
    }

    /// Warm amber monochrome CRT
    pub fn amber_crt() -> Self {
        Self {
            name: "amber-crt",
            bg: Color::Black,
            fg: Color::Rgb(255, 176, 0),
            outline: Color::Rgb(200, 140, 0),
            marker: Color::Rgb(255, 220, 150),
            vertex: Color::Rgb(80, 55, 0),
            border: Color::Rgb(180, 125, 0),
            highlight: Color::Rgb(255, 220, 150),
            dimmed: Color::Rgb(60, 40, 0),
            button_bg: Color::Rgb(50, 35, 0),
        }
    }

    /// Stark black and white high contrast
    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast",
            bg: Color::Black,
            fg: Color::White,
            outline: Color::White,
            marker: Color::White,
            vertex: Color::Rgb(60, 60, 60),
            border: Color::White,
            highlight: Color::White,
            dimmed: Color::Rgb(80, 80, 80),
            button_bg: Color::Rgb(40, 40, 40),
        }
    }

    /// Get theme by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_theme()),
            "phosphor-green" => Some(Self::phosphor_green()),
            "amber-crt" => Some(Self::amber_crt()),
            "high-contrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    /// List all available theme names
    pub fn available_themes() -> &'static [&'static str] {
        &["default", "phosphor-green", "amber-crt", "high-contrast"]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
