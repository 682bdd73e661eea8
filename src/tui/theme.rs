use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders};

/// Colors and styles used by every panel.
///
/// Built once when the UI starts and handed to render functions by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub accent_dim: Color,
    pub highlight_bg: Color,
    pub zebra_bg: Color,
    pub border: Color,
    pub text: Color,
    pub dim_text: Color,
    pub surface_bg: Color,
    pub header_bg: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // warm orange palette
        Theme {
            accent: Color::Rgb(255, 140, 0),
            accent_dim: Color::Rgb(180, 100, 0),
            highlight_bg: Color::Rgb(50, 40, 30),
            zebra_bg: Color::Rgb(28, 26, 24),
            border: Color::Rgb(80, 75, 70),
            text: Color::Rgb(200, 205, 215),
            dim_text: Color::Rgb(120, 110, 100),
            surface_bg: Color::Rgb(22, 20, 18),
            header_bg: Color::Rgb(30, 28, 25),
            success: Color::Rgb(100, 220, 150),
            error: Color::Rgb(240, 100, 100),
            warning: Color::Rgb(240, 180, 80),
        }
    }
}

impl Theme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.dim_text)
    }

    pub fn placeholder(&self) -> Style {
        Style::default()
            .fg(self.dim_text)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.accent)
                .bg(self.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text).bg(self.zebra_bg)
        }
    }

    pub fn status(&self, is_error: bool) -> Style {
        if is_error {
            Style::default().fg(self.error)
        } else {
            Style::default().fg(self.success)
        }
    }

    /// Key cap followed by its description, e.g. `tab switch focus`.
    pub fn hint(&self, key: &str, desc: &str) -> Vec<Span<'static>> {
        vec![
            Span::styled(
                key.to_string(),
                Style::default()
                    .fg(self.accent_dim)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}  ", desc), self.muted()),
        ]
    }

    pub fn panel_block(&self, label: &str, focused: bool) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                Style::default().fg(self.accent).bg(self.surface_bg)
            } else {
                Style::default().fg(self.border).bg(self.surface_bg)
            })
            .style(Style::default().bg(self.surface_bg))
            .title(Span::styled(
                format!(" {} ", label),
                Style::default().fg(if focused { self.accent } else { self.dim_text }),
            ))
    }
}
