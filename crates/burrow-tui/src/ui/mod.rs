//! Drawing the screen with ratatui.

mod list;

use std::path::Path;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::Screen;
use crate::render::StatusLine;
use crate::theme::Theme;

/// Layout areas for the screen.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
}

impl AppLayout {
    /// Compute layout from terminal area.
    pub fn new(area: Rect) -> Self {
        let [header, main, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        Self {
            header,
            main,
            footer,
        }
    }
}

/// Draw the whole screen.
pub fn draw(frame: &mut Frame<'_>, screen: &Screen<'_>, theme: &Theme) {
    let layout = AppLayout::new(frame.area());

    let header = header_text(screen.view_index, screen.view.wd(), screen.home);
    frame.render_widget(
        Paragraph::new(Line::styled(header, theme.header)),
        layout.header,
    );

    list::draw(frame, layout.main, screen, theme);
    draw_footer(frame, layout.footer, screen, theme);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>, theme: &Theme) {
    if let Some((kind, input)) = screen.prompt {
        let label = format!("{kind}: ");
        let typed: String = input.buffer().chars().take(input.cursor()).collect();
        let cursor_x = label.width() + typed.width();
        let line = Line::from(vec![
            Span::styled(label, theme.prompt),
            Span::raw(input.buffer().to_string()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        let x = area
            .x
            .saturating_add(cursor_x as u16)
            .min(area.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, area.y));
        return;
    }

    if let Some(banner) = screen.view.banner() {
        frame.render_widget(
            Paragraph::new(Line::styled(banner.to_string(), theme.banner(banner.severity))),
            area,
        );
        return;
    }

    let left = status_text(screen.view.status());
    let right = screen
        .view
        .current()
        .map(|e| format!("{} ", e.kind().label()))
        .unwrap_or_default();
    let gap = (area.width as usize).saturating_sub(left.width() + right.width());
    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(gap)),
        Span::raw(right),
    ])
    .style(theme.status);
    frame.render_widget(Paragraph::new(line), area);
}

/// ` {view}: {directory}`, with the home directory shown as `~`.
pub fn header_text(view_index: usize, wd: &Path, home: Option<&Path>) -> String {
    let shown = match home.and_then(|home| wd.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => wd.display().to_string(),
    };
    format!(" {}: {shown}", view_index + 1)
}

/// ` {position}/{total}`, plus the number of marks when there are any.
pub fn status_text(status: StatusLine) -> String {
    let position = if status.total == 0 { 0 } else { status.position + 1 };
    let mut text = format!(" {position}/{}", status.total);
    if status.marks > 0 {
        text.push_str(&format!(" ({} marked)", status.marks));
    }
    text
}
