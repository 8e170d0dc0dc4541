//! The entry list.

use burrow_core::{BrowserConfig, Entry};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
#[cfg(test)]
use unicode_width::UnicodeWidthStr;

use crate::app::Screen;
use crate::theme::Theme;

pub(super) fn draw(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>, theme: &Theme) {
    let view = screen.view;
    let top = view.top();
    let visible = (area.height as usize).min(view.height());

    let lines: Vec<Line<'_>> = view
        .entries()
        .iter()
        .enumerate()
        .skip(top)
        .take(visible)
        .map(|(index, entry)| {
            row_line(
                entry,
                index == view.selection(),
                screen.config,
                theme,
                area.width as usize,
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// One entry row.
///
/// The selected row starts with the pointer. Marked rows that are not
/// selected start with the mark symbol. Unless `indent_selection` is set,
/// every other row is indented to line up with the selected one.
pub fn row_line<'a>(
    entry: &'a Entry,
    selected: bool,
    config: &BrowserConfig,
    theme: &Theme,
    width: usize,
) -> Line<'a> {
    let name_style = if entry.marked {
        theme.entry(entry.kind()).patch(theme.marked)
    } else {
        theme.entry(entry.kind())
    };
    let indent = config.pointer_width();

    let prefix = if selected {
        let mut style = theme.pointer;
        if config.bold_pointer && theme.is_bold(entry.kind()) {
            style = style.add_modifier(Modifier::BOLD);
        }
        if entry.marked {
            style = style.patch(theme.marked);
        }
        Span::styled(format!("{} ", config.pointer), style)
    } else if entry.marked {
        let symbol = config.mark_symbol.to_string();
        let text = if config.indent_selection {
            symbol
        } else {
            format!("{symbol:<indent$}")
        };
        Span::styled(text, theme.marked)
    } else if config.indent_selection {
        Span::raw("")
    } else {
        Span::raw(" ".repeat(indent))
    };

    let mut name = Span::styled(entry.display_name(), name_style);
    if selected && config.invert_selection && !config.invert_full_selection {
        name = name.patch_style(Style::new().add_modifier(Modifier::REVERSED));
    }

    let mut line = Line::from(vec![prefix, name]);
    if selected && config.invert_selection && config.invert_full_selection {
        let used = line.width();
        if used < width {
            line.push_span(Span::raw(" ".repeat(width - used)));
        }
        line = line.patch_style(Style::new().add_modifier(Modifier::REVERSED));
    }
    line
}
