//! Playlist detail rendering (header, page controls, items, item details)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use super::utils::{calculate_num_width, render_scrollable_list, truncate_string};
use crate::model::{ActiveSection, PageState, PaginationControls, UiState};
use crate::youtube::{Playlist, PlaylistItem};

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    selected: Option<&Playlist>,
    page: &PageState,
    ui_state: &UiState,
) {
    let is_focused = ui_state.active_section == ActiveSection::Items;
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let Some(playlist) = selected else {
        let content = Paragraph::new("Select a playlist and press Enter to open it\n\nUse Tab to switch sections\nUse ↑/↓ to move")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
        frame.render_widget(content, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header + page controls
            Constraint::Min(0),    // Items
            Constraint::Length(7), // Item details
        ])
        .split(area);

    render_header(frame, chunks[0], playlist, &page.pagination(), border_style);

    let items = page.page.as_ref().map(|p| p.items()).unwrap_or_default();
    let title = match page.page.as_ref().and_then(|p| p.total_results()) {
        Some(total) => format!(" Items ({} total) ", total),
        None => " Items ".to_string(),
    };
    let items_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    if page.is_loading {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Yellow))
            .block(items_block);
        frame.render_widget(loading, chunks[1]);
    } else if items.is_empty() {
        let empty = Paragraph::new("No items on this page")
            .style(Style::default().fg(Color::DarkGray))
            .block(items_block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let width = chunks[1].width.saturating_sub(4) as usize;
        let list_items = render_item_rows(items, ui_state.item_cursor, is_focused, width);
        render_scrollable_list(frame, chunks[1], list_items, ui_state.item_cursor, items_block);
    }

    render_item_details(frame, chunks[2], items.get(ui_state.item_cursor));
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    playlist: &Playlist,
    controls: &PaginationControls,
    border_style: Style,
) {
    let enabled = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(Span::styled(
            format!("{} ({} videos)", playlist.title(), playlist.item_count()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            playlist.description().unwrap_or("No description").to_string(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(vec![
            Span::styled(
                "◀ Prev",
                if controls.prev_enabled() { enabled } else { disabled },
            ),
            Span::raw("   "),
            Span::styled(
                "Next ▶",
                if controls.next_enabled() { enabled } else { disabled },
            ),
            Span::styled(
                "   D: delete playlist | x: remove item | a: add video",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];

    let header = Paragraph::new(lines).block(
        Block::default()
            .padding(Padding::horizontal(1))
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(header, area);
}

fn render_item_rows(
    items: &[PlaylistItem],
    cursor: usize,
    is_focused: bool,
    content_width: usize,
) -> Vec<ListItem<'static>> {
    let num_width = calculate_num_width(items.len());
    let channel_width = (content_width / 3).min(24);
    let title_width = content_width.saturating_sub(num_width + channel_width + 4);

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == cursor && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == cursor {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let position = item
                .snippet
                .as_ref()
                .and_then(|s| s.position)
                .map(|p| p as usize + 1)
                .unwrap_or(i + 1);

            ListItem::new(format!(
                "{:>num_width$}  {}  {}",
                position,
                truncate_string(item.title(), title_width),
                truncate_string(item.channel().unwrap_or(""), channel_width),
                num_width = num_width,
            ))
            .style(style)
        })
        .collect()
}

fn render_item_details(frame: &mut Frame, area: Rect, item: Option<&PlaylistItem>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Details ")
        .padding(Padding::horizontal(1));

    let Some(item) = item else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(Span::styled(
        item.title().to_string(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];
    if let Some(channel) = item.channel() {
        lines.push(Line::from(vec![
            Span::styled("Channel: ", label),
            Span::raw(channel.to_string()),
        ]));
    }
    if let Some(url) = item.watch_url() {
        lines.push(Line::from(vec![
            Span::styled("Watch:   ", label),
            Span::styled(url, Style::default().fg(Color::Cyan)),
        ]));
    }
    if let Some(description) = item.description() {
        lines.push(Line::from(Span::styled(
            description.lines().next().unwrap_or_default().to_string(),
            Style::default().fg(Color::Gray),
        )));
    }

    let details = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(details, area);
}
