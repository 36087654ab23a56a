//! Layout rendering (top bar, playlist sidebar, status line, root screens)

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use super::utils::{render_scrollable_list, truncate_string};
use crate::auth::UserHandle;
use crate::model::{ActiveSection, UiState};
use crate::youtube::Playlist;

pub fn render_top_bar(frame: &mut Frame, area: Rect, user: &UserHandle) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Title
            Constraint::Length(30), // Account
        ])
        .split(area);

    let title = Paragraph::new("YouTube playlists")
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" TubeList ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(title, chunks[0]);

    let account = match user.expires_at() {
        Some(expires_at) => format!("Signed in · token {}", expires_at.format("%H:%M")),
        None => "Signed in".to_string(),
    };
    let account = Paragraph::new(account)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Account "));
    frame.render_widget(account, chunks[1]);
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, playlists: &[Playlist], ui_state: &UiState) {
    let is_focused = ui_state.active_section == ActiveSection::Playlists;
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Playlists ({}) ", playlists.len()))
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    if playlists.is_empty() {
        let empty = Paragraph::new("No playlists")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = playlists
        .iter()
        .enumerate()
        .map(|(i, playlist)| {
            let style = if i == ui_state.playlist_cursor && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == ui_state.playlist_cursor {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let label = format!("{} ({})", playlist.title(), playlist.item_count());
            ListItem::new(truncate_string(&label, width)).style(style)
        })
        .collect();

    render_scrollable_list(frame, area, items, ui_state.playlist_cursor, block);
}

pub fn render_status_line(frame: &mut Frame, area: Rect, ui_state: &UiState) {
    let hint = Span::styled(" h: help  q: quit ", Style::default().fg(Color::DarkGray));
    let line = match &ui_state.status_message {
        Some(status) => Line::from(vec![
            Span::styled(format!(" {} ", status), Style::default().fg(Color::Yellow)),
            hint,
        ]),
        None => Line::from(hint),
    };
    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Loading...")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" TubeList "));
    frame.render_widget(loading, area);
}

pub fn render_sign_in(frame: &mut Frame, area: Rect, ui_state: &UiState) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Sign in with your Google account to browse your playlists",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    match &ui_state.sign_in_url {
        Some(url) => {
            lines.push(Line::from(
                "Approve access in the browser window. If none opened, visit this address:",
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(url.clone(), Style::default().fg(Color::Cyan))));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Waiting for the browser to finish...",
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(vec![
                Span::styled("Esc", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]));
        }
        None => {
            lines.push(Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(" sign in   "),
                Span::styled("q", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(" quit"),
            ]));
        }
    }

    let prompt = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Sign in ")
                .padding(Padding::uniform(1)),
        );
    frame.render_widget(prompt, area);
}
