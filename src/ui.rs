use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, DROPDOWN_ACTIONS};
use crate::focus::{should_show_selection, visual_selection_key};
use crate::format::{format_pct, format_size, format_timestamp};
use crate::fsm::NavRegion;
use crate::remote::{CompressionFilter, SortKey, SortOrder};
use crate::selection::SelectionTarget;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    match app.fsm.current() {
        NavRegion::Buckets => draw_buckets(frame, app, chunks[0]),
        _ => draw_objects(frame, app, chunks[0]),
    }

    if matches!(app.fsm.current(), NavRegion::FilePanel | NavRegion::Dropdown) {
        draw_file_panel(frame, app, chunks[0]);
    }
    if app.fsm.current() == NavRegion::Dropdown {
        draw_dropdown(frame, app, chunks[0]);
    }
    if app.fsm.current() == NavRegion::Modal {
        draw_modal(frame, app, chunks[0]);
    }

    draw_status_bar(frame, app, chunks[1]);
}

fn draw_buckets(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Buckets ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.config.colors.active_border));

    if app.buckets.is_empty() {
        let paragraph = Paragraph::new("No buckets loaded")
            .block(block)
            .style(Style::default().fg(ratatui::style::Color::Gray));
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = app
        .buckets
        .iter()
        .map(|bucket| {
            Row::new(vec![
                bucket.name.clone(),
                bucket.object_count.to_string(),
                format_size(bucket.original_bytes),
                format_size(bucket.stored_bytes),
                format_pct(bucket.savings_pct()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(
        Row::new(vec!["Name", "Objects", "Original", "Stored", "Savings"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .highlight_style(Style::default().bg(app.config.colors.focused_row));

    let mut state = ratatui::widgets::TableState::default();
    state.select(Some(app.bucket_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_objects(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.fsm.current() == NavRegion::Objects;
    let border_style = if is_active {
        Style::default().fg(app.config.colors.active_border)
    } else {
        Style::default().fg(app.config.colors.inactive_border)
    };

    let bucket = app.bucket.as_deref().unwrap_or("?");
    let mut title = format!(" {}/{} ", bucket, app.prefix);
    if app.search_editing || app.committed_search.is_some() {
        title.push_str(&format!("(search: {}) ", app.search_input));
    }
    if app.compressed != CompressionFilter::Any {
        title.push_str(&format!("[{:?}] ", app.compressed));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let Some(cache) = app.active_cache() else {
        let text = if app.is_loading {
            format!("Loading... {} objects", app.loaded_count)
        } else {
            "No listing loaded".to_string()
        };
        let paragraph = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(ratatui::style::Color::Gray));
        frame.render_widget(paragraph, area);
        return;
    };

    let visual_key = visual_selection_key(
        app.route_selected_key.as_deref(),
        app.keyboard.focused_key(),
        app.keyboard.is_keyboard_mode(),
    );

    let mut rows: Vec<ListItem> = Vec::new();
    let mut highlight_index = None;

    for (index, dir) in app.page_directories().iter().enumerate() {
        let selected = app.selection.is_selected(&SelectionTarget::prefix(dir.clone()));
        if should_show_selection(dir, visual_key) {
            highlight_index = Some(index);
        }
        let marker = if selected { "[x] " } else { "    " };
        rows.push(ListItem::new(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(app.config.colors.selected_marker)),
            Span::styled(
                format!("{}/", dir.trim_end_matches('/')),
                Style::default()
                    .fg(app.config.colors.directory)
                    .add_modifier(Modifier::BOLD),
            ),
        ])));
    }

    let dir_count = app.page_directories().len();
    for (index, object) in app.page_objects().iter().enumerate() {
        let selected = app
            .selection
            .is_selected(&SelectionTarget::object(object.key.clone()));
        if should_show_selection(&object.key, visual_key) {
            highlight_index = Some(dir_count + index);
        }
        let marker = if selected { "[x] " } else { "    " };
        let style = if object.compressed {
            Style::default().fg(app.config.colors.compressed_object)
        } else {
            Style::default()
        };
        let mut spans = vec![
            Span::styled(marker.to_string(), Style::default().fg(app.config.colors.selected_marker)),
            Span::styled(format!("{:<40} ", object.key), style),
            Span::raw(format!("{:>8} ", format_size(object.original_bytes))),
            Span::raw(format!("{:>8} ", format_size(object.stored_bytes))),
        ];
        if app.config.layout.show_savings_column {
            spans.push(Span::raw(format!("{:>7} ", format_pct(object.savings_pct()))));
        }
        spans.push(Span::raw(format_timestamp(&object.modified)));
        rows.push(ListItem::new(Line::from(spans)));
    }

    if rows.is_empty() {
        let paragraph = Paragraph::new("Empty prefix")
            .block(block)
            .style(Style::default().fg(ratatui::style::Color::Gray));
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(rows)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(app.config.colors.focused_row)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(highlight_index);
    frame.render_stateful_widget(list, area, &mut state);

    // Pagination footer inside the bottom border area.
    let info = app.pagination();
    if info.total_pages > 1 || cache.limited {
        let mut footer = format!(" page {}/{} ", info.current_page, info.total_pages.max(1));
        if cache.limited {
            footer.push_str("(listing truncated) ");
        }
        let footer_area = Rect {
            x: area.x + 2,
            y: area.y + area.height.saturating_sub(1),
            width: (footer.len() as u16).min(area.width.saturating_sub(4)),
            height: 1,
        };
        let style = if cache.limited {
            Style::default().fg(app.config.colors.warning)
        } else {
            Style::default()
        };
        frame.render_widget(Paragraph::new(footer).style(style), footer_area);
    }
}

fn draw_file_panel(frame: &mut Frame, app: &App, area: Rect) {
    let Some(key) = app.file_panel_key.as_deref() else {
        return;
    };
    let Some(cache) = app.active_cache() else {
        return;
    };
    let Some(object) = cache.objects.iter().find(|o| o.key == key) else {
        return;
    };

    let width = app.config.layout.file_panel_width.min(area.width);
    let panel = Rect {
        x: area.x + area.width - width,
        y: area.y,
        width,
        height: area.height,
    };

    let is_active = app.fsm.current() == NavRegion::FilePanel;
    let border_style = if is_active {
        Style::default().fg(app.config.colors.active_border)
    } else {
        Style::default().fg(app.config.colors.inactive_border)
    };

    let lines = vec![
        Line::from(Span::styled(
            object.key.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Original: {}", format_size(object.original_bytes))),
        Line::from(format!("Stored:   {}", format_size(object.stored_bytes))),
        Line::from(format!("Savings:  {}", format_pct(object.savings_pct()))),
        Line::from(format!(
            "Compressed: {}",
            if object.compressed { "yes" } else { "no" }
        )),
        Line::from(format!("Modified: {}", format_timestamp(&object.modified))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: actions | Esc: close",
            Style::default().fg(ratatui::style::Color::Gray),
        )),
    ];

    frame.render_widget(Clear, panel);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Object ")
                .borders(Borders::ALL)
                .border_style(border_style),
        ),
        panel,
    );
}

fn draw_dropdown(frame: &mut Frame, app: &App, area: Rect) {
    let width = 24u16.min(area.width);
    let height = (DROPDOWN_ACTIONS.len() as u16 + 2).min(area.height);
    let panel = Rect {
        x: area.x + area.width.saturating_sub(width + 2),
        y: area.y + 2,
        width,
        height,
    };

    let items: Vec<ListItem> = DROPDOWN_ACTIONS
        .iter()
        .map(|action| ListItem::new(*action))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(" Actions ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.config.colors.active_border)),
        )
        .highlight_style(Style::default().bg(app.config.colors.focused_row))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.dropdown_index));
    frame.render_widget(Clear, panel);
    frame.render_stateful_widget(list, panel, &mut state);
}

fn draw_modal(frame: &mut Frame, app: &App, area: Rect) {
    let Some(modal) = app.modal.as_ref() else {
        return;
    };

    let width = (modal.message.len() as u16 + 6).min(area.width).max(20);
    let panel = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height / 2,
        width,
        height: 3.min(area.height),
    };

    frame.render_widget(Clear, panel);
    frame.render_widget(
        Paragraph::new(modal.message.clone()).block(
            Block::default()
                .title(" Confirm ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.config.colors.warning)),
        ),
        panel,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = if app.is_loading {
        format!("Loading {} objects... | {}", app.loaded_count, app.status_message)
    } else {
        let mut text = app.status_message.clone();
        let selected = app.selection.total_selected_count();
        if selected > 0 {
            text.push_str(&format!(" | {} selected", selected));
        }
        if let Some(cache) = app.active_cache() {
            if cache.limited {
                text.push_str(" | listing truncated at the object ceiling");
            }
        }
        text
    };

    let sort_hint = match (app.sort_key, app.sort_order) {
        (SortKey::Name, SortOrder::Asc) => "name↑",
        (SortKey::Name, SortOrder::Desc) => "name↓",
        (SortKey::Size, SortOrder::Asc) => "size↑",
        (SortKey::Size, SortOrder::Desc) => "size↓",
        (SortKey::Modified, SortOrder::Asc) => "modified↑",
        (SortKey::Modified, SortOrder::Desc) => "modified↓",
    };

    let help_text = match app.fsm.current() {
        NavRegion::Buckets => "↑↓: Navigate | Enter: Open bucket | r: Reload | q: Quit".to_string(),
        NavRegion::Objects => format!(
            "↑↓: Navigate | Enter: Open | Esc: Up | /: Search | x: Select | a: Select page | sort: {}",
            sort_hint
        ),
        NavRegion::FilePanel => "Enter: Actions | Esc: Close".to_string(),
        NavRegion::Dropdown => "↑↓: Navigate | Enter: Run | Esc: Close".to_string(),
        NavRegion::Modal => "y: Confirm | n/Esc: Cancel".to_string(),
    };

    let status_line = Line::from(vec![
        Span::styled(status_text, Style::default().fg(app.config.colors.status_bar_fg)),
        Span::raw(" | "),
        Span::styled(help_text, Style::default().fg(ratatui::style::Color::Gray)),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(app.config.colors.status_bar_bg));
    frame.render_widget(paragraph, area);
}
