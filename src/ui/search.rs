use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::model::search::SearchResult;
use crate::ui::field::render_input;
use crate::ui::item_list::{one_line, truncate};
use crate::ui::theme::{self, source_type_color, ACCENT, MUTED};
use crate::util::highlight;
use crate::views::search::{FilterOption, SearchView};

pub fn render(f: &mut Frame, area: Rect, view: &SearchView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);

    render_input(f, rows[0], "Search knowledge", &view.input, view.editing, false);

    let body = if view.show_filters {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(28)])
            .split(rows[1]);
        render_filters(f, columns[1], view);
        columns[0]
    } else {
        rows[1]
    };

    if view.results.is_empty() {
        let missing = if view.query.is_empty() {
            "Type a query and press enter to search."
        } else {
            "No results found. Try adjusting your search or filters."
        };
        super::placeholder(f, body, " Results ", &view.state, missing);
    } else {
        render_results(f, body, view);
    }

    let mut status = vec![Span::styled(
        format!(
            "{}  ({} results)",
            view.pagination.label(),
            view.pagination.total_elements
        ),
        theme::label(),
    )];
    let active = view.source_types.len() + view.tags.len();
    if active > 0 {
        status.push(Span::styled(format!("  {active} filter(s)"), theme::tag()));
    }
    if view.state.is_loading() {
        status.push(Span::styled("  searching...", theme::label()));
    } else if let Some(error) = view.state.error() {
        status.push(Span::styled(format!("  {error}"), theme::error()));
    }
    f.render_widget(Paragraph::new(Line::from(status)), rows[2]);
}

fn render_results(f: &mut Frame, area: Rect, view: &SearchView) {
    let width = area.width.saturating_sub(4) as usize;
    let rows: Vec<ListItem> = view
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| result_item(result, i == view.selected && !view.editing, width))
        .collect();

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(format!(" Results for \"{}\" ", view.query)),
    );
    let mut state = ListState::default();
    if !view.editing {
        state.select(Some(view.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// Title, score and source on the first row; highlighted fragments below,
/// falling back to the excerpt when the server sent none.
fn result_item(result: &SearchResult, selected: bool, width: usize) -> ListItem<'static> {
    let item = &result.knowledge_item;
    let title_style = if selected {
        theme::selected()
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", item.source_type.display_name()),
            Style::default().fg(source_type_color(item.source_type)),
        ),
        Span::styled(truncate(&item.title, width.saturating_sub(20)), title_style),
        Span::styled(format!("  {:.0}%", result.score * 100.0), theme::label()),
    ])];

    if result.highlights.is_empty() {
        lines.push(Line::styled(
            format!("  {}", truncate(&one_line(&item.excerpt()), width)),
            theme::label(),
        ));
    }
    for fragment in result.highlights.iter().take(2) {
        let mut spans = vec![Span::raw("  …")];
        for segment in highlight::segments(&one_line(fragment)) {
            let style = if segment.highlighted {
                theme::highlight()
            } else {
                Style::default().fg(MUTED)
            };
            spans.push(Span::styled(segment.text, style));
        }
        spans.push(Span::raw("…"));
        lines.push(Line::from(spans));
    }

    if !item.tags.is_empty() {
        let tags: Vec<Span> = item
            .tags
            .iter()
            .map(|t| Span::styled(format!(" #{t}"), theme::tag()))
            .collect();
        lines.push(Line::from(tags));
    }
    ListItem::new(lines)
}

fn render_filters(f: &mut Frame, area: Rect, view: &SearchView) {
    let options = view.filter_options();
    let mut items: Vec<ListItem> = Vec::new();
    let mut in_tags = false;
    for option in &options {
        if matches!(option, FilterOption::Tag(_)) && !in_tags {
            in_tags = true;
            items.push(ListItem::new(Line::styled("Tags", theme::label())));
        }
        let mark = if view.is_filter_selected(option) { "[x]" } else { "[ ]" };
        let label = match option {
            FilterOption::Source(t) => Span::styled(
                t.display_name().to_string(),
                Style::default().fg(source_type_color(*t)),
            ),
            FilterOption::Tag(tag) => Span::styled(format!("#{tag}"), theme::tag()),
        };
        items.push(ListItem::new(Line::from(vec![Span::raw(format!("{mark} ")), label])));
    }

    // The "Tags" heading shifts the selection row for tag options.
    let heading_offset = options
        .get(view.filter_cursor)
        .map(|o| usize::from(matches!(o, FilterOption::Tag(_))))
        .unwrap_or(0);
    let mut state = ListState::default();
    state.select(Some(view.filter_cursor + heading_offset));

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(" Filters: Source Type "),
        )
        .highlight_style(theme::selected().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut state);
}
