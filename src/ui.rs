use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use std::{
    future::Future,
    io,
    time::{Duration, Instant},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::api::ReviewClient;
use crate::error::ApiError;
use crate::resource::RemoteState;
use crate::review::{PaginatedResponse, Review, ReviewStats, COMMENT_MAX_LENGTH, RATING_MAX, RATING_MIN};
use crate::room::RoomCatalog;
use crate::store::RoomStore;
use crate::submission::{FormField, SubmissionState};
use crate::view::{RoomReviewsView, SubmissionGate};

#[derive(Debug, PartialEq)]
enum Screen {
    Rooms,
    RoomReviews,
    WritingReview,
}

enum UIAction {
    Quit,
    RefreshRooms,
    FullReload,
}

pub struct ReviewUI {
    client: ReviewClient,
    store: RoomStore,
    view: Option<RoomReviewsView>,
    screen: Screen,
    list_state: ListState,
    selected_room: Option<usize>,
    focused_field: usize,
    message: Option<String>,
}

impl ReviewUI {
    pub async fn new(client: ReviewClient, catalog: RoomCatalog) -> Result<Self> {
        let mut store = RoomStore::new(client.clone(), catalog);
        store.load_rooms();
        store.load_rooms_with_stats().await;

        let mut list_state = ListState::default();
        let selected_room = if store.rooms_with_stats().is_empty() {
            None
        } else {
            list_state.select(Some(0));
            Some(0)
        };

        Ok(Self {
            client,
            store,
            view: None,
            screen: Screen::Rooms,
            list_state,
            selected_room,
            focused_field: 0,
            message: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        if let Some(view) = &self.view {
            view.close();
        }

        result
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(250);

        loop {
            self.sync_screen();
            terminal.draw(|f| self.ui(f))?;

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if crossterm::event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.handle_input(key) {
                        Some(UIAction::Quit) => break,
                        Some(UIAction::RefreshRooms) => {
                            self.store.load_rooms_with_stats().await;
                        }
                        Some(UIAction::FullReload) => self.full_reload().await,
                        None => {}
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    /// A successful submission closes the form from a background task.
    fn sync_screen(&mut self) {
        if self.screen == Screen::WritingReview {
            if let Some(view) = &self.view {
                if !view.is_form_open() {
                    self.screen = Screen::RoomReviews;
                }
            }
        }
    }

    /// Last resort: rebuild the room list and reopen the current room from scratch.
    async fn full_reload(&mut self) {
        info!("Full reload requested");
        self.message = None;
        self.store = RoomStore::new(self.client.clone(), self.store.catalog().clone());
        self.store.load_rooms();
        self.store.load_rooms_with_stats().await;

        if let Some(old) = self.view.take() {
            old.close();
            let view = RoomReviewsView::new(self.client.clone(), self.store.catalog(), old.room_id());
            self.spawn({
                let view = view.clone();
                async move { view.open().await }
            });
            self.view = Some(view);
            self.screen = Screen::RoomReviews;
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task);
    }

    fn handle_input(&mut self, key: KeyEvent) -> Option<UIAction> {
        if self.message.take().is_some() {
            return None;
        }

        match self.screen {
            Screen::Rooms => self.handle_rooms_input(key),
            Screen::RoomReviews => self.handle_reviews_input(key),
            Screen::WritingReview => {
                self.handle_form_input(key);
                None
            }
        }
    }

    fn handle_rooms_input(&mut self, key: KeyEvent) -> Option<UIAction> {
        let count = self.store.rooms_with_stats().len();
        match key.code {
            KeyCode::Char('q') => return Some(UIAction::Quit),
            KeyCode::Char('r') => return Some(UIAction::RefreshRooms),
            KeyCode::Char('R') => return Some(UIAction::FullReload),
            KeyCode::Up => {
                if let Some(selected) = self.selected_room {
                    if selected > 0 {
                        self.selected_room = Some(selected - 1);
                        self.list_state.select(Some(selected - 1));
                    }
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.selected_room {
                    if selected + 1 < count {
                        self.selected_room = Some(selected + 1);
                        self.list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Enter => {
                if let Some(room) = self.selected_room.and_then(|i| self.store.rooms_with_stats().get(i)) {
                    let view = RoomReviewsView::new(self.client.clone(), self.store.catalog(), room.room_id);
                    self.spawn({
                        let view = view.clone();
                        async move { view.open().await }
                    });
                    self.view = Some(view);
                    self.screen = Screen::RoomReviews;
                }
            }
            _ => {}
        }
        None
    }

    fn handle_reviews_input(&mut self, key: KeyEvent) -> Option<UIAction> {
        let view = self.view.clone()?;
        match key.code {
            KeyCode::Char('q') => return Some(UIAction::Quit),
            KeyCode::Char('R') => return Some(UIAction::FullReload),
            KeyCode::Esc | KeyCode::Char('b') => {
                if let Some(stats) = view.stats.state().data() {
                    self.store.update_stats(view.room_id(), stats);
                }
                view.close();
                self.view = None;
                self.screen = Screen::Rooms;
            }
            KeyCode::Char('n') | KeyCode::Right => {
                self.spawn(async move {
                    view.reviews.next_page().await;
                });
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.spawn(async move {
                    view.reviews.previous_page().await;
                });
            }
            KeyCode::Char('s') => {
                let sort = view.reviews.sort().next();
                self.spawn(async move {
                    view.reviews.set_sort(sort).await;
                });
            }
            KeyCode::Char('r') => {
                self.spawn(async move { view.reload().await });
            }
            KeyCode::Char('x') => view.dismiss_notice(),
            KeyCode::Char('w') => match view.gate() {
                SubmissionGate::Enabled => {
                    view.open_form();
                    self.focused_field = 0;
                    self.screen = Screen::WritingReview;
                }
                SubmissionGate::Disabled { reason } => {
                    self.message = Some(format!("Reviews are currently disabled: {}", reason));
                }
                SubmissionGate::Unavailable(error) => self.message = Some(error.message),
                SubmissionGate::Loading => {}
            },
            _ => {}
        }
        None
    }

    fn handle_form_input(&mut self, key: KeyEvent) {
        let Some(view) = self.view.clone() else {
            return;
        };
        let submission = &view.submission;
        let field = FormField::ALL[self.focused_field];

        match key.code {
            KeyCode::Esc => {
                view.close_form();
                self.screen = Screen::RoomReviews;
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if !submission.is_submitting() {
                    let view = view.clone();
                    self.spawn(async move {
                        view.submit().await;
                    });
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focused_field = (self.focused_field + 1) % FormField::ALL.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused_field = (self.focused_field + FormField::ALL.len() - 1) % FormField::ALL.len();
            }
            KeyCode::Left if field == FormField::Rating => {
                let rating = submission.snapshot().form.rating;
                submission.set_rating(rating.saturating_sub(1).max(RATING_MIN));
            }
            KeyCode::Right if field == FormField::Rating => {
                let rating = submission.snapshot().form.rating;
                submission.set_rating((rating + 1).min(RATING_MAX));
            }
            KeyCode::Char(c) if field == FormField::Rating => {
                if let Some(rating) = c.to_digit(10) {
                    let rating = rating as u8;
                    if (RATING_MIN..=RATING_MAX).contains(&rating) {
                        submission.set_rating(rating);
                    }
                }
            }
            KeyCode::Enter if field == FormField::Comment => submission.push_char(field, '\n'),
            KeyCode::Enter => {
                self.focused_field = (self.focused_field + 1) % FormField::ALL.len();
            }
            KeyCode::Char(c) => submission.push_char(field, c),
            KeyCode::Backspace => submission.pop_char(field),
            _ => {}
        }
    }

    fn ui<B: Backend>(&mut self, f: &mut Frame<B>) {
        let size = f.size();

        match self.screen {
            Screen::Rooms => self.draw_rooms_view(f, size),
            Screen::RoomReviews => self.draw_reviews_view(f, size),
            Screen::WritingReview => self.draw_form_view(f, size),
        }

        if let Some(message) = &self.message {
            let popup_area = centered_rect(60, 20, size);
            f.render_widget(Clear, popup_area);
            let paragraph = Paragraph::new(message.as_str())
                .block(Block::default().borders(Borders::ALL).title("Message"))
                .wrap(Wrap { trim: true });
            f.render_widget(paragraph, popup_area);
        }
    }

    fn draw_rooms_view<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(7)].as_ref())
            .split(area);

        let items: Vec<ListItem> = self
            .store
            .rooms_with_stats()
            .iter()
            .map(|room| {
                let rating = match room.average_rating {
                    Some(average) if room.total_reviews > 0 => Spans::from(vec![
                        Span::styled(stars(average), Style::default().fg(Color::Yellow)),
                        Span::raw(format!(
                            " {:.1} ({} review{})",
                            average,
                            room.total_reviews,
                            plural(room.total_reviews)
                        )),
                    ]),
                    _ => Spans::from(Span::styled("No reviews yet", Style::default().fg(Color::Gray))),
                };
                ListItem::new(vec![
                    Spans::from(Span::styled(
                        format!("Room {}", room.room_number),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    rating,
                ])
            })
            .collect();

        let rooms_list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Select a Room"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");
        f.render_stateful_widget(rooms_list, chunks[0], &mut self.list_state);

        let help_text = vec![
            Spans::from("Controls:"),
            Spans::from("↑/↓ - Navigate rooms"),
            Spans::from("Enter - View reviews"),
            Spans::from("'r' - Refresh ratings   'R' - Reload everything"),
            Spans::from("'q' - Quit"),
        ];
        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .style(Style::default().fg(Color::Gray).bg(Color::Black))
            .wrap(Wrap { trim: true });
        f.render_widget(help, chunks[1]);
    }

    fn draw_reviews_view<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        let Some(view) = self.view.clone() else {
            return;
        };

        let notice = view.notice();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(if notice.is_some() { 3 } else { 0 }),
                    Constraint::Length(3),
                    Constraint::Length(9),
                    Constraint::Min(6),
                    Constraint::Length(4),
                ]
                .as_ref(),
            )
            .split(area);

        if let Some(notice) = notice {
            let banner = Paragraph::new(Span::styled(
                format!("✅ {}", notice),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(banner, chunks[0]);
        }

        let room_label = self
            .store
            .catalog()
            .find(view.room_id())
            .map(|room| format!("Room {}", room.room_number))
            .unwrap_or_else(|| format!("Room #{}", view.room_id()));
        let header = match view.gate() {
            SubmissionGate::Disabled { reason } => Spans::from(vec![
                Span::styled(
                    "Reviews are currently disabled: ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw(reason),
            ]),
            SubmissionGate::Unavailable(error) => {
                Spans::from(Span::styled(error.message, Style::default().fg(Color::Red)))
            }
            SubmissionGate::Loading => Spans::from("Loading review settings..."),
            SubmissionGate::Enabled => Spans::from("Press 'w' to write a review"),
        };
        let header = Paragraph::new(header)
            .block(Block::default().borders(Borders::ALL).title(format!("{} - Room Reviews", room_label)));
        f.render_widget(header, chunks[1]);

        self.draw_stats(f, chunks[2], &view.stats.state());
        self.draw_review_list(f, chunks[3], &view);

        let help = Paragraph::new(vec![
            Spans::from("'n'/'p' - Next/previous page   's' - Change sort   'w' - Write a review"),
            Spans::from("'r' - Retry/refresh   'x' - Dismiss notice   Esc - Back to rooms   'q' - Quit"),
        ])
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .style(Style::default().fg(Color::Gray).bg(Color::Black));
        f.render_widget(help, chunks[4]);
    }

    fn draw_stats<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &RemoteState<ReviewStats>) {
        let block = Block::default().borders(Borders::ALL).title("Review Statistics");
        let text = match state {
            RemoteState::Idle | RemoteState::Loading => vec![Spans::from("Loading...")],
            RemoteState::Failed(error) => error_lines(error),
            RemoteState::Ready(stats) => {
                let mut lines = Vec::new();
                match stats.average_rating {
                    Some(average) if !stats.is_empty_state() => {
                        lines.push(Spans::from(vec![
                            Span::styled(
                                format!("{:.1} ", average),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(stars(average), Style::default().fg(Color::Yellow)),
                            Span::raw(format!(
                                "  Based on {} review{}",
                                stats.total_reviews,
                                plural(stats.total_reviews)
                            )),
                        ]));
                    }
                    _ => lines.push(Spans::from("No reviews yet")),
                }
                lines.push(Spans::from(""));
                for rating in (RATING_MIN..=RATING_MAX).rev() {
                    let percentage = stats.percentage_for(rating);
                    let filled = (percentage / 5.0).round() as usize;
                    lines.push(Spans::from(vec![
                        Span::raw(format!("{} star{} ", rating, if rating == 1 { " " } else { "s" })),
                        Span::styled("█".repeat(filled), Style::default().fg(Color::Yellow)),
                        Span::styled("░".repeat(20 - filled.min(20)), Style::default().fg(Color::Gray)),
                        Span::raw(format!(" {}", stats.count_for(rating))),
                    ]));
                }
                lines
            }
        };
        f.render_widget(Paragraph::new(text).block(block), area);
    }

    fn draw_review_list<B: Backend>(&self, f: &mut Frame<B>, area: Rect, view: &RoomReviewsView) {
        let title = format!("Reviews - sorted by {}", view.reviews.sort().label());
        let block = Block::default().borders(Borders::ALL).title(title);

        let text = match view.reviews.state() {
            RemoteState::Idle | RemoteState::Loading => vec![Spans::from("Loading reviews...")],
            RemoteState::Failed(error) => error_lines(&error),
            RemoteState::Ready(page) if page.is_empty() => vec![Spans::from(
                "No reviews yet. Be the first to share your experience!",
            )],
            RemoteState::Ready(page) => review_lines(&page),
        };

        f.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }

    fn draw_form_view<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        let Some(view) = self.view.clone() else {
            return;
        };
        let state: SubmissionState = view.submission.snapshot();

        let popup_area = centered_rect(80, 90, area);
        f.render_widget(Clear, popup_area);

        let mut lines = Vec::new();
        if let Some(error) = &state.global_error {
            lines.push(Spans::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            lines.push(Spans::from(""));
        }

        for (idx, field) in FormField::ALL.iter().enumerate() {
            let focused = idx == self.focused_field;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let marker = if focused { "> " } else { "  " };

            let value = match field {
                FormField::Rating if state.form.rating > 0 => {
                    format!("{} {} out of 5", stars(state.form.rating as f64), state.form.rating)
                }
                FormField::Rating => "☆☆☆☆☆ (press 1-5)".to_string(),
                FormField::Comment => format!(
                    "{}{}  ({}/{})",
                    state.form.comment,
                    if focused { "█" } else { "" },
                    state.form.comment.chars().count(),
                    COMMENT_MAX_LENGTH
                ),
                other => format!(
                    "{}{}",
                    state.form.text(*other).unwrap_or_default(),
                    if focused { "█" } else { "" }
                ),
            };

            lines.push(Spans::from(vec![
                Span::styled(format!("{}{} *: ", marker, field.label()), label_style),
                Span::raw(value),
            ]));
            if let Some(error) = state.field_errors.get(field.name()) {
                lines.push(Spans::from(Span::styled(
                    format!("    {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        lines.push(Spans::from(""));
        lines.push(if state.submitting {
            Spans::from(Span::styled("Submitting...", Style::default().add_modifier(Modifier::BOLD)))
        } else {
            Spans::from(Span::styled(
                "Tab - Next field   Ctrl+S - Submit Review   Esc - Cancel",
                Style::default().fg(Color::Gray),
            ))
        });

        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Write a Review"))
            .wrap(Wrap { trim: false });
        f.render_widget(form, popup_area);
    }
}

fn review_lines(page: &PaginatedResponse<Review>) -> Vec<Spans<'static>> {
    let mut lines = Vec::new();
    for review in &page.content {
        lines.push(Spans::from(vec![
            Span::styled(stars(review.rating as f64), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" {}", review.reviewer_name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" - {}", review.created_at.format("%B %-d, %Y")),
                Style::default().fg(Color::Gray),
            ),
        ]));
        lines.push(Spans::from(review.comment.clone()));
        lines.push(Spans::from(""));
    }

    if page.total_pages > 1 {
        let enabled = Style::default();
        let disabled = Style::default().fg(Color::DarkGray);
        lines.push(Spans::from(vec![
            Span::styled("[p] Previous", if page.first { disabled } else { enabled }),
            Span::raw(format!("   Page {} of {}   ", page.number.saturating_add(1), page.total_pages)),
            Span::styled("[n] Next", if page.last { disabled } else { enabled }),
        ]));
    }
    lines
}

fn error_lines(error: &ApiError) -> Vec<Spans<'static>> {
    let mut lines = vec![Spans::from(Span::styled(
        error.message.clone(),
        Style::default().fg(Color::Red),
    ))];
    if error.is_network_or_server_error() {
        lines.push(Spans::from("Press 'r' to retry"));
    }
    lines
}

fn stars(rating: f64) -> String {
    let full = rating.floor().clamp(0.0, 5.0) as usize;
    let half = full < 5 && rating.fract() >= 0.5;
    let empty = 5 - full - usize::from(half);
    format!("{}{}{}", "★".repeat(full), if half { "½" } else { "" }, "☆".repeat(empty))
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
