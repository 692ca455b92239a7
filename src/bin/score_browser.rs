//! WA Score Comparator - Graphical User Interface
//!
//! Loads a scoring table at startup and shows it as one button per
//! discipline plus a point input. Selecting disciplines and/or entering
//! points lists the matching records per gender, highest score first.

use iced::widget::{button, column, container, row, rule, scrollable, text, text_input};
use iced::{Center, Element, Fill, Task, Theme};
use std::path::PathBuf;
use wa_score_comparator::config::BrowserConfig;
use wa_score_comparator::loader::{self, LoadedData, Source};
use wa_score_comparator::params::{parse_point_input, QueryParams};
use wa_score_comparator::query::{grouped, query, GroupView};
use wa_score_comparator::render::{IDLE_PROMPT, NO_MATCHES};
use wa_score_comparator::store::{IndexStore, LoadOutcome, LoadTicket};

fn main() -> iced::Result {
    env_logger::init();
    iced::application(App::new, App::update, App::view)
        .theme(App::theme)
        .centered()
        .run()
}

// ============================================================================
// App State
// ============================================================================

struct App {
    config: BrowserConfig,

    // Source picker
    source_input: String,

    // Loaded data
    store: IndexStore,
    loaded_at: Option<chrono::DateTime<chrono::Local>>,

    // Filters
    params: QueryParams,
    points_input: String,
    points_hint: String,

    status_text: String,
}

impl App {
    fn theme(&self) -> Theme {
        Theme::Light
    }

    fn new() -> (Self, Task<Message>) {
        let config = BrowserConfig::load();
        let points_input = config
            .last_points
            .map(|p| p.to_string())
            .unwrap_or_default();
        let mut app = App {
            source_input: config.source.clone(),
            params: QueryParams::new().with_points(config.last_points),
            config,
            store: IndexStore::new(),
            loaded_at: None,
            points_input,
            points_hint: String::new(),
            status_text: String::new(),
        };
        let task = app.start_load();
        (app, task)
    }

    /// Start loading the source currently in the source field.
    fn start_load(&mut self) -> Task<Message> {
        let source = Source::new(self.source_input.trim());
        let ticket = self.store.begin_load();
        self.status_text = format!("Loading {}...", source);

        Task::perform(
            async move {
                let result = load_in_background(source).await;
                (ticket, result)
            },
            |(ticket, result)| Message::Loaded(ticket, result),
        )
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
enum Message {
    // Source
    SourceChanged(String),
    BrowseSource,
    SourceSelected(Option<PathBuf>),
    Reload,
    Loaded(LoadTicket, Result<LoadedData, String>),

    // Filters
    DisciplineToggled(String),
    ClearSelection,
    PointsChanged(String),
}

// ============================================================================
// Update
// ============================================================================

impl App {
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // -- Source --
            Message::SourceChanged(v) => {
                self.source_input = v;
                Task::none()
            }
            Message::BrowseSource => Task::perform(
                async {
                    let file = rfd::AsyncFileDialog::new()
                        .set_title("Select a scoring table")
                        .add_filter("Scoring tables", &["json", "csv"])
                        .pick_file()
                        .await;
                    file.map(|f| f.path().to_path_buf())
                },
                Message::SourceSelected,
            ),
            Message::SourceSelected(path) => match path {
                Some(p) => {
                    self.source_input = p.display().to_string();
                    self.start_load()
                }
                None => Task::none(),
            },
            Message::Reload => self.start_load(),
            Message::Loaded(ticket, result) => {
                let outcome = match result {
                    Ok(data) => self.store.complete(ticket, data.index, data.stats),
                    Err(e) => self.store.fail(ticket, &anyhow::anyhow!(e)),
                };
                match outcome {
                    LoadOutcome::Installed => {
                        self.loaded_at = Some(chrono::Local::now());
                        self.status_text = self.loaded_status();
                        // Only remember sources that actually loaded
                        self.config.source = self.source_input.trim().to_string();
                        self.config.save();
                    }
                    LoadOutcome::Failed => {
                        self.status_text = format!(
                            "Error: {}",
                            self.store.last_error().unwrap_or_default()
                        );
                    }
                    LoadOutcome::Superseded => {}
                }
                Task::none()
            }

            // -- Filters --
            Message::DisciplineToggled(discipline) => {
                self.params = self.params.toggle_discipline(&discipline);
                Task::none()
            }
            Message::ClearSelection => {
                self.params = self.params.clear_selection();
                Task::none()
            }
            Message::PointsChanged(v) => {
                match parse_point_input(&v) {
                    Ok(points) => {
                        self.points_input = v;
                        self.points_hint.clear();
                        self.params = self.params.clone().with_points(points);
                        self.config.last_points = points;
                        self.config.save();
                    }
                    Err(e) => {
                        // Keep the previous value, like a field that refuses the keystroke
                        log::debug!("Rejected point input {:?}: {}", v, e);
                        self.points_hint = e.to_string();
                    }
                }
                Task::none()
            }
        }
    }

    fn loaded_status(&self) -> String {
        let time = self
            .loaded_at
            .map(|t| t.format("%l:%M %p").to_string())
            .unwrap_or_default();
        match self.store.stats() {
            Some(stats) if stats.dropped() > 0 => format!(
                "Loaded {} records in {} disciplines at {} ({} rows skipped)",
                stats.indexed,
                stats.disciplines,
                time.trim(),
                stats.dropped()
            ),
            Some(stats) => format!(
                "Loaded {} records in {} disciplines at {}",
                stats.indexed,
                stats.disciplines,
                time.trim()
            ),
            None => String::new(),
        }
    }
}

// ============================================================================
// View
// ============================================================================

impl App {
    fn view(&self) -> Element<'_, Message> {
        let source_row = row![
            text("Source:").width(70),
            text_input("Path or URL of a .json or .csv table", &self.source_input)
                .on_input(Message::SourceChanged)
                .on_submit(Message::Reload)
                .width(Fill),
            button(text("Browse").size(13)).on_press(Message::BrowseSource),
            button(text("Reload").size(13)).on_press(Message::Reload),
        ]
        .spacing(10)
        .align_y(Center);

        let status = text(&self.status_text).size(13);

        let body = container(scrollable(self.view_tables()).height(Fill))
            .width(Fill)
            .height(Fill);

        column![
            source_row,
            status,
            rule::horizontal(1),
            self.view_filters(),
            rule::horizontal(1),
            body,
        ]
        .spacing(12)
        .padding(20)
        .into()
    }

    /// Discipline toggle buttons and the point input.
    fn view_filters(&self) -> Element<'_, Message> {
        let index = self.store.current();

        let mut buttons: Vec<Element<'_, Message>> = index
            .disciplines()
            .map(|d| discipline_button(d, self.params.is_selected(d)))
            .collect();
        if !self.params.selected().is_empty() {
            buttons.push(
                button(text("Clear").size(13))
                    .on_press(Message::ClearSelection)
                    .style(button::text)
                    .into(),
            );
        }

        let points_row = row![
            text_input("Enter points (1-1400)", &self.points_input)
                .on_input(Message::PointsChanged)
                .width(Fill),
            text(&self.points_hint)
                .size(12)
                .color(iced::Color::from_rgb(0.7, 0.2, 0.2)),
        ]
        .spacing(10)
        .align_y(Center);

        column![row(buttons).spacing(8).wrap(), points_row]
            .spacing(12)
            .into()
    }

    /// Matching tables, or the prompt when nothing is selected.
    fn view_tables(&self) -> Element<'_, Message> {
        if self.params.is_idle() {
            return text(IDLE_PROMPT)
                .color(iced::Color::from_rgb(0.45, 0.45, 0.45))
                .into();
        }

        let index = self.store.current();
        let views = query(&index, &self.params);
        if views.is_empty() {
            return text(NO_MATCHES)
                .color(iced::Color::from_rgb(0.45, 0.45, 0.45))
                .into();
        }

        let sections: Vec<Element<'_, Message>> = grouped(views)
            .into_iter()
            .map(|discipline| {
                let mut items: Vec<Element<'_, Message>> =
                    vec![text(discipline.discipline.to_string()).size(24).into()];
                items.extend(discipline.groups.iter().map(gender_table));
                column(items).spacing(10).into()
            })
            .collect();

        column(sections).spacing(24).width(Fill).into()
    }
}

// ============================================================================
// Helper widgets
// ============================================================================

/// Render a discipline toggle, highlighted when selected.
fn discipline_button<'a>(discipline: &str, selected: bool) -> Element<'a, Message> {
    let btn = button(text(discipline.to_string()).size(14))
        .on_press(Message::DisciplineToggled(discipline.to_string()));
    if selected {
        btn.style(button::primary).into()
    } else {
        btn.style(button::secondary).into()
    }
}

/// Render one gender's Points/Result table.
fn gender_table<'a>(group: &GroupView<'_>) -> Element<'a, Message> {
    let mut rows: Vec<Element<'a, Message>> = vec![
        text(group.gender.label()).size(18).into(),
        row![
            text("Points").size(14).width(120),
            text("Result").size(14).width(Fill),
        ]
        .spacing(10)
        .into(),
        rule::horizontal(1).into(),
    ];

    for record in &group.records {
        rows.push(
            row![
                text(record.score.to_string()).size(13).width(120),
                text(record.result.to_string()).size(13).width(Fill),
            ]
            .spacing(10)
            .into(),
        );
    }

    column(rows).spacing(4).width(Fill).into()
}

// ============================================================================
// Background loading
// ============================================================================

/// Run the blocking loader on its own thread so the UI stays responsive.
async fn load_in_background(source: Source) -> Result<LoadedData, String> {
    let (tx, rx) = futures::channel::oneshot::channel();

    std::thread::spawn(move || {
        let result = loader::load(&source).map_err(|e| format!("{:#}", e));
        let _ = tx.send(result);
    });

    rx.await
        .map_err(|_| "Loader thread exited without a result".to_string())?
}
