#[macro_use]
mod logging;
mod config;
mod error;
mod export;
mod gemini;
mod history;
mod layout;
mod markdown;
mod model;
mod normalize;
mod prompts;
mod state;
mod storage;
mod view;

use iced::{
    clipboard,
    event::{self, Event as IcedEvent},
    keyboard::{self, Key},
    time,
    widget::{column, container},
    window, Element, Length, Size, Subscription, Task, Theme,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::SharedError;
use crate::export::ExportFormat;
use crate::gemini::GeminiClient;
use crate::layout::LayoutMode;
use crate::logging::Kind;
use crate::model::{AnalysisReport, DrivingForce, Market};
use crate::state::{ArticleRequest, ArticleTicket, RadarState, ScanTicket};
use crate::storage::LocalStorage;

fn main() -> iced::Result {
    let config = Config::load();

    let client = match GeminiClient::with_config(&config.gemini, &config.article) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("[Gemini] Could not create HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    if !client.has_api_key() {
        eprintln!("[Gemini] No API key found. Set gemini.api_key in config.toml or GEMINI_API_KEY.");
    }

    let storage = match LocalStorage::open(&Config::storage_path()) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("[Storage] Could not open {}: {}. History will not persist.", Config::storage_path().display(), e);
            match LocalStorage::open_in_memory() {
                Ok(storage) => storage,
                Err(e) => {
                    eprintln!("[Storage] In-memory fallback failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let window_settings = window::Settings {
        size: Size::new(config.window.width as f32, config.window.height as f32),
        min_size: Some(Size::new(config.window.min_width as f32, config.window.min_height as f32)),
        position: window::Position::Centered,
        ..Default::default()
    };

    iced::application("全球趨勢雷達", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window_settings)
        .run_with(move || App::new(config, client, storage))
}

#[derive(Debug, Clone)]
pub enum Message {
    QueryChanged(String),
    Submit,
    PresetSelected(usize),
    ScanFinished(ScanTicket, Result<AnalysisReport, SharedError>),
    GenerateArticle,
    ArticleFinished(ArticleTicket, Result<String, SharedError>),
    SelectForce(DrivingForce),
    ToggleThought,
    SelectMarket(Market),
    SelectHistory(String),
    RemoveHistory(String),
    ClearHistory,
    LayoutModeSelected(LayoutMode),
    WindowResized(Size),
    CopyArticle,
    CopyText(String),
    ExportArticle(ExportFormat),
    CloseModals,
    Tick,
}

struct App {
    state: RadarState,
    client: Arc<GeminiClient>,
    config: Config,
    window_width: f32,
    loading_frame: usize,
}

impl App {
    fn new(config: Config, client: GeminiClient, storage: LocalStorage) -> (Self, Task<Message>) {
        let state = RadarState::new(storage);
        logging::log_with(
            Kind::Info,
            format!(
                "Analysis model {} · article model {}",
                config.gemini.analysis_model, config.gemini.article_model
            ),
        );

        let app = App {
            state,
            client: Arc::new(client),
            window_width: config.window.width as f32,
            config,
            loading_frame: 0,
        };
        (app, Task::none())
    }

    fn start_scan(&mut self, query: String) -> Task<Message> {
        let Some(ticket) = self.state.begin_scan(&query) else {
            return Task::none();
        };
        let client = self.client.clone();

        Task::future(async move {
            let outcome = client.analyze(query.trim()).await.map_err(Arc::new);
            Message::ScanFinished(ticket, outcome)
        })
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryChanged(value) => {
                self.state.query = value;
                Task::none()
            }
            Message::Submit => self.start_scan(self.state.query.clone()),
            Message::PresetSelected(index) => match prompts::PRESET_QUERIES.get(index) {
                Some(preset) => {
                    self.state.query = preset.to_string();
                    self.start_scan(preset.to_string())
                }
                None => Task::none(),
            },
            Message::ScanFinished(ticket, outcome) => {
                self.state.finish_scan(ticket, outcome);
                Task::none()
            }
            Message::GenerateArticle => match self.state.request_article() {
                ArticleRequest::Issue(ticket, report) => {
                    let client = self.client.clone();
                    Task::future(async move {
                        let outcome = client.generate_article(&report).await.map_err(Arc::new);
                        Message::ArticleFinished(ticket, outcome)
                    })
                }
                ArticleRequest::Cached | ArticleRequest::InFlight | ArticleRequest::NoReport => {
                    Task::none()
                }
            },
            Message::ArticleFinished(ticket, outcome) => {
                self.state.finish_article(ticket, outcome);
                Task::none()
            }
            Message::SelectForce(force) => {
                self.state.select_force(force);
                Task::none()
            }
            Message::ToggleThought => {
                self.state.toggle_thought();
                Task::none()
            }
            Message::SelectMarket(market) => {
                self.state.set_market(market);
                Task::none()
            }
            Message::SelectHistory(id) => {
                self.state.select_history(&id);
                Task::none()
            }
            Message::RemoveHistory(id) => {
                self.state.remove_history(&id);
                Task::none()
            }
            Message::ClearHistory => {
                self.state.clear_history();
                Task::none()
            }
            Message::LayoutModeSelected(mode) => {
                self.state.set_layout_mode(mode);
                Task::none()
            }
            Message::WindowResized(size) => {
                self.window_width = size.width;
                Task::none()
            }
            Message::CopyArticle => match &self.state.article.content {
                Some(content) => clipboard::write(content.clone()),
                None => Task::none(),
            },
            Message::CopyText(value) => clipboard::write(value),
            Message::ExportArticle(format) => {
                if let (Some(report), Some(content)) = (&self.state.result, &self.state.article.content) {
                    if let Err(e) = export::write_article(&self.config.export_dir(), &report.title, content, format) {
                        eprintln!("[Export] {:#}", e);
                        logging::log_with(Kind::Export, format!("Export failed: {}", e));
                    }
                }
                Task::none()
            }
            Message::CloseModals => {
                self.state.close_modals();
                Task::none()
            }
            Message::Tick => {
                self.loading_frame = (self.loading_frame + 1) % 80;
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let busy = self.state.scanning || self.state.article.generating;
        let timer = if busy {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let resize = window::resize_events().map(|(_id, size)| Message::WindowResized(size));

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::CloseModals)
            } else {
                None
            }
        });

        Subscription::batch([timer, resize, events])
    }

    fn view(&self) -> Element<Message> {
        let plan = layout::resolve(self.state.layout_mode, self.window_width);

        let page: Element<Message> = match (&self.state.result, self.state.selected_force) {
            _ if self.state.show_article => view::article(&self.state, &plan, self.loading_frame),
            (Some(report), Some(force)) => view::force_detail(report, force, &plan),
            _ => view::dashboard(&self.state, &plan, self.loading_frame),
        };

        container(
            column![view::header(&self.state, &plan), page, view::status_bar()]
                .spacing(16)
                .padding(plan.padding),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}
