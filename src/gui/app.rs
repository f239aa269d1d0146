//! Realty Search Main Application
//! Main window with search panel and results view.

use crate::config::AppConfig;
use crate::data::{get_city_options, write_csv, ListingProcessor};
use crate::gui::fonts::setup_fonts;
use crate::gui::{ResultsAction, ResultsView, SearchPanel, SearchPanelAction};
use crate::search::{run_search, SearchError, SearchForm, SearchOutcome};
use crate::special::{GeminiClient, SpecialParser};
use egui::SidePanel;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;

/// Search result from background thread
enum SearchMessage {
    Progress(String),
    Complete(Box<SearchOutcome>),
    Error(String),
}

impl SearchMessage {
    fn is_final(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Take every pending message. A sender that hung up before a final message
/// becomes an `Error`, so the caller always sees the search end.
fn drain_messages(rx: &Receiver<SearchMessage>) -> Vec<SearchMessage> {
    let mut messages = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(message) => {
                let is_final = message.is_final();
                messages.push(message);
                if is_final {
                    break;
                }
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                warn!("Search thread ended without a result");
                messages.push(SearchMessage::Error("搜尋中斷，請重新搜尋".to_string()));
                break;
            }
        }
    }
    messages
}

/// Main application window.
pub struct RealtyApp {
    config: AppConfig,
    city_options: BTreeMap<String, String>,
    search_panel: SearchPanel,
    results_view: ResultsView,

    // Async search
    search_rx: Option<Receiver<SearchMessage>>,
    is_searching: bool,
}

impl RealtyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        setup_fonts(&cc.egui_ctx, config.cjk_font.as_deref());

        let mut app = Self {
            results_view: ResultsView::new(config.page_size),
            config,
            city_options: BTreeMap::new(),
            search_panel: SearchPanel::new(),
            search_rx: None,
            is_searching: false,
        };
        app.reload_cities();
        app
    }

    /// Re-scan the data directory for city CSV files.
    fn reload_cities(&mut self) {
        match get_city_options(&self.config.data_dir) {
            Ok(options) => {
                let cities: Vec<String> = options.keys().cloned().collect();
                info!(
                    "{} cities available in {}",
                    cities.len(),
                    self.config.data_dir.display()
                );
                if cities.is_empty() {
                    self.search_panel.set_status("❌ 資料夾中沒有 CSV 檔案");
                } else {
                    self.search_panel.set_status("Ready");
                }
                self.search_panel.update_cities(cities, &self.config.data_dir);
                self.city_options = options;
            }
            Err(e) => {
                warn!("{e}");
                self.search_panel
                    .update_cities(Vec::new(), &self.config.data_dir);
                self.search_panel.set_status(&format!("❌ {e}"));
                self.city_options.clear();
            }
        }
    }

    fn handle_browse_data_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        {
            self.config.data_dir = dir;
            self.reload_cities();
        }
    }

    /// Key typed in the form wins over the configured one.
    fn api_key(&self) -> Option<String> {
        let typed = self.search_panel.api_key.trim();
        if !typed.is_empty() {
            return Some(typed.to_string());
        }
        self.config
            .gemini
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
    }

    /// Start search in background thread
    fn start_search(&mut self) {
        if self.is_searching {
            return;
        }
        let form = self.search_panel.form.clone();
        let errors = form.validate();
        if !errors.is_empty() {
            let message = SearchError::Invalid(errors).to_string();
            self.search_panel.set_status(&format!("❌ 請修正: {message}"));
            return;
        }

        let (tx, rx) = channel();
        self.search_rx = Some(rx);
        self.is_searching = true;
        self.search_panel.search_enabled = false;
        self.search_panel.set_status("Searching...");

        let config = self.config.clone();
        let options = self.city_options.clone();
        let api_key = self.api_key();

        thread::spawn(move || {
            Self::run_search_thread(tx, form, config, options, api_key);
        });
    }

    /// Run search (called from background thread)
    fn run_search_thread(
        tx: Sender<SearchMessage>,
        form: SearchForm,
        config: AppConfig,
        options: BTreeMap<String, String>,
        api_key: Option<String>,
    ) {
        let wants_special = !form.special_requests.trim().is_empty();
        let client = match api_key.filter(|_| wants_special) {
            Some(key) => match GeminiClient::new(&config.gemini, &key) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Gemini client unavailable: {e}");
                    None
                }
            },
            None => None,
        };

        let parser = match &client {
            Some(client) => {
                let _ = tx.send(SearchMessage::Progress(
                    "Gemini 解析特殊要求中...".to_string(),
                ));
                SpecialParser::Llm(client)
            }
            None if config.local_fallback => SpecialParser::Local,
            None => SpecialParser::Disabled,
        };

        let message = match run_search(&form, &config.data_dir, &options, parser) {
            Ok(outcome) => SearchMessage::Complete(Box::new(outcome)),
            Err(e) => {
                error!("Search failed: {e}");
                SearchMessage::Error(e.to_string())
            }
        };
        let _ = tx.send(message);
    }

    /// Check for search results
    fn check_search_results(&mut self) {
        let rx = self.search_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            for message in drain_messages(&rx) {
                match message {
                    SearchMessage::Progress(status) => {
                        self.search_panel.set_status(&status);
                    }
                    SearchMessage::Complete(outcome) => {
                        self.search_panel
                            .set_status(&outcome.params.status_message());
                        self.results_view.set_outcome(*outcome);
                        self.finish_search();
                        should_keep_receiver = false;
                    }
                    SearchMessage::Error(error) => {
                        self.search_panel.set_status(&format!("❌ {error}"));
                        self.finish_search();
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.search_rx = Some(rx);
            }
        }
    }

    fn finish_search(&mut self) {
        self.is_searching = false;
        self.search_panel.search_enabled = true;
    }

    /// Export the filtered rows (source columns only) plus the search summary.
    fn handle_export_csv(&mut self) {
        let Some(outcome) = &self.results_view.outcome else {
            return;
        };

        let default_name = format!("{}_搜尋結果.csv", outcome.params.city);
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        else {
            return; // User cancelled
        };

        let result = ListingProcessor::strip_derived(&outcome.results)
            .map_err(|e| e.to_string())
            .and_then(|df| write_csv(&df, &path).map_err(|e| e.to_string()))
            .and_then(|()| {
                let params_path: PathBuf = path.with_extension("json");
                outcome
                    .params
                    .write_json(&params_path)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => {
                self.search_panel
                    .set_status(&format!("✅ 已匯出 {}", path.display()));
                if let Err(e) = open::that(&path) {
                    warn!("Could not open {}: {e}", path.display());
                }
            }
            Err(e) => {
                error!("Export failed: {e}");
                self.search_panel.set_status(&format!("❌ Export error: {e}"));
            }
        }
    }
}

impl eframe::App for RealtyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_search_results();

        if self.is_searching {
            ctx.request_repaint();
        }

        // Left panel - Search form
        SidePanel::left("search_panel")
            .min_width(320.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.search_panel.show(ui) {
                        SearchPanelAction::BrowseDataDir => self.handle_browse_data_dir(),
                        SearchPanelAction::Search => self.start_search(),
                        SearchPanelAction::None => {}
                    }
                });
            });

        // Central panel - Results
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.results_view.show(ui) == ResultsAction::ExportCsv {
                self.handle_export_csv();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(messages: &[SearchMessage]) -> Vec<&str> {
        messages
            .iter()
            .map(|m| match m {
                SearchMessage::Progress(_) => "progress",
                SearchMessage::Complete(_) => "complete",
                SearchMessage::Error(_) => "error",
            })
            .collect()
    }

    #[test]
    fn pending_progress_keeps_search_running() {
        let (tx, rx) = channel();
        tx.send(SearchMessage::Progress("🔍 搜尋中...".to_string())).unwrap();
        assert_eq!(kinds(&drain_messages(&rx)), vec!["progress"]);
        assert!(drain_messages(&rx).is_empty());
        drop(tx);
    }

    #[test]
    fn dropped_sender_ends_search_with_error() {
        let (tx, rx) = channel();
        tx.send(SearchMessage::Progress("🔍 搜尋中...".to_string())).unwrap();
        drop(tx);
        let messages = drain_messages(&rx);
        assert_eq!(kinds(&messages), vec!["progress", "error"]);
        assert!(messages[1].is_final());
    }

    #[test]
    fn error_before_hang_up_is_reported_once() {
        let (tx, rx) = channel();
        tx.send(SearchMessage::Error("Unknown city: 火星".to_string())).unwrap();
        drop(tx);
        let messages = drain_messages(&rx);
        assert_eq!(kinds(&messages), vec!["error"]);
        match &messages[0] {
            SearchMessage::Error(text) => assert_eq!(text, "Unknown city: 火星"),
            _ => unreachable!(),
        }
    }
}
