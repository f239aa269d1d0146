//! Results View Widget
//! Central panel: search summary, model debug output and a paged table.

use crate::data::ListingProcessor;
use crate::search::SearchOutcome;
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::*;

const WARNING_COLOR: Color32 = Color32::from_rgb(255, 193, 7);
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Rows `[start, end)` of the given 1-based page.
fn page_bounds(page: usize, page_size: usize, total: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total);
    (start, (start + page_size).min(total))
}

fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Displays the latest search outcome.
pub struct ResultsView {
    pub outcome: Option<SearchOutcome>,
    pub current_search_page: usize,
    pub page_size: usize,
    columns: Vec<String>,
}

impl ResultsView {
    pub fn new(page_size: usize) -> Self {
        Self {
            outcome: None,
            current_search_page: 1,
            page_size: page_size.max(1),
            columns: Vec::new(),
        }
    }

    /// Store a new outcome and go back to the first page.
    pub fn set_outcome(&mut self, outcome: SearchOutcome) {
        self.columns = ListingProcessor::source_columns(&outcome.results);
        self.outcome = Some(outcome);
        self.current_search_page = 1;
    }

    pub fn total_pages(&self) -> usize {
        let rows = self.outcome.as_ref().map_or(0, |o| o.results.height());
        page_count(rows, self.page_size)
    }

    /// Cell text for the visible page, row-major.
    fn page_rows(&self, df: &DataFrame) -> Vec<Vec<String>> {
        let (start, end) = page_bounds(self.current_search_page, self.page_size, df.height());
        (start..end)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|name| {
                        df.column(name)
                            .ok()
                            .and_then(|col| col.get(row).ok())
                            .map(cell_text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ResultsAction {
        let mut action = ResultsAction::None;

        let Some(outcome) = &self.outcome else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("請設定條件後按下搜尋").size(20.0));
            });
            return action;
        };

        let params = &outcome.params;
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(format!("📍 {}", params.city)).strong());
            ui.label(format!("類別: {}", params.housetype));
            ui.label(format!("預算: {}", params.budget_range));
            ui.label(format!("屋齡: {}", params.age_range));
            ui.label(format!("建坪: {}", params.area_range));
            ui.label(format!("車位: {}", params.car_grip));
        });

        let found = params.filtered_count > 0;
        ui.label(
            RichText::new(params.status_message())
                .size(14.0)
                .color(if found { SUCCESS_COLOR } else { WARNING_COLOR }),
        );

        let special = &outcome.special;
        if !special.requirements.is_empty() {
            ui.label(format!("🛠️ 特殊要求: {}", special.requirements.describe()));
        }
        if let Some(error) = &special.error {
            ui.label(RichText::new(format!("❌ {error}")).color(ERROR_COLOR));
        }
        if let Some(reply) = &special.raw_reply {
            egui::CollapsingHeader::new("🔎 Gemini 回傳（debug）")
                .default_open(false)
                .show(ui, |ui| {
                    ui.code(reply);
                });
        }

        ui.add_space(8.0);
        ui.separator();

        if !found {
            return action;
        }

        let total_pages = self.total_pages();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.current_search_page > 1, egui::Button::new("◀ 上一頁"))
                .clicked()
            {
                self.current_search_page -= 1;
            }
            ui.label(format!("{} / {}", self.current_search_page, total_pages));
            if ui
                .add_enabled(
                    self.current_search_page < total_pages,
                    egui::Button::new("下一頁 ▶"),
                )
                .clicked()
            {
                self.current_search_page += 1;
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("💾 匯出 CSV").clicked() {
                    action = ResultsAction::ExportCsv;
                }
            });
        });

        ui.add_space(5.0);

        let Some(outcome) = &self.outcome else {
            return action;
        };
        let rows = self.page_rows(&outcome.results);

        ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            egui::Grid::new("results_table")
                .striped(true)
                .min_col_width(60.0)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for name in &self.columns {
                        ui.label(RichText::new(name).strong());
                    }
                    ui.end_row();

                    for row in &rows {
                        for cell in row {
                            ui.label(cell);
                        }
                        ui.end_row();
                    }
                });
        });

        action
    }
}

/// Actions triggered by the results view
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsAction {
    None,
    ExportCsv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ListingProcessor, ParkingChoice};
    use crate::search::SearchForm;
    use crate::special::SpecialOutcome;

    fn outcome(rows: usize) -> SearchOutcome {
        let titles: Vec<String> = (1..=rows).map(|i| format!("物件{i}")).collect();
        let floors: Vec<String> = (1..=rows).map(|i| format!("{i}F/20F")).collect();
        let df = DataFrame::new(vec![
            Column::new("標題".into(), titles),
            Column::new("樓層".into(), floors),
        ])
        .unwrap();
        let results = ListingProcessor::derive_columns(df).unwrap();
        let form = SearchForm {
            city: "台北市".into(),
            parking: ParkingChoice::Any,
            ..Default::default()
        };
        SearchOutcome {
            params: form.params(rows, rows),
            results,
            special: SpecialOutcome::default(),
        }
    }

    #[test]
    fn page_math() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_bounds(1, 10, 25), (0, 10));
        assert_eq!(page_bounds(3, 10, 25), (20, 25));
        assert_eq!(page_bounds(9, 10, 25), (25, 25));
    }

    #[test]
    fn new_outcome_resets_page_and_hides_derived_columns() {
        let mut view = ResultsView::new(10);
        view.set_outcome(outcome(25));
        view.current_search_page = 3;
        assert_eq!(view.total_pages(), 3);

        view.set_outcome(outcome(5));
        assert_eq!(view.current_search_page, 1);
        assert_eq!(view.columns, vec!["標題", "樓層"]);
    }

    #[test]
    fn page_rows_render_cells() {
        let mut view = ResultsView::new(2);
        view.set_outcome(outcome(3));
        view.current_search_page = 2;
        let df = view.outcome.as_ref().unwrap().results.clone();
        let rows = view.page_rows(&df);
        assert_eq!(rows, vec![vec!["物件3".to_string(), "3F/20F".to_string()]]);
    }
}
