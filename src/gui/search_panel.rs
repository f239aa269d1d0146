//! Search Panel Widget
//! Left side panel with the property search form.

use crate::data::{ParkingChoice, HOUSE_TYPES};
use crate::search::{SearchForm, ValidationError, AGE_CEILING, AREA_CEILING, BUDGET_CEILING};
use egui::{Color32, ComboBox, DragValue, RichText, TextEdit};
use std::path::Path;

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// Left side panel holding the form inputs.
pub struct SearchPanel {
    pub form: SearchForm,
    pub cities: Vec<String>,
    /// Gemini key entered for this session; overrides the configured one.
    pub api_key: String,
    pub data_dir_label: String,
    pub status: String,
    pub search_enabled: bool,
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self {
            form: SearchForm::default(),
            cities: Vec::new(),
            api_key: String::new(),
            data_dir_label: String::new(),
            status: "Ready".to_string(),
            search_enabled: true,
        }
    }
}

impl SearchPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the city list, keeping the selection when still present.
    pub fn update_cities(&mut self, cities: Vec<String>, data_dir: &Path) {
        if !cities.contains(&self.form.city) {
            self.form.city = cities.first().cloned().unwrap_or_default();
        }
        self.cities = cities;
        self.data_dir_label = data_dir.display().to_string();
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn range_row(ui: &mut egui::Ui, label: &str, value: &mut u32, ceiling: u32, speed: f64) {
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new(label));
            ui.add(DragValue::new(value).range(0..=ceiling).speed(speed));
        });
    }

    fn show_error(ui: &mut egui::Ui, errors: &[ValidationError], which: ValidationError) {
        if errors.contains(&which) {
            ui.label(RichText::new(format!("⚠️ {which}")).size(11.0).color(ERROR_COLOR));
        }
    }

    /// Draw the search panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> SearchPanelAction {
        let mut action = SearchPanelAction::None;
        let combo_width = 150.0;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏠 房產搜尋")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 資料來源").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&self.data_dir_label).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 瀏覽").clicked() {
                            action = SearchPanelAction::BrowseDataDir;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Basic Filters =====
        ui.label(RichText::new("📍 房產篩選條件").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("城市："));
            ComboBox::from_id_salt("city")
                .width(combo_width)
                .selected_text(&self.form.city)
                .show_ui(ui, |ui| {
                    for city in &self.cities {
                        ui.selectable_value(&mut self.form.city, city.clone(), city);
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("房產類別："));
            ComboBox::from_id_salt("housetype")
                .width(combo_width)
                .selected_text(&self.form.housetype)
                .show_ui(ui, |ui| {
                    for housetype in HOUSE_TYPES {
                        ui.selectable_value(
                            &mut self.form.housetype,
                            housetype.to_string(),
                            *housetype,
                        );
                    }
                });
        });

        let errors = self.form.validate();

        ui.add_space(5.0);
        Self::range_row(ui, "💰預算上限(萬)", &mut self.form.budget_max, BUDGET_CEILING, 100.0);
        Self::range_row(ui, "💰預算下限(萬)", &mut self.form.budget_min, BUDGET_CEILING, 100.0);
        Self::show_error(ui, &errors, ValidationError::Budget);

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Detail Filters =====
        ui.label(RichText::new("🎯 房產要求細項").size(14.0).strong());
        ui.add_space(5.0);

        Self::range_row(ui, "屋齡上限", &mut self.form.age_max, AGE_CEILING, 1.0);
        Self::range_row(ui, "屋齡下限", &mut self.form.age_min, AGE_CEILING, 1.0);
        Self::show_error(ui, &errors, ValidationError::Age);

        Self::range_row(ui, "建坪上限", &mut self.form.area_max, AREA_CEILING, 10.0);
        Self::range_row(ui, "建坪下限", &mut self.form.area_min, AREA_CEILING, 10.0);
        Self::show_error(ui, &errors, ValidationError::Area);

        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("🅿️車位選擇"));
            ComboBox::from_id_salt("car_grip")
                .width(combo_width)
                .selected_text(self.form.parking.label())
                .show_ui(ui, |ui| {
                    for choice in ParkingChoice::ALL {
                        ui.selectable_value(&mut self.form.parking, choice, choice.label());
                    }
                });
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Special Requirements =====
        ui.label(RichText::new("🛠️ 特殊要求").size(14.0).strong());
        ui.label(
            RichText::new("可輸入文字，如：二房二廳一衛")
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add(
            TextEdit::multiline(&mut self.form.special_requests)
                .hint_text("請輸入")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        ui.horizontal(|ui| {
            ui.label("Gemini Key");
            ui.add(
                TextEdit::singleline(&mut self.api_key)
                    .password(true)
                    .hint_text("選填")
                    .desired_width(180.0),
            );
        });

        ui.add_space(15.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let enabled = self.search_enabled && !self.cities.is_empty();
            ui.add_enabled_ui(enabled, |ui| {
                let button = egui::Button::new(RichText::new("🔍 搜尋").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = SearchPanelAction::Search;
                }
            });
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        let status_color = if self.status.starts_with('❌') || self.status.contains("Error") {
            ERROR_COLOR
        } else if self.status.starts_with('✅') {
            SUCCESS_COLOR
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by the search panel
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPanelAction {
    None,
    BrowseDataDir,
    Search,
}
