//! Search Flow
//! Validate the form, load the city CSV, derive columns, merge special
//! requirements and filter.

use crate::data::{
    filter_properties, load_listings, ListingProcessor, LoaderError, NumRange, ParkingChoice,
    ProcessorError, SearchFilters, ANY,
};
use crate::special::{resolve_special, SpecialOutcome, SpecialParser};
use log::info;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

pub const BUDGET_CEILING: u32 = 1_000_000;
pub const AGE_CEILING: u32 = 100;
pub const AREA_CEILING: u32 = 1000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("預算下限不能大於上限！")]
    Budget,
    #[error("屋齡下限不能大於上限！")]
    Age,
    #[error("建坪下限不能大於上限！")]
    Area,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
    #[error("Unknown city: {0}")]
    UnknownCity(String),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Failed to process listings: {0}")]
    Processor(#[from] ProcessorError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw search form inputs. Money in 萬, area in 坪, age in years.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub city: String,
    pub housetype: String,
    pub budget_min: u32,
    pub budget_max: u32,
    pub age_min: u32,
    pub age_max: u32,
    pub area_min: u32,
    pub area_max: u32,
    pub parking: ParkingChoice,
    pub special_requests: String,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            city: String::new(),
            housetype: ANY.to_string(),
            budget_min: 0,
            budget_max: BUDGET_CEILING,
            age_min: 0,
            age_max: AGE_CEILING,
            area_min: 0,
            area_max: AREA_CEILING,
            parking: ParkingChoice::Any,
            special_requests: String::new(),
        }
    }
}

impl SearchForm {
    /// Range errors; a budget upper bound of 0 means unlimited.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.budget_min > self.budget_max && self.budget_max > 0 {
            errors.push(ValidationError::Budget);
        }
        if self.age_min > self.age_max {
            errors.push(ValidationError::Age);
        }
        if self.area_min > self.area_max {
            errors.push(ValidationError::Area);
        }
        errors
    }

    pub fn filters(&self) -> SearchFilters {
        let mut filters = SearchFilters {
            // A budget upper bound of 0 means "no limit"; age and area use it literally
            budget: NumRange::from_form(self.budget_min, self.budget_max, BUDGET_CEILING, true),
            age: NumRange::from_form(self.age_min, self.age_max, AGE_CEILING, false),
            area: NumRange::from_form(self.area_min, self.area_max, AREA_CEILING, false),
            parking: self.parking,
            ..Default::default()
        };
        filters.set_housetype(&self.housetype);
        filters
    }

    pub fn params(&self, original_count: usize, filtered_count: usize) -> SearchParams {
        SearchParams {
            city: self.city.clone(),
            housetype: self.housetype.clone(),
            budget_range: format_range(self.budget_min, self.budget_max, BUDGET_CEILING, "萬"),
            age_range: format_range(self.age_min, self.age_max, AGE_CEILING, "年"),
            area_range: format_range(self.area_min, self.area_max, AREA_CEILING, "坪"),
            car_grip: self.parking.label().to_string(),
            original_count,
            filtered_count,
        }
    }
}

fn format_range(min: u32, max: u32, ceiling: u32, unit: &str) -> String {
    if max < ceiling {
        format!("{min}-{max}{unit}")
    } else {
        format!("{min}{unit}以上")
    }
}

/// Summary of a completed search, shown above the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub city: String,
    pub housetype: String,
    pub budget_range: String,
    pub age_range: String,
    pub area_range: String,
    pub car_grip: String,
    pub original_count: usize,
    pub filtered_count: usize,
}

impl SearchParams {
    pub fn status_message(&self) -> String {
        if self.filtered_count == 0 {
            "😅 沒有找到符合條件的房產，請調整篩選條件後重新搜尋".to_string()
        } else {
            format!(
                "✅ 從 {} 筆資料中篩選出 {} 筆符合條件的房產",
                self.original_count, self.filtered_count
            )
        }
    }

    /// Write as pretty JSON next to an exported result file.
    pub fn write_json(&self, path: &Path) -> Result<(), LoaderError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::from)?;
        Ok(())
    }
}

pub struct SearchOutcome {
    pub results: DataFrame,
    pub params: SearchParams,
    pub special: SpecialOutcome,
}

/// Run one search. Validation errors stop before any file is read.
pub fn run_search(
    form: &SearchForm,
    data_dir: &Path,
    options: &BTreeMap<String, String>,
    parser: SpecialParser<'_>,
) -> Result<SearchOutcome, SearchError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(SearchError::Invalid(errors));
    }

    let file_name = options
        .get(&form.city)
        .ok_or_else(|| SearchError::UnknownCity(form.city.clone()))?;
    let path = data_dir.join(file_name);

    let df = load_listings(&path)?;
    let df = ListingProcessor::derive_columns(df)?;

    let mut filters = form.filters();
    let special = resolve_special(&form.special_requests, parser);
    special.requirements.apply(&mut filters);

    let results = filter_properties(&df, &filters)?;
    let params = form.params(df.height(), results.height());
    info!(
        "Search {}: {} of {} listings match",
        form.city, params.filtered_count, params.original_count
    );

    Ok(SearchOutcome {
        results,
        params,
        special,
    })
}
