//! Listing Filter Module
//! Range and category filters over a derived listing table.

use super::columns::{
    AGE, AREA, BATHROOMS, FLOOR, FLOOR_MAX, HAS_PARKING, LIVING_ROOMS, PRICE, ROOMS, SRC_TYPE,
};
use super::parse::IntRange;
use super::processor::ProcessorError;
use polars::prelude::*;

/// Property categories offered by the form; `不限` means any.
pub const HOUSE_TYPES: &[&str] = &[
    "不限", "大樓", "華廈", "公寓", "套房", "透天", "店面", "辦公", "別墅", "倉庫", "廠房", "土地",
    "單售車位", "其它",
];

pub const ANY: &str = "不限";

/// Optional inclusive bounds on a float column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumRange {
    /// Convert form bounds: a lower bound of zero and an upper bound at the
    /// ceiling are unconstrained. With `open_at_zero` an upper bound of zero
    /// is unconstrained too.
    pub fn from_form(min: u32, max: u32, ceiling: u32, open_at_zero: bool) -> Self {
        let open_max = max >= ceiling || (open_at_zero && max == 0);
        Self {
            min: (min > 0).then_some(min as f64),
            max: (!open_max).then_some(max as f64),
        }
    }
}

/// Parking selection: 不限 / 需要 / 不要.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParkingChoice {
    #[default]
    Any,
    Required,
    Excluded,
}

impl ParkingChoice {
    pub const ALL: [ParkingChoice; 3] = [Self::Any, Self::Required, Self::Excluded];

    pub fn label(self) -> &'static str {
        match self {
            Self::Any => "不限",
            Self::Required => "需要",
            Self::Excluded => "不要",
        }
    }
}

/// Everything a search constrains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub housetype: Option<String>,
    pub budget: NumRange,
    pub age: NumRange,
    pub area: NumRange,
    pub parking: ParkingChoice,
    pub rooms: Option<IntRange>,
    pub living_rooms: Option<IntRange>,
    pub bathrooms: Option<IntRange>,
    pub floor: Option<IntRange>,
}

impl SearchFilters {
    pub fn set_housetype(&mut self, housetype: &str) {
        let housetype = housetype.trim();
        self.housetype = (!housetype.is_empty() && housetype != ANY).then(|| housetype.to_string());
    }
}

fn push_num(preds: &mut Vec<Expr>, column: &str, range: NumRange) {
    if let Some(min) = range.min {
        preds.push(col(column).gt_eq(lit(min)));
    }
    if let Some(max) = range.max {
        preds.push(col(column).lt_eq(lit(max)));
    }
}

fn push_int(preds: &mut Vec<Expr>, min_column: &str, max_column: &str, range: Option<IntRange>) {
    let Some(range) = range else {
        return;
    };
    if let Some(min) = range.min {
        preds.push(col(min_column).gt_eq(lit(min)));
    }
    if let Some(max) = range.max {
        preds.push(col(max_column).lt_eq(lit(max)));
    }
}

fn housetype_mask(df: &DataFrame, housetype: &str) -> Result<BooleanChunked, ProcessorError> {
    let Ok(column) = df.column(SRC_TYPE) else {
        return Ok(BooleanChunked::full("mask".into(), false, df.height()));
    };
    let as_str = column.cast(&DataType::String)?;
    let ca = as_str.as_materialized_series().str()?;
    let matches: Vec<bool> = ca
        .into_iter()
        .map(|cell| cell.is_some_and(|s| s.contains(housetype)))
        .collect();
    Ok(BooleanChunked::from_slice("mask".into(), &matches))
}

/// Keep rows that satisfy every constrained filter. Rows with a null in a
/// constrained column are dropped; row order is preserved.
pub fn filter_properties(
    df: &DataFrame,
    filters: &SearchFilters,
) -> Result<DataFrame, ProcessorError> {
    let df = match &filters.housetype {
        Some(housetype) => df.filter(&housetype_mask(df, housetype)?)?,
        None => df.clone(),
    };

    let mut preds: Vec<Expr> = Vec::new();
    push_num(&mut preds, PRICE, filters.budget);
    push_num(&mut preds, AGE, filters.age);
    push_num(&mut preds, AREA, filters.area);
    match filters.parking {
        ParkingChoice::Any => {}
        ParkingChoice::Required => preds.push(col(HAS_PARKING).eq(lit(true))),
        ParkingChoice::Excluded => preds.push(col(HAS_PARKING).eq(lit(false))),
    }
    push_int(&mut preds, ROOMS, ROOMS, filters.rooms);
    push_int(&mut preds, LIVING_ROOMS, LIVING_ROOMS, filters.living_rooms);
    push_int(&mut preds, BATHROOMS, BATHROOMS, filters.bathrooms);
    // The unit's whole floor span must fall inside the requested range
    push_int(&mut preds, FLOOR, FLOOR_MAX, filters.floor);

    let Some(predicate) = preds.into_iter().reduce(|acc, p| acc.and(p)) else {
        return Ok(df);
    };
    Ok(df.lazy().filter(predicate).collect()?)
}
