//! Listing Processor Module
//! Adds parsed numeric columns (layout, floor, price, age, area, parking).

use super::columns::{
    AGE, AREA, BATHROOMS, DERIVED, FLOOR, FLOOR_MAX, HAS_PARKING, LIVING_ROOMS, PRICE, ROOMS,
    SRC_AGE, SRC_AREA, SRC_FLOOR, SRC_LAYOUT, SRC_PARKING, SRC_PRICE, TOTAL_FLOORS,
};
use super::parse::{parse_floor, parse_layout, parse_number, FloorRange, Layout};
use polars::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Cell values meaning "no parking space".
const NO_PARKING: &[&str] = &["無", "无", "否", "0", "-", "--", "none", "no"];

/// Read a column as optional strings; a missing column yields all nulls.
fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let as_str = column.cast(&DataType::String)?;
    let ca = as_str.as_materialized_series().str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn has_parking(cell: Option<&str>) -> bool {
    cell.is_some_and(|s| !NO_PARKING.contains(&s.to_lowercase().as_str()))
}

/// Handles derived-column computation for listing tables.
pub struct ListingProcessor;

impl ListingProcessor {
    /// Append derived columns; original columns and row order are kept.
    pub fn derive_columns(mut df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let layouts: Vec<Layout> = string_values(&df, SRC_LAYOUT)?
            .par_iter()
            .map(|cell| cell.as_deref().map(parse_layout).unwrap_or_default())
            .collect();
        let floors: Vec<FloorRange> = string_values(&df, SRC_FLOOR)?
            .par_iter()
            .map(|cell| cell.as_deref().map(parse_floor).unwrap_or_default())
            .collect();

        let numeric = |name: &str| -> Result<Vec<Option<f64>>, ProcessorError> {
            Ok(string_values(&df, name)?
                .par_iter()
                .map(|cell| cell.as_deref().and_then(parse_number))
                .collect())
        };
        let price = numeric(SRC_PRICE)?;
        let age = numeric(SRC_AGE)?;
        let area = numeric(SRC_AREA)?;

        // Without a parking column nothing is known either way
        let parking: Vec<Option<bool>> = if df.column(SRC_PARKING).is_ok() {
            string_values(&df, SRC_PARKING)?
                .iter()
                .map(|cell| Some(has_parking(cell.as_deref())))
                .collect()
        } else {
            vec![None; df.height()]
        };

        let derived = vec![
            Column::new(ROOMS.into(), layouts.iter().map(|l| l.rooms).collect::<Vec<_>>()),
            Column::new(
                LIVING_ROOMS.into(),
                layouts.iter().map(|l| l.living_rooms).collect::<Vec<_>>(),
            ),
            Column::new(
                BATHROOMS.into(),
                layouts.iter().map(|l| l.bathrooms).collect::<Vec<_>>(),
            ),
            Column::new(FLOOR.into(), floors.iter().map(|f| f.min).collect::<Vec<_>>()),
            Column::new(FLOOR_MAX.into(), floors.iter().map(|f| f.max).collect::<Vec<_>>()),
            Column::new(
                TOTAL_FLOORS.into(),
                floors.iter().map(|f| f.total).collect::<Vec<_>>(),
            ),
            Column::new(PRICE.into(), price),
            Column::new(AGE.into(), age),
            Column::new(AREA.into(), area),
            Column::new(HAS_PARKING.into(), parking),
        ];

        for column in derived {
            df.with_column(column)?;
        }
        Ok(df)
    }

    /// Names of the columns that came from the CSV, in file order.
    pub fn source_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| !DERIVED.contains(&name.as_str()))
            .collect()
    }

    /// Drop derived columns, e.g. before export.
    pub fn strip_derived(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Ok(df.select(Self::source_columns(df))?)
    }
}
