//! Listing Loader Module
//! Discovers city CSV files and loads them with Polars.

use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("找不到檔案: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot read data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("讀取 CSV 發生錯誤: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// City label (file stem) to CSV file name, sorted by label.
pub fn get_city_options(data_dir: &Path) -> Result<BTreeMap<String, String>, LoaderError> {
    let entries = std::fs::read_dir(data_dir).map_err(|source| LoaderError::DataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let options: BTreeMap<String, String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter_map(|path| {
            let label = path.file_stem()?.to_string_lossy().to_string();
            let file_name = path.file_name()?.to_string_lossy().to_string();
            Some((label, file_name))
        })
        .collect();

    debug!(
        "Found {} city files in {}",
        options.len(),
        data_dir.display()
    );
    Ok(options)
}

/// Load a listings CSV. Every column is read as a string.
pub fn load_listings(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.is_file() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    // Schema inference disabled: derived columns do their own parsing
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    info!(
        "Loaded {} rows, {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Write a DataFrame to CSV with a header row.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<(), LoaderError> {
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    info!("Exported {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "標題,類型,總價,屋齡,建坪,格局,樓層,車位\n\
        信義美寓,公寓,1288,35,30.5,3房2廳1衛,4F/5F,\n\
        大安電梯,大樓,2560,8,42,3房2廳2衛,10F/15F,坡道平面\n";

    #[test]
    fn city_options_from_csv_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("台北市.csv"), SAMPLE).unwrap();
        fs::write(dir.path().join("新北市.CSV"), SAMPLE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore").unwrap();
        fs::create_dir(dir.path().join("archive.csv")).unwrap();

        let options = get_city_options(dir.path()).unwrap();
        let labels: Vec<&String> = options.keys().collect();
        assert_eq!(labels, vec!["台北市", "新北市"]);
        assert_eq!(options["新北市"], "新北市.CSV");
    }

    #[test]
    fn missing_data_dir_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = get_city_options(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, LoaderError::DataDir { .. }));
    }

    #[test]
    fn loads_all_columns_as_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("台北市.csv");
        fs::write(&path, SAMPLE).unwrap();

        let df = load_listings(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8);
        assert_eq!(df.column("總價").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("高雄市.csv");
        let err = load_listings(&path).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
        assert!(err.to_string().contains("找不到檔案"));
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.csv");
        fs::write(&src, SAMPLE).unwrap();
        let df = load_listings(&src).unwrap();

        let out = dir.path().join("out.csv");
        write_csv(&df, &out).unwrap();
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("標題,類型,總價"));
        assert_eq!(written.lines().count(), 3);
    }
}
