//! Listing Text Parsers
//! Layout (格局), floor (樓層), numeric cells and LLM-supplied values.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Digits or a Chinese numeral such as 二, 兩, 十二.
const NUM: &str = r"[0-9]+|[一二兩三四五六七八九十〇零]+";

static ROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({NUM})\s*房")).expect("valid regex"));
static LIVING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({NUM})\s*廳")).expect("valid regex"));
static BATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({NUM})\s*衛")).expect("valid regex"));
static FLOOR_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(B?)({NUM})")).expect("valid regex"));
static NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(NUM).expect("valid regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("valid regex"));
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"({NUM})\s*(?:樓|層|房|廳|衛|F)?\s*(?:-|~|～|到|至)\s*({NUM})"
    ))
    .expect("valid regex")
});

/// Room counts parsed from a layout string like `3房2廳2衛`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub rooms: Option<i64>,
    pub living_rooms: Option<i64>,
    pub bathrooms: Option<i64>,
}

/// Floor span of a unit plus the building height, from e.g. `2~3F/12F`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub total: Option<i64>,
}

/// Inclusive integer bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRange {
    /// Build a range, swapping reversed bounds.
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        match (min, max) {
            (Some(a), Some(b)) if a > b => Self {
                min: Some(b),
                max: Some(a),
            },
            _ => Self { min, max },
        }
    }

    pub fn exact(value: i64) -> Self {
        Self::new(Some(value), Some(value))
    }

    pub fn at_least(value: i64) -> Self {
        Self::new(Some(value), None)
    }

    pub fn at_most(value: i64) -> Self {
        Self::new(None, Some(value))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl std::fmt::Display for IntRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.min, self.max) {
            (Some(a), Some(b)) if a == b => write!(f, "{a}"),
            (Some(a), Some(b)) => write!(f, "{a}-{b}"),
            (Some(a), None) => write!(f, "{a}以上"),
            (None, Some(b)) => write!(f, "{b}以下"),
            (None, None) => write!(f, "不限"),
        }
    }
}

fn cn_digit(ch: char) -> Option<i64> {
    match ch {
        '〇' | '零' => Some(0),
        '一' => Some(1),
        '二' | '兩' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

/// Parse ASCII digits or a Chinese numeral below one hundred.
pub fn parse_int_token(token: &str) -> Option<i64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    if let Some((tens, ones)) = token.split_once('十') {
        let tens = if tens.is_empty() {
            1
        } else {
            parse_cn_digits(tens)?
        };
        let ones = if ones.is_empty() {
            0
        } else {
            parse_cn_digits(ones)?
        };
        return tens.checked_mul(10)?.checked_add(ones);
    }
    parse_cn_digits(token)
}

fn parse_cn_digits(s: &str) -> Option<i64> {
    s.chars()
        .try_fold(0i64, |acc, ch| acc.checked_mul(10)?.checked_add(cn_digit(ch)?))
}

fn capture_int(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_int_token(m.as_str()))
}

/// Parse `N房N廳N衛`; absent parts are `None`.
pub fn parse_layout(text: &str) -> Layout {
    Layout {
        rooms: capture_int(&ROOMS_RE, text),
        living_rooms: capture_int(&LIVING_RE, text),
        bathrooms: capture_int(&BATH_RE, text),
    }
}

fn floor_tokens(part: &str) -> Vec<i64> {
    FLOOR_TOKEN_RE
        .captures_iter(part)
        .filter_map(|caps| {
            let value = parse_int_token(caps.get(2)?.as_str())?;
            Some(if caps.get(1).is_some_and(|b| !b.as_str().is_empty()) {
                -value
            } else {
                value
            })
        })
        .collect()
}

/// Parse a floor cell such as `3F/12F`, `2~3樓/5樓` or `B1/10F`.
pub fn parse_floor(text: &str) -> FloorRange {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '／' => '/',
            'b' => 'B',
            'f' => 'F',
            other => other,
        })
        .collect();
    let (unit, total_part) = match normalized.split_once('/') {
        Some((unit, total)) => (unit, Some(total)),
        None => (normalized.as_str(), None),
    };
    let total = total_part.and_then(|t| floor_tokens(t).into_iter().max());

    if unit.contains("整棟") || unit.contains("全棟") {
        return FloorRange {
            min: total.map(|_| 1),
            max: total,
            total,
        };
    }
    if unit.contains("頂樓") && !unit.chars().any(|c| c.is_ascii_digit()) {
        return FloorRange {
            min: total,
            max: total,
            total,
        };
    }

    let tokens = floor_tokens(unit);
    FloorRange {
        min: tokens.iter().copied().min(),
        max: tokens.iter().copied().max(),
        total,
    }
}

/// First decimal number in a cell like `1,288萬` or ` 12.5 年`.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && *c != '，' && !c.is_whitespace())
        .collect();
    DECIMAL_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn is_unlimited(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "" | "不限" | "無" | "无" | "任意" | "皆可" | "都可以" | "none" | "null" | "any" | "n/a"
    )
}

fn normalize_string(s: &str) -> Option<IntRange> {
    let s = s.trim();
    if is_unlimited(s) {
        return None;
    }
    if let Some(caps) = RANGE_RE.captures(s) {
        let a = parse_int_token(caps.get(1)?.as_str());
        let b = parse_int_token(caps.get(2)?.as_str());
        if a.is_some() && b.is_some() {
            return Some(IntRange::new(a, b));
        }
    }
    let first = NUM_RE
        .find_iter(s)
        .find_map(|m| parse_int_token(m.as_str()))?;
    if s.contains("以上") || s.contains("至少") || s.contains("起") || s.ends_with('+') {
        Some(IntRange::at_least(first))
    } else if s.contains("以下")
        || s.contains("最多")
        || s.contains("以內")
        || s.contains("以内")
        || s.contains("之內")
    {
        Some(IntRange::at_most(first))
    } else {
        Some(IntRange::exact(first))
    }
}

fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => normalize_string(s).and_then(|r| r.min.or(r.max)),
        _ => None,
    }
}

/// Normalize one value from the LLM's JSON reply into a range constraint.
pub fn normalize_special_value(value: &Value) -> Option<IntRange> {
    match value {
        Value::Number(_) => value_as_int(value).map(IntRange::exact),
        Value::String(s) => normalize_string(s),
        Value::Array(items) => {
            let ints: Vec<i64> = items.iter().filter_map(value_as_int).collect();
            match ints.as_slice() {
                [] => None,
                [only] => Some(IntRange::exact(*only)),
                [first, .., last] => Some(IntRange::new(Some(*first), Some(*last))),
            }
        }
        Value::Object(map) => {
            let pick = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(value_as_int));
            let range = IntRange::new(
                pick(&["min", "最低", "下限", "from"]),
                pick(&["max", "最高", "上限", "to"]),
            );
            (!range.is_unbounded()).then_some(range)
        }
        Value::Null | Value::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chinese_numerals() {
        assert_eq!(parse_int_token("三"), Some(3));
        assert_eq!(parse_int_token("兩"), Some(2));
        assert_eq!(parse_int_token("十"), Some(10));
        assert_eq!(parse_int_token("十二"), Some(12));
        assert_eq!(parse_int_token("二十"), Some(20));
        assert_eq!(parse_int_token("二十三"), Some(23));
        assert_eq!(parse_int_token("15"), Some(15));
        assert_eq!(parse_int_token("房"), None);
    }

    #[test]
    fn oversized_numerals_are_rejected() {
        let long = "九".repeat(25);
        assert_eq!(parse_int_token(&long), None);
        assert_eq!(parse_int_token(&format!("{long}十一")), None);
        assert_eq!(parse_int_token(&"9".repeat(25)), None);

        let layout = parse_layout(&format!("{long}房2廳1衛"));
        assert_eq!(layout.rooms, None);
        assert_eq!(layout.living_rooms, Some(2));
        assert_eq!(parse_floor(&format!("{long}樓/5樓")).min, None);
        assert_eq!(normalize_special_value(&json!(format!("{long}房"))), None);
    }

    #[test]
    fn layout_with_digits() {
        assert_eq!(
            parse_layout("3房2廳2衛"),
            Layout {
                rooms: Some(3),
                living_rooms: Some(2),
                bathrooms: Some(2)
            }
        );
    }

    #[test]
    fn layout_with_chinese_numerals_and_spaces() {
        let layout = parse_layout("二房 二廳 一衛");
        assert_eq!(layout.rooms, Some(2));
        assert_eq!(layout.living_rooms, Some(2));
        assert_eq!(layout.bathrooms, Some(1));
    }

    #[test]
    fn partial_and_missing_layout() {
        let layout = parse_layout("1房1衛");
        assert_eq!(layout.rooms, Some(1));
        assert_eq!(layout.living_rooms, None);
        assert_eq!(layout.bathrooms, Some(1));
        assert_eq!(parse_layout("開放格局"), Layout::default());
    }

    #[test]
    fn single_floor_with_total() {
        assert_eq!(
            parse_floor("3F/12F"),
            FloorRange {
                min: Some(3),
                max: Some(3),
                total: Some(12)
            }
        );
    }

    #[test]
    fn floor_span_and_basement() {
        let span = parse_floor("2~3樓/5樓");
        assert_eq!((span.min, span.max, span.total), (Some(2), Some(3), Some(5)));
        let basement = parse_floor("B1/10F");
        assert_eq!((basement.min, basement.max), (Some(-1), Some(-1)));
        assert_eq!(basement.total, Some(10));
        assert_eq!(parse_floor("三樓").min, Some(3));
    }

    #[test]
    fn whole_building_and_garbage() {
        let whole = parse_floor("整棟/4F");
        assert_eq!((whole.min, whole.max), (Some(1), Some(4)));
        assert_eq!(parse_floor("頂樓/7F").min, Some(7));
        assert_eq!(parse_floor("--"), FloorRange::default());
        assert_eq!(parse_floor(""), FloorRange::default());
    }

    #[test]
    fn numbers_with_units_and_separators() {
        assert_eq!(parse_number("1,288萬"), Some(1288.0));
        assert_eq!(parse_number(" 12.5 年"), Some(12.5));
        assert_eq!(parse_number("35.02坪"), Some(35.02));
        assert_eq!(parse_number("洽詢"), None);
    }

    #[test]
    fn normalize_numbers_and_plain_strings() {
        assert_eq!(normalize_special_value(&json!(3)), Some(IntRange::exact(3)));
        assert_eq!(normalize_special_value(&json!(2.7)), Some(IntRange::exact(2)));
        assert_eq!(normalize_special_value(&json!("3")), Some(IntRange::exact(3)));
        assert_eq!(normalize_special_value(&json!("二房")), Some(IntRange::exact(2)));
    }

    #[test]
    fn normalize_ranges_and_open_bounds() {
        assert_eq!(
            normalize_special_value(&json!("3-5樓")),
            Some(IntRange::new(Some(3), Some(5)))
        );
        assert_eq!(
            normalize_special_value(&json!("8到3")),
            Some(IntRange::new(Some(3), Some(8)))
        );
        assert_eq!(
            normalize_special_value(&json!("5樓以上")),
            Some(IntRange::at_least(5))
        );
        assert_eq!(
            normalize_special_value(&json!("最多十樓")),
            Some(IntRange::at_most(10))
        );
    }

    #[test]
    fn normalize_separators_and_bound_words() {
        assert_eq!(
            normalize_special_value(&json!("2~4")),
            Some(IntRange::new(Some(2), Some(4)))
        );
        assert_eq!(
            normalize_special_value(&json!("3至5層")),
            Some(IntRange::new(Some(3), Some(5)))
        );
        assert_eq!(normalize_special_value(&json!("3+")), Some(IntRange::at_least(3)));
        assert_eq!(normalize_special_value(&json!("至少2房")), Some(IntRange::at_least(2)));
        assert_eq!(normalize_special_value(&json!("10以內")), Some(IntRange::at_most(10)));
    }

    #[test]
    fn normalize_arrays_and_objects() {
        assert_eq!(
            normalize_special_value(&json!([2, 4])),
            Some(IntRange::new(Some(2), Some(4)))
        );
        assert_eq!(
            normalize_special_value(&json!({"min": 3, "max": "6"})),
            Some(IntRange::new(Some(3), Some(6)))
        );
        assert_eq!(
            normalize_special_value(&json!({"最低": 2})),
            Some(IntRange::at_least(2))
        );
        assert_eq!(
            normalize_special_value(&json!({"最高": "8樓"})),
            Some(IntRange::at_most(8))
        );
        assert_eq!(
            normalize_special_value(&json!([5, 2])),
            Some(IntRange::new(Some(2), Some(5)))
        );
        assert_eq!(
            normalize_special_value(&json!(["三", 4, 6])),
            Some(IntRange::new(Some(3), Some(6)))
        );
        assert_eq!(normalize_special_value(&json!({"note": "x"})), None);
    }

    #[test]
    fn normalize_unlimited_values() {
        assert_eq!(normalize_special_value(&json!(null)), None);
        assert_eq!(normalize_special_value(&json!(true)), None);
        assert_eq!(normalize_special_value(&json!("不限")), None);
        assert_eq!(normalize_special_value(&json!("無")), None);
        assert_eq!(normalize_special_value(&json!("")), None);
        assert_eq!(normalize_special_value(&json!("高樓層")), None);
    }

    #[test]
    fn range_display() {
        let range = IntRange::new(Some(3), Some(5));
        assert_eq!(range.to_string(), "3-5");
        assert_eq!(IntRange::at_least(5).to_string(), "5以上");
        assert_eq!(IntRange::exact(2).to_string(), "2");
        assert_eq!(IntRange::new(Some(9), Some(4)), IntRange::new(Some(4), Some(9)));
    }
}
