//! LLM reply post-processing: JSON extraction and key normalization

use super::{SpecialError, SpecialRequirements};
use crate::data::normalize_special_value;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Rooms,
    LivingRooms,
    Bathrooms,
    Floor,
}

fn field_for(key: &str) -> Option<Field> {
    match key {
        "房間數" | "房數" | "房" | "rooms" => Some(Field::Rooms),
        "廳數" | "廳" | "living_rooms" => Some(Field::LivingRooms),
        "衛數" | "衛" | "衛浴" | "bathrooms" => Some(Field::Bathrooms),
        "樓層" | "floor" => Some(Field::Floor),
        _ => None,
    }
}

/// Prompt asking the model for the four layout/floor fields as pure JSON.
pub fn build_prompt(text: &str) -> String {
    format!(
        "請將下列房產需求解析為**純 JSON**：\n\
         \"\"\"{text}\"\"\"\n\
         JSON 欄位請包含：房間數、廳數、衛數、樓層\n\
         沒有提到的欄位請填 null；樓層可用範圍，例如 \"3-5\" 或 \"5以上\"。"
    )
}

/// Parse the whole reply as JSON, falling back to the outermost `{...}`
/// with full-width punctuation replaced.
fn extract_object(reply: &str) -> Result<Map<String, Value>, SpecialError> {
    let text = reply.trim();
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => {
            let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
                return Err(SpecialError::NoJson);
            };
            if end < start {
                return Err(SpecialError::NoJson);
            }
            let candidate = text[start..=end].replace('：', ":").replace('，', ",");
            serde_json::from_str::<Value>(&candidate)?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SpecialError::NotAnObject),
    }
}

/// Turn a model reply into structured requirements; unknown keys and
/// unusable values are dropped.
pub fn parse_reply(reply: &str) -> Result<SpecialRequirements, SpecialError> {
    let map = extract_object(reply)?;
    let mut requirements = SpecialRequirements::default();

    for (key, value) in &map {
        let key = key.trim();
        let Some(field) = field_for(key).or_else(|| field_for(&key.to_lowercase())) else {
            continue;
        };
        let Some(range) = normalize_special_value(value) else {
            continue;
        };
        let slot = match field {
            Field::Rooms => &mut requirements.rooms,
            Field::LivingRooms => &mut requirements.living_rooms,
            Field::Bathrooms => &mut requirements.bathrooms,
            Field::Floor => &mut requirements.floor,
        };
        *slot = Some(range);
    }
    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IntRange;

    #[test]
    fn plain_json_reply() {
        let req = parse_reply(r#"{"房間數": 2, "廳數": 2, "衛數": 1, "樓層": null}"#).unwrap();
        assert_eq!(req.rooms, Some(IntRange::exact(2)));
        assert_eq!(req.living_rooms, Some(IntRange::exact(2)));
        assert_eq!(req.bathrooms, Some(IntRange::exact(1)));
        assert_eq!(req.floor, None);
    }

    #[test]
    fn fenced_reply_with_fullwidth_punctuation() {
        let reply = "好的，以下是結果：\n```json\n{\"房間數\"：\"三房\"，\"樓層\"：\"5樓以上\"}\n```";
        let req = parse_reply(reply).unwrap();
        assert_eq!(req.rooms, Some(IntRange::exact(3)));
        assert_eq!(req.floor, Some(IntRange::at_least(5)));
    }

    #[test]
    fn english_and_padded_keys() {
        let req = parse_reply(r#"{" Rooms ": "3", "Floor": [2, 6], "budget": 1000}"#).unwrap();
        assert_eq!(req.rooms, Some(IntRange::exact(3)));
        assert_eq!(req.floor, Some(IntRange::new(Some(2), Some(6))));
        assert_eq!(req.bathrooms, None);
    }

    #[test]
    fn short_keys_map_to_fields() {
        let req = parse_reply(r#"{"廳": 1, "衛": "兩"}"#).unwrap();
        assert_eq!(req.living_rooms, Some(IntRange::exact(1)));
        assert_eq!(req.bathrooms, Some(IntRange::exact(2)));
    }

    #[test]
    fn reply_without_json_is_an_error() {
        assert!(matches!(parse_reply("抱歉，我無法理解"), Err(SpecialError::NoJson)));
        assert!(matches!(parse_reply("} nope {"), Err(SpecialError::NoJson)));
        assert!(matches!(parse_reply("[1, 2]"), Err(SpecialError::NotAnObject)));
        assert!(matches!(parse_reply("{broken"), Err(SpecialError::NoJson)));
        assert!(matches!(parse_reply("x {房間數: 2} y"), Err(SpecialError::Json(_))));
    }

    #[test]
    fn prompt_embeds_request() {
        let prompt = build_prompt("二房二廳一衛");
        assert!(prompt.contains("\"\"\"二房二廳一衛\"\"\""));
        assert!(prompt.contains("房間數"));
    }
}
