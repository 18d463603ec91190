use serde_json::{Map, Number, Value as Json};
use valence_text::{IntoText, Text, TextContent};

use super::{
    error::{ProtoError, Result},
    io::{read_string_bounded, write_string_bounded},
    nbt::{Compound, List, Value, read_network_value, write_network_value},
    version::ProtocolVersion,
};

const MAX_JSON_CHARS: usize = 262_144;

/// Chat component backed by `valence_text`.
///
/// Written as a JSON string before 1.20.3 and as a tag tree from 1.20.3 on.
#[derive(Debug, Clone, PartialEq)]
pub struct Component(pub Text);

impl Component {
    pub fn text(text: impl Into<String>) -> Self {
        Self(Text::text(text.into()))
    }

    /// Plain text content of the root component, if it has any.
    pub fn plain(&self) -> Option<&str> {
        match &self.0.content {
            TextContent::Text { text } => Some(&**text),
            _ => None,
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|err| ProtoError::InvalidComponent(err.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map(Self)
            .map_err(|err| ProtoError::InvalidComponent(err.to_string()))
    }

    pub(crate) fn read(input: &mut &[u8], version: ProtocolVersion) -> Result<Self> {
        if version >= ProtocolVersion::MINECRAFT_1_20_3 {
            let json = nbt_to_json(&read_network_value(input, version)?);
            serde_json::from_value(json)
                .map(Self)
                .map_err(|err| ProtoError::InvalidComponent(err.to_string()))
        } else {
            Self::read_json(input)
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>, version: ProtocolVersion) -> Result<()> {
        if version >= ProtocolVersion::MINECRAFT_1_20_3 {
            let json = serde_json::to_value(&self.0)
                .map_err(|err| ProtoError::InvalidComponent(err.to_string()))?;
            write_network_value(out, &json_to_nbt(&json)?, version)
        } else {
            self.write_json(out)
        }
    }

    /// JSON form regardless of version (login disconnect keeps it).
    pub(crate) fn read_json(input: &mut &[u8]) -> Result<Self> {
        Self::from_json_str(read_string_bounded(input, MAX_JSON_CHARS)?)
    }

    pub(crate) fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        write_string_bounded(out, &self.to_json_string()?, MAX_JSON_CHARS)
    }
}

impl From<Text> for Component {
    fn from(value: Text) -> Self {
        Self(value)
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Component {
    fn from(value: String) -> Self {
        Self(value.into_text())
    }
}

/// Maps the JSON shape of a component onto tags.
///
/// Booleans become bytes; arrays mixing element types become lists of
/// compounds keyed by the empty string.
fn json_to_nbt(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => return Err(ProtoError::InvalidComponent("null value".into())),
        Json::Bool(b) => Value::Byte(*b as i8),
        Json::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Long(i),
            },
            None => Value::Double(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => {
            let values = items.iter().map(json_to_nbt).collect::<Result<Vec<_>>>()?;
            Value::List(into_list(values))
        }
        Json::Object(map) => {
            let mut compound = Compound::new();
            for (key, value) in map {
                compound.insert(key.clone(), json_to_nbt(value)?);
            }
            Value::Compound(compound)
        }
    })
}

macro_rules! homogeneous {
    ($values:ident, $($variant:ident),+) => {
        $(
            if $values.iter().all(|v| matches!(v, Value::$variant(_))) {
                return List::$variant(
                    $values
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::$variant(inner) => Some(inner),
                            _ => None,
                        })
                        .collect(),
                );
            }
        )+
    };
}

fn into_list(values: Vec<Value>) -> List {
    if values.is_empty() {
        return List::End;
    }
    homogeneous!(values, Byte, Int, Long, Double, String, List, Compound);

    List::Compound(
        values
            .into_iter()
            .map(|value| {
                let mut wrapper = Compound::new();
                wrapper.insert(String::new(), value);
                wrapper
            })
            .collect(),
    )
}

/// Inverse of [`json_to_nbt`]; bytes holding 0 or 1 map to booleans.
fn nbt_to_json(value: &Value) -> Json {
    match value {
        Value::Byte(0) => Json::Bool(false),
        Value::Byte(1) => Json::Bool(true),
        Value::Byte(b) => Json::from(*b),
        Value::Short(v) => Json::from(*v),
        Value::Int(v) => Json::from(*v),
        Value::Long(v) => Json::from(*v),
        Value::Float(v) => float_json(*v as f64),
        Value::Double(v) => float_json(*v),
        Value::ByteArray(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
        Value::String(s) => Json::String(s.clone()),
        Value::List(list) => list_to_json(list),
        Value::Compound(compound) => compound_to_json(compound),
        Value::IntArray(v) => Json::Array(v.iter().map(|i| Json::from(*i)).collect()),
        Value::LongArray(v) => Json::Array(v.iter().map(|i| Json::from(*i)).collect()),
    }
}

fn compound_to_json(compound: &Compound) -> Json {
    Json::Object(
        compound
            .iter()
            .map(|(k, v)| (k.clone(), nbt_to_json(v)))
            .collect::<Map<_, _>>(),
    )
}

fn list_to_json(list: &List) -> Json {
    fn each<T>(items: &[T], f: impl Fn(&T) -> Json) -> Json {
        Json::Array(items.iter().map(f).collect())
    }

    match list {
        List::End => Json::Array(Vec::new()),
        List::Byte(v) => each(v, |b| nbt_to_json(&Value::Byte(*b))),
        List::Short(v) => each(v, |i| Json::from(*i)),
        List::Int(v) => each(v, |i| Json::from(*i)),
        List::Long(v) => each(v, |i| Json::from(*i)),
        List::Float(v) => each(v, |f| float_json(*f as f64)),
        List::Double(v) => each(v, |f| float_json(*f)),
        List::ByteArray(v) => each(v, |a| nbt_to_json(&Value::ByteArray(a.clone()))),
        List::String(v) => each(v, |s| Json::String(s.clone())),
        List::List(v) => each(v, list_to_json),
        List::Compound(v) => each(v, |c| match c.get("") {
            Some(inner) if c.len() == 1 => nbt_to_json(inner),
            _ => compound_to_json(c),
        }),
        List::IntArray(v) => each(v, |a| nbt_to_json(&Value::IntArray(a.clone()))),
        List::LongArray(v) => each(v, |a| nbt_to_json(&Value::LongArray(a.clone()))),
    }
}

fn float_json(v: f64) -> Json {
    Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use valence_text::Color;

    use super::*;

    #[test]
    fn mixed_json_array_wraps_elements() {
        let value = json!({"text": "", "extra": ["a", {"text": "b", "bold": true}]});
        let tag = json_to_nbt(&value).unwrap();
        let Value::Compound(root) = &tag else {
            panic!("expected compound");
        };
        let Some(Value::List(List::Compound(extra))) = root.get("extra") else {
            panic!("expected compound list");
        };
        assert!(extra.iter().all(|c| c.contains_key("")));
        assert_eq!(nbt_to_json(&tag), value);
    }

    #[test]
    fn styled_text_survives_the_tag_form() {
        let styled = Component("Kicked".into_text().color(Color::RED));
        for version in [ProtocolVersion::MINECRAFT_1_20_2, ProtocolVersion::MINECRAFT_1_21_6] {
            let mut out = Vec::new();
            styled.write(&mut out, version).unwrap();
            let mut input = out.as_slice();
            assert_eq!(Component::read(&mut input, version).unwrap(), styled);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn bare_string_root_is_plain_text() {
        let mut input: &[u8] = &[8, 0, 3, b'b', b'y', b'e'];
        let component = Component::read(&mut input, ProtocolVersion::MINECRAFT_1_21).unwrap();
        assert_eq!(component.plain(), Some("bye"));
    }

    #[test]
    fn json_string_is_accepted_before_1_20_3() {
        let component = Component::from_json_str("\"hello\"").unwrap();
        assert_eq!(component.plain(), Some("hello"));
        assert!(matches!(
            Component::from_json_str("{"),
            Err(ProtoError::InvalidComponent(_))
        ));
    }
}
