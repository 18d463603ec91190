//! Tag trees ("structured blobs") in the network format, on top of `valence_nbt`.
//!
//! From 1.20.2 the root tag is written without a name; older versions carry an
//! empty root name. `valence_nbt` always frames a named compound root, so the
//! network forms are produced by splicing that framing.

pub use valence_nbt::{Compound, List, Value};

use super::{
    error::{ProtoError, Result},
    io::{read_u16_be, take},
    version::ProtocolVersion,
};

const TAG_END: u8 = 0;
const TAG_STRING: u8 = 8;
const TAG_COMPOUND: u8 = 10;

fn nbt_error(err: impl std::fmt::Display) -> ProtoError {
    ProtoError::InvalidNbt(err.to_string())
}

fn nameless(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::MINECRAFT_1_20_2
}

pub(crate) fn read_network_compound(
    input: &mut &[u8],
    version: ProtocolVersion,
) -> Result<Compound> {
    match input.first() {
        None => return Err(ProtoError::UnexpectedEof),
        Some(&TAG_COMPOUND) => {}
        Some(&other) => return Err(ProtoError::InvalidTag(other)),
    }

    if !nameless(version) {
        let (compound, _name): (Compound, String) =
            valence_nbt::from_binary(input).map_err(nbt_error)?;
        return Ok(compound);
    }

    let mut framed = Vec::with_capacity(input.len() + 2);
    framed.extend_from_slice(&[TAG_COMPOUND, 0, 0]);
    framed.extend_from_slice(&input[1..]);
    let mut cursor = framed.as_slice();
    let (compound, _name): (Compound, String) =
        valence_nbt::from_binary(&mut cursor).map_err(nbt_error)?;
    let consumed = framed.len() - cursor.len() - 2;
    *input = &input[consumed..];
    Ok(compound)
}

pub(crate) fn write_network_compound(
    out: &mut Vec<u8>,
    compound: &Compound,
    version: ProtocolVersion,
) -> Result<()> {
    let mut framed = Vec::new();
    valence_nbt::to_binary(compound, &mut framed, "").map_err(nbt_error)?;
    if !nameless(version) {
        out.extend_from_slice(&framed);
        return Ok(());
    }
    // [10, name_len(2), payload..]
    let payload = framed.get(3..).ok_or(ProtoError::UnexpectedEof)?;
    out.push(TAG_COMPOUND);
    out.extend_from_slice(payload);
    Ok(())
}

/// Reads a root that is either a compound or a string, the two shapes chat
/// components take on the wire.
pub(crate) fn read_network_value(input: &mut &[u8], version: ProtocolVersion) -> Result<Value> {
    match input.first() {
        None => Err(ProtoError::UnexpectedEof),
        Some(&TAG_COMPOUND) => read_network_compound(input, version).map(Value::Compound),
        Some(&TAG_STRING) => read_string_root(input, version),
        Some(&other) => Err(ProtoError::InvalidTag(other)),
    }
}

fn read_string_root(input: &mut &[u8], version: ProtocolVersion) -> Result<Value> {
    let mut cursor = &input[1..];
    if !nameless(version) {
        let name_len = read_u16_be(&mut cursor)? as usize;
        take(&mut cursor, name_len)?;
    }
    let len = read_u16_be(&mut cursor)? as usize;
    take(&mut cursor, len)?;
    let (root, rest) = input.split_at(input.len() - cursor.len());

    // Re-frame as a compound holding the string so valence decodes the modified UTF-8.
    let mut framed = Vec::with_capacity(root.len() + 6);
    framed.extend_from_slice(&[TAG_COMPOUND, 0, 0, TAG_STRING]);
    if nameless(version) {
        framed.extend_from_slice(&[0, 0]);
    }
    framed.extend_from_slice(&root[1..]);
    framed.push(TAG_END);

    let (wrapper, _name): (Compound, String) =
        valence_nbt::from_binary(&mut framed.as_slice()).map_err(nbt_error)?;
    *input = rest;
    wrapper
        .iter()
        .next()
        .map(|(_, value)| value.clone())
        .ok_or(ProtoError::InvalidTag(TAG_STRING))
}

pub(crate) fn write_network_value(
    out: &mut Vec<u8>,
    value: &Value,
    version: ProtocolVersion,
) -> Result<()> {
    if let Value::Compound(compound) = value {
        return write_network_compound(out, compound, version);
    }

    let mut wrapper = Compound::new();
    wrapper.insert(String::new(), value.clone());
    let mut framed = Vec::new();
    valence_nbt::to_binary(&wrapper, &mut framed, "").map_err(nbt_error)?;

    // [10, 0, 0, id, 0, 0, payload.., 0]
    let body = framed
        .get(3..framed.len().saturating_sub(1))
        .filter(|body| body.len() >= 3)
        .ok_or(ProtoError::UnexpectedEof)?;
    out.push(body[0]);
    if !nameless(version) {
        out.extend_from_slice(&[0, 0]);
    }
    out.extend_from_slice(&body[3..]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Compound {
        let mut compound = Compound::new();
        compound.insert("type".to_string(), Value::String("minecraft:notice".into()));
        compound.insert("title".to_string(), Value::String("Rules \u{1F4DC}\0".into()));
        compound.insert("pause".to_string(), Value::Byte(0));
        compound.insert("scores".to_string(), Value::IntArray(vec![1, -2, 3]));
        compound.insert("empty".to_string(), Value::List(List::End));
        compound
    }

    fn single_int() -> Compound {
        let mut compound = Compound::new();
        compound.insert("a".to_string(), Value::Int(7));
        compound
    }

    #[test]
    fn nameless_root_from_1_20_2() {
        let mut out = Vec::new();
        write_network_compound(&mut out, &single_int(), ProtocolVersion::MINECRAFT_1_20_2)
            .unwrap();
        assert_eq!(out, [10, 3, 0, 1, b'a', 0, 0, 0, 7, 0]);

        out.clear();
        write_network_compound(&mut out, &single_int(), ProtocolVersion::MINECRAFT_1_19_3)
            .unwrap();
        assert_eq!(out, [10, 0, 0, 3, 0, 1, b'a', 0, 0, 0, 7, 0]);
    }

    #[test]
    fn compound_survives_both_root_formats() {
        for version in [ProtocolVersion::MINECRAFT_1_19, ProtocolVersion::MINECRAFT_1_21_6] {
            let mut out = Vec::new();
            write_network_compound(&mut out, &sample(), version).unwrap();
            out.extend_from_slice(&[0xaa, 0xbb]);
            let mut input = out.as_slice();
            assert_eq!(read_network_compound(&mut input, version).unwrap(), sample());
            assert_eq!(input, [0xaa, 0xbb]);
        }
    }

    #[test]
    fn string_root_keeps_following_bytes() {
        let value = Value::String("hi".to_string());
        let mut out = Vec::new();
        write_network_value(&mut out, &value, ProtocolVersion::MINECRAFT_1_20_3).unwrap();
        assert_eq!(out, [8, 0, 2, b'h', b'i']);

        out.push(0x3f);
        let mut input = out.as_slice();
        assert_eq!(
            read_network_value(&mut input, ProtocolVersion::MINECRAFT_1_20_3).unwrap(),
            value
        );
        assert_eq!(input, [0x3f]);
    }

    #[test]
    fn nul_is_two_bytes_in_modified_utf8() {
        let mut out = Vec::new();
        write_network_value(
            &mut out,
            &Value::String("\0".to_string()),
            ProtocolVersion::MINECRAFT_1_21,
        )
        .unwrap();
        assert_eq!(out, [8, 0, 2, 0xc0, 0x80]);
    }

    #[test]
    fn end_root_is_rejected() {
        let mut input: &[u8] = &[0];
        assert_eq!(
            read_network_value(&mut input, ProtocolVersion::MINECRAFT_1_21),
            Err(ProtoError::InvalidTag(0))
        );
    }

    #[test]
    fn truncated_compound_is_an_error() {
        let mut input: &[u8] = &[10, 11, 0, 1, b'x', 0x7f, 0, 0, 0];
        assert!(matches!(
            read_network_compound(&mut input, ProtocolVersion::MINECRAFT_1_21),
            Err(ProtoError::InvalidNbt(_))
        ));
    }
}
