use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    error::{ProtoError, Result},
    io::{
        read_bool, read_f32_be, read_i64_be, read_u8, write_bool, write_f32_be, write_i64_be,
        write_u8,
    },
    key::{Key, read_key, write_minimal_key},
    varint::{read_varint, write_holder_id, write_varint},
    version::ProtocolVersion,
};

/// Mixer category a sound plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundSource {
    Master,
    Music,
    Record,
    Weather,
    Block,
    Hostile,
    Neutral,
    Player,
    Ambient,
    Voice,
    /// 1.21.6+; older clients receive [`SoundSource::Master`] instead.
    Ui,
}

impl SoundSource {
    const ORDER: [SoundSource; 11] = [
        SoundSource::Master,
        SoundSource::Music,
        SoundSource::Record,
        SoundSource::Weather,
        SoundSource::Block,
        SoundSource::Hostile,
        SoundSource::Neutral,
        SoundSource::Player,
        SoundSource::Ambient,
        SoundSource::Voice,
        SoundSource::Ui,
    ];

    fn ordinal(&self) -> i32 {
        Self::ORDER.iter().position(|s| s == self).unwrap_or_default() as i32
    }

    pub(crate) fn read(input: &mut &[u8], version: ProtocolVersion) -> Result<Self> {
        let raw = read_varint(input)?;
        let source = usize::try_from(raw)
            .ok()
            .and_then(|idx| Self::ORDER.get(idx).copied())
            .ok_or(ProtoError::InvalidEnum {
                kind: "sound source",
                value: raw,
            })?;
        if source == SoundSource::Ui && version < ProtocolVersion::MINECRAFT_1_21_6 {
            return Err(ProtoError::InvalidEnum {
                kind: "sound source",
                value: raw,
            });
        }
        Ok(source)
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>, version: ProtocolVersion) {
        let source = match self {
            SoundSource::Ui if version < ProtocolVersion::MINECRAFT_1_21_6 => SoundSource::Master,
            other => *other,
        };
        write_varint(out, source.ordinal());
    }
}

/// Stop sound (S2C, play).
///
/// Wire form is a flag byte (bit 0: source, bit 1: name) followed by the present fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSound {
    pub source: Option<SoundSource>,
    pub name: Option<Key>,
}

const STOP_SOURCE: u8 = 0b01;
const STOP_NAME: u8 = 0b10;

impl PacketBody for StopSound {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let flags = read_u8(input)?;
        if flags & !(STOP_SOURCE | STOP_NAME) != 0 {
            return Err(ProtoError::InvalidEnum {
                kind: "stop sound flags",
                value: flags as i32,
            });
        }
        let source = if flags & STOP_SOURCE != 0 {
            Some(SoundSource::read(input, ctx.version)?)
        } else {
            None
        };
        let name = if flags & STOP_NAME != 0 {
            Some(read_key(input)?)
        } else {
            None
        };
        Ok(Self { source, name })
    }

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
        let flags = match (&self.source, &self.name) {
            (None, None) => 0,
            (Some(_), None) => STOP_SOURCE,
            (None, Some(_)) => STOP_NAME,
            (Some(_), Some(_)) => STOP_SOURCE | STOP_NAME,
        };
        write_u8(out, flags);
        if let Some(source) = &self.source {
            source.write(out, ctx.version);
        }
        if let Some(name) = &self.name {
            write_minimal_key(out, name)?;
        }
        Ok(())
    }
}

/// Sound reference carried by [`SoundEntity`].
#[derive(Debug, Clone, PartialEq)]
pub enum SoundEvent {
    /// Entry of the client's sound registry. Written as `id + 1`.
    Registered(i32),
    /// Sound named inline, written after a `0` id.
    Inline { name: Key, fixed_range: Option<f32> },
}

/// Entity-attached sound (S2C, play).
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEntity {
    pub event: SoundEvent,
    pub source: SoundSource,
    pub emitter_entity_id: i32,
    pub volume: f32,
    pub pitch: f32,
    /// Absent seeds are replaced by a random value on every encode.
    pub seed: Option<i64>,
}

impl PacketBody for SoundEntity {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let raw = read_varint(input)?;
        let event = match raw {
            0 => {
                let name = read_key(input)?;
                let fixed_range = if read_bool(input)? {
                    Some(read_f32_be(input)?)
                } else {
                    None
                };
                SoundEvent::Inline { name, fixed_range }
            }
            id if id > 0 => SoundEvent::Registered(id - 1),
            other => {
                return Err(ProtoError::InvalidEnum {
                    kind: "sound event",
                    value: other,
                });
            }
        };
        Ok(Self {
            event,
            source: SoundSource::read(input, ctx.version)?,
            emitter_entity_id: read_varint(input)?,
            volume: read_f32_be(input)?,
            pitch: read_f32_be(input)?,
            seed: Some(read_i64_be(input)?),
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
        match &self.event {
            SoundEvent::Registered(id) => write_holder_id(out, *id, "sound event")?,
            SoundEvent::Inline { name, fixed_range } => {
                write_varint(out, 0);
                write_minimal_key(out, name)?;
                write_bool(out, fixed_range.is_some());
                if let Some(range) = fixed_range {
                    write_f32_be(out, *range);
                }
            }
        }
        self.source.write(out, ctx.version);
        write_varint(out, self.emitter_entity_id);
        write_f32_be(out, self.volume);
        write_f32_be(out, self.pitch);
        write_i64_be(out, self.seed.unwrap_or_else(rand::random));
        Ok(())
    }
}
