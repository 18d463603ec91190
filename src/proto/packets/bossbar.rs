use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    component::Component,
    error::{ProtoError, Result},
    io::{read_f32_be, read_u8, read_uuid, write_f32_be, write_u8, write_uuid},
    types::Uuid,
    varint::{read_varint, write_varint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossBarColor {
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossBarOverlay {
    Progress,
    Notched6,
    Notched10,
    Notched12,
    Notched20,
}

impl BossBarColor {
    const ORDER: [Self; 7] = [
        Self::Pink,
        Self::Blue,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::White,
    ];
}

impl BossBarOverlay {
    const ORDER: [Self; 5] = [
        Self::Progress,
        Self::Notched6,
        Self::Notched10,
        Self::Notched12,
        Self::Notched20,
    ];
}

fn read_ordinal<T: Copy>(input: &mut &[u8], order: &[T], kind: &'static str) -> Result<T> {
    let raw = read_varint(input)?;
    usize::try_from(raw)
        .ok()
        .and_then(|idx| order.get(idx).copied())
        .ok_or(ProtoError::InvalidEnum { kind, value: raw })
}

fn write_ordinal<T: PartialEq>(out: &mut Vec<u8>, order: &[T], value: &T) {
    let idx = order.iter().position(|v| v == value).unwrap_or_default();
    write_varint(out, idx as i32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum BossBarAction {
    Add {
        title: Component,
        health: f32,
        color: BossBarColor,
        overlay: BossBarOverlay,
        flags: u8,
    },
    Remove,
    UpdateHealth(f32),
    UpdateTitle(Component),
    UpdateStyle {
        color: BossBarColor,
        overlay: BossBarOverlay,
    },
    UpdateFlags(u8),
}

/// Boss bar (S2C, play).
#[derive(Debug, Clone, PartialEq)]
pub struct BossBarPacket {
    pub id: Uuid,
    pub action: BossBarAction,
}

impl BossBarPacket {
    pub const DARKEN_SCREEN: u8 = 0x01;
    pub const PLAY_BOSS_MUSIC: u8 = 0x02;
    pub const CREATE_WORLD_FOG: u8 = 0x04;

    pub fn is_creation(&self) -> bool {
        matches!(self.action, BossBarAction::Add { .. })
    }
}

impl PacketBody for BossBarPacket {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let id = read_uuid(input)?;
        let action = match read_varint(input)? {
            0 => BossBarAction::Add {
                title: Component::read(input, ctx.version)?,
                health: read_f32_be(input)?,
                color: read_ordinal(input, &BossBarColor::ORDER, "boss bar color")?,
                overlay: read_ordinal(input, &BossBarOverlay::ORDER, "boss bar overlay")?,
                flags: read_u8(input)?,
            },
            1 => BossBarAction::Remove,
            2 => BossBarAction::UpdateHealth(read_f32_be(input)?),
            3 => BossBarAction::UpdateTitle(Component::read(input, ctx.version)?),
            4 => BossBarAction::UpdateStyle {
                color: read_ordinal(input, &BossBarColor::ORDER, "boss bar color")?,
                overlay: read_ordinal(input, &BossBarOverlay::ORDER, "boss bar overlay")?,
            },
            5 => BossBarAction::UpdateFlags(read_u8(input)?),
            other => {
                return Err(ProtoError::InvalidEnum {
                    kind: "boss bar action",
                    value: other,
                });
            }
        };
        Ok(Self { id, action })
    }

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
        write_uuid(out, &self.id);
        match &self.action {
            BossBarAction::Add {
                title,
                health,
                color,
                overlay,
                flags,
            } => {
                write_varint(out, 0);
                title.write(out, ctx.version)?;
                write_f32_be(out, *health);
                write_ordinal(out, &BossBarColor::ORDER, color);
                write_ordinal(out, &BossBarOverlay::ORDER, overlay);
                write_u8(out, *flags);
            }
            BossBarAction::Remove => write_varint(out, 1),
            BossBarAction::UpdateHealth(health) => {
                write_varint(out, 2);
                write_f32_be(out, *health);
            }
            BossBarAction::UpdateTitle(title) => {
                write_varint(out, 3);
                title.write(out, ctx.version)?;
            }
            BossBarAction::UpdateStyle { color, overlay } => {
                write_varint(out, 4);
                write_ordinal(out, &BossBarColor::ORDER, color);
                write_ordinal(out, &BossBarOverlay::ORDER, overlay);
            }
            BossBarAction::UpdateFlags(flags) => {
                write_varint(out, 5);
                write_u8(out, *flags);
            }
        }
        Ok(())
    }
}
