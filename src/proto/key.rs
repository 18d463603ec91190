use std::{fmt, str::FromStr};

use super::{
    error::{ProtoError, Result},
    io::{read_string_bounded, write_string_bounded},
};

pub const DEFAULT_NAMESPACE: &str = "minecraft";

const MAX_KEY_LEN: usize = 32_767;

/// Namespaced identifier such as `minecraft:entity.pig.ambient`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    namespace: String,
    path: String,
}

impl Key {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let path = path.into();
        if namespace.is_empty()
            || !namespace.bytes().all(valid_namespace_byte)
            || !path.bytes().all(valid_path_byte)
        {
            return Err(ProtoError::InvalidKey(format!("{namespace}:{path}")));
        }
        Ok(Self { namespace, path })
    }

    pub fn minecraft(path: impl Into<String>) -> Result<Self> {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    /// Parses `namespace:path`, defaulting the namespace when it is omitted.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(':') {
            Some(("", path)) => Self::new(DEFAULT_NAMESPACE, path),
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, raw),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Textual form with the default namespace left out.
    pub fn minimal(&self) -> String {
        if self.namespace == DEFAULT_NAMESPACE {
            self.path.clone()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Key {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn valid_namespace_byte(b: u8) -> bool {
    matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.')
}

fn valid_path_byte(b: u8) -> bool {
    valid_namespace_byte(b) || b == b'/'
}

pub(crate) fn read_key(input: &mut &[u8]) -> Result<Key> {
    Key::parse(read_string_bounded(input, MAX_KEY_LEN)?)
}

pub(crate) fn write_key(out: &mut Vec<u8>, key: &Key) -> Result<()> {
    write_string_bounded(out, &key.to_string(), MAX_KEY_LEN)
}

pub(crate) fn write_minimal_key(out: &mut Vec<u8>, key: &Key) -> Result<()> {
    write_string_bounded(out, &key.minimal(), MAX_KEY_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_namespace() {
        let key = Key::parse("entity.pig.ambient").unwrap();
        assert_eq!(key.namespace(), "minecraft");
        assert_eq!(key.path(), "entity.pig.ambient");

        let key = Key::parse(":block.stone.break").unwrap();
        assert_eq!(key.namespace(), "minecraft");
    }

    #[test]
    fn parse_rejects_bad_characters() {
        assert!(Key::parse("Lure:Main").is_err());
        assert!(Key::parse("lure:has space").is_err());
        assert!(Key::parse("a:b:c").is_err());
    }

    #[test]
    fn minimal_form_drops_default_namespace() {
        assert_eq!(Key::parse("minecraft:ui.toast").unwrap().minimal(), "ui.toast");
        assert_eq!(
            Key::parse("lure:player_info").unwrap().minimal(),
            "lure:player_info"
        );
    }

    #[test]
    fn minimal_write_reads_back_to_same_key() {
        let key = Key::minecraft("music.game").unwrap();
        let mut out = Vec::new();
        write_minimal_key(&mut out, &key).unwrap();
        let mut input = out.as_slice();
        assert_eq!(read_key(&mut input).unwrap(), key);
        assert!(input.is_empty());
    }
}
