//! Predefined character sets
//!
//! A `CharacterSet` is a flag combination of Unicode blocks.
//! Config files name the blocks: `character_set = ["general", "hiragana"]`.

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Printable ASCII plus a few common Western symbols
const BASIC_SET: &str = "?abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890.:,;'\"(!?)+-*/=_{}[]@~#\\<>|^%$£&€°µ`";
const FRENCH_QUOTES: &str = "«»‹›";
const SPANISH_QUEST_EX: &str = "¡¿";
const TURKISH_I: &str = "ıİŞşĞğ";
const JAPANESE_DIGITS: &str = "一二三四五六七八九十百千万円年月日";
const ASIAN_QUOTES: &str = "「」『』、。・ー〜";
const ESSENTIAL_KANJI: &str = "人大小中上下左右出入口山川田子女男本学生先気分今時間前後何名東西南北";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacterSet: u32 {
        const BASIC = 1 << 0;
        const FRENCH_QUOTES = 1 << 1;
        const SPANISH_QUEST_EX = 1 << 2;
        const CYRILLIC = 1 << 3;
        const EXTENDED_LATIN = 1 << 4;
        const GREEK = 1 << 5;
        const TURKISH_I = 1 << 6;
        const HEBREW = 1 << 7;
        const ARABIC = 1 << 8;
        const THAI_KHMER = 1 << 9;
        const HIRAGANA = 1 << 10;
        const JAPANESE_DIGITS = 1 << 11;
        const ASIAN_QUOTES = 1 << 12;
        const ESSENTIAL_KANJI = 1 << 13;
        const KATAKANA = 1 << 14;

        const GENERAL = Self::BASIC.bits()
            | Self::FRENCH_QUOTES.bits()
            | Self::SPANISH_QUEST_EX.bits()
            | Self::CYRILLIC.bits()
            | Self::EXTENDED_LATIN.bits()
            | Self::GREEK.bits()
            | Self::TURKISH_I.bits()
            | Self::HEBREW.bits()
            | Self::ARABIC.bits();
        const JAPANESE = Self::GENERAL.bits()
            | Self::HIRAGANA.bits()
            | Self::JAPANESE_DIGITS.bits()
            | Self::ASIAN_QUOTES.bits()
            | Self::ESSENTIAL_KANJI.bits()
            | Self::KATAKANA.bits();
        const THAI = Self::GENERAL.bits() | Self::THAI_KHMER.bits();
        const ALL = Self::JAPANESE.bits() | Self::THAI.bits();
    }
}

/// Config names, single blocks first so `names()` prefers them
const NAMED: &[(&str, CharacterSet)] = &[
    ("basic", CharacterSet::BASIC),
    ("french_quotes", CharacterSet::FRENCH_QUOTES),
    ("spanish_quest_ex", CharacterSet::SPANISH_QUEST_EX),
    ("cyrillic", CharacterSet::CYRILLIC),
    ("extended_latin", CharacterSet::EXTENDED_LATIN),
    ("greek", CharacterSet::GREEK),
    ("turkish_i", CharacterSet::TURKISH_I),
    ("hebrew", CharacterSet::HEBREW),
    ("arabic", CharacterSet::ARABIC),
    ("thai_khmer", CharacterSet::THAI_KHMER),
    ("hiragana", CharacterSet::HIRAGANA),
    ("japanese_digits", CharacterSet::JAPANESE_DIGITS),
    ("asian_quotes", CharacterSet::ASIAN_QUOTES),
    ("essential_kanji", CharacterSet::ESSENTIAL_KANJI),
    ("katakana", CharacterSet::KATAKANA),
    ("general", CharacterSet::GENERAL),
    ("japanese", CharacterSet::JAPANESE),
    ("thai", CharacterSet::THAI),
    ("all", CharacterSet::ALL),
];

impl Default for CharacterSet {
    fn default() -> Self {
        Self::GENERAL
    }
}

impl CharacterSet {
    /// Look up a block by config name (case-insensitive)
    pub fn from_block_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, set)| *set)
    }

    /// Names of the single blocks contained in this set
    pub fn names(self) -> Vec<&'static str> {
        NAMED
            .iter()
            .filter(|(_, set)| set.bits().count_ones() == 1 && self.contains(*set))
            .map(|(n, _)| *n)
            .collect()
    }

    /// Characters of all selected blocks plus `extra`, space last,
    /// without duplicates and in a stable order
    pub fn chars(self, extra: &str) -> Vec<char> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |c: char| {
            if seen.insert(c) {
                out.push(c);
            }
        };

        let ranges = |from: u32, to: u32| (from..=to).filter_map(char::from_u32);

        if self.contains(Self::BASIC) {
            BASIC_SET.chars().for_each(&mut push);
        }
        if self.contains(Self::FRENCH_QUOTES) {
            FRENCH_QUOTES.chars().for_each(&mut push);
        }
        if self.contains(Self::SPANISH_QUEST_EX) {
            SPANISH_QUEST_EX.chars().for_each(&mut push);
        }
        if self.contains(Self::CYRILLIC) {
            ranges(0x0401, 0x045F).for_each(&mut push);
        }
        if self.contains(Self::EXTENDED_LATIN) {
            ranges(0x00C0, 0x00FF).for_each(&mut push);
            ranges(0x0100, 0x017F).for_each(&mut push);
        }
        if self.contains(Self::GREEK) {
            ranges(0x0391, 0x03A9)
                .chain(ranges(0x03B1, 0x03C9))
                .for_each(&mut push);
        }
        if self.contains(Self::TURKISH_I) {
            TURKISH_I.chars().for_each(&mut push);
        }
        if self.contains(Self::HEBREW) {
            ranges(0x05D0, 0x05EA).for_each(&mut push);
        }
        if self.contains(Self::ARABIC) {
            ranges(0x0621, 0x064A).for_each(&mut push);
        }
        if self.contains(Self::THAI_KHMER) {
            ranges(0x0E01, 0x0E5B).for_each(&mut push);
        }
        if self.contains(Self::HIRAGANA) {
            ranges(0x3041, 0x3096).for_each(&mut push);
        }
        if self.contains(Self::JAPANESE_DIGITS) {
            JAPANESE_DIGITS.chars().for_each(&mut push);
        }
        if self.contains(Self::ASIAN_QUOTES) {
            ASIAN_QUOTES.chars().for_each(&mut push);
        }
        if self.contains(Self::ESSENTIAL_KANJI) {
            ESSENTIAL_KANJI.chars().for_each(&mut push);
        }
        if self.contains(Self::KATAKANA) {
            ranges(0x30A1, 0x30FA).for_each(&mut push);
        }
        extra
            .chars()
            .filter(|c| !c.is_control())
            .for_each(&mut push);
        push(' ');

        out
    }
}

impl Serialize for CharacterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

/// Accepts a single name or an array of names
impl<'de> Deserialize<'de> for CharacterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{self, SeqAccess, Visitor};

        struct CharacterSetVisitor;

        impl<'de> Visitor<'de> for CharacterSetVisitor {
            type Value = CharacterSet;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a character set name or array of names")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                CharacterSet::from_block_name(value)
                    .ok_or_else(|| E::custom(format!("unknown character set \"{}\"", value)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut set = CharacterSet::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    set |= CharacterSetVisitor.visit_str::<A::Error>(&name)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_any(CharacterSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_contains_ascii_and_space() {
        let chars = CharacterSet::BASIC.chars("");
        assert!(chars.contains(&'A'));
        assert!(chars.contains(&'_'));
        assert_eq!(chars.last(), Some(&' '));
        // '?' appears twice in the basic string
        assert_eq!(chars.iter().filter(|&&c| c == '?').count(), 1);
    }

    #[test]
    fn test_general_includes_blocks() {
        let chars = CharacterSet::GENERAL.chars("");
        assert!(chars.contains(&'Ж'));
        assert!(chars.contains(&'é'));
        assert!(chars.contains(&'Ω'));
        assert!(!chars.contains(&'あ'));
    }

    #[test]
    fn test_extra_chars() {
        let chars = CharacterSet::empty().chars("AB");
        assert_eq!(chars, vec!['A', 'B', ' ']);
    }

    #[test]
    fn test_names_round_trip() {
        let set = CharacterSet::BASIC | CharacterSet::HIRAGANA;
        let names = set.names();
        assert_eq!(names, vec!["basic", "hiragana"]);
        let rebuilt = names
            .iter()
            .filter_map(|n| CharacterSet::from_block_name(n))
            .fold(CharacterSet::empty(), |a, b| a | b);
        assert_eq!(rebuilt, set);
    }

    #[test]
    fn test_deserialize_string_or_array() {
        #[derive(Deserialize)]
        struct Wrapper {
            set: CharacterSet,
        }
        let w: Wrapper = toml::from_str("set = \"thai\"").unwrap();
        assert_eq!(w.set, CharacterSet::THAI);
        let w: Wrapper = toml::from_str("set = [\"basic\", \"Greek\"]").unwrap();
        assert_eq!(w.set, CharacterSet::BASIC | CharacterSet::GREEK);
        assert!(toml::from_str::<Wrapper>("set = \"klingon\"").is_err());
    }
}
