//! Chat link wire formats.
//!
//! Chat links are `[&<base64>]` tokens pasted into game chat. The first decoded byte
//! names the link type; the rest of the payload depends on it. Build template links
//! carry a fixed 44-byte record:
//!
//! | offset | size | field |
//! |-------:|-----:|-------|
//! | 0  | 1  | header (`0x0D`) |
//! | 1  | 1  | profession code |
//! | 2  | 6  | 3 × (specialization id, trait selection byte) |
//! | 8  | 20 | 10 × `u16` LE palette ids, terrestrial/aquatic interleaved |
//! | 28 | 4  | profession extras (pet ids or legend codes) |
//! | 32 | 12 | 6 × `u16` LE inactive legend utility palettes |

use crate::errors::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Size of a decoded build template record in bytes.
pub const BUILD_RECORD_LEN: usize = 44;

/// Header byte of build template links.
pub const BUILD_TEMPLATE_HEADER: u8 = 0x0D;

/// Number of skill slots on one bar (heal, three utilities, elite).
pub const SKILL_SLOTS: usize = 5;

const PALETTE_OFFSET: usize = 8;
const EXTRAS_OFFSET: usize = 28;
const INACTIVE_LEGEND_OFFSET: usize = 32;

/// Strips the `[&` `]` markers from a chat code.
pub fn strip_markers(code: &str) -> Result<&str> {
    code.trim()
        .strip_prefix("[&")
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| Error::malformed(format!("`{code}` is not wrapped in [& ]")))
}

/// Decodes the base64 payload of a chat code.
pub fn decode_payload(code: &str) -> Result<Vec<u8>> {
    let payload = strip_markers(code)?;
    STANDARD
        .decode(payload)
        .map_err(|e| Error::malformed(format!("invalid base64: {e}")))
}

/// Encodes bytes as a `[&...]` chat code.
#[must_use]
pub fn wrap_payload(bytes: &[u8]) -> String {
    format!("[&{}]", STANDARD.encode(bytes))
}

/// Finds every `[&...]` token in a message.
///
/// A token ends at the first `]`; tokens containing whitespace or a nested `[` are skipped.
#[must_use]
pub fn find_chat_codes(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    let mut offset = 0;
    while let Some(start) = rest.find("[&") {
        let body_start = start + 2;
        let body = &rest[body_start..];
        let end = body.find(|c: char| c == ']' || c == '[' || c.is_whitespace());
        match end {
            Some(end) if body[end..].starts_with(']') => {
                let token_end = body_start + end + 1;
                found.push(&text[offset + start..offset + token_end]);
                offset += token_end;
                rest = &rest[token_end..];
            }
            _ => {
                offset += body_start;
                rest = body;
            }
        }
    }
    found
}

/// Which of the three major traits is chosen in each tier.
///
/// Two bits per tier, tier 1 in the lowest bits. `0` means no trait chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraitSelection([u8; 3]);

impl TraitSelection {
    /// Builds a selection from tier values; values are masked to two bits.
    #[must_use]
    pub const fn new(tiers: [u8; 3]) -> Self {
        Self([tiers[0] & 3, tiers[1] & 3, tiers[2] & 3])
    }

    /// Unpacks a trait selection byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self([byte & 3, (byte >> 2) & 3, (byte >> 4) & 3])
    }

    /// Packs the selection into its byte form.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0[0] | (self.0[1] << 2) | (self.0[2] << 4)
    }

    /// Tier values, tier 1 first.
    #[must_use]
    pub const fn tiers(self) -> [u8; 3] {
        self.0
    }

    /// Index into a specialization's major trait list for each chosen tier.
    ///
    /// Yields `(tier, index)` pairs for tiers with a non-zero value.
    pub fn major_trait_indexes(self) -> impl Iterator<Item = (usize, usize)> {
        self.0
            .into_iter()
            .enumerate()
            .filter(|&(_, value)| value > 0)
            .map(|(tier, value)| (tier, tier * 3 + usize::from(value) - 1))
    }
}

/// One specialization line in a build record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecializationSlot {
    /// Specialization id, `0` when the line is empty
    pub id: u8,
    /// Chosen major traits
    pub traits: TraitSelection,
}

/// The raw build template record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildRecord {
    /// Profession code
    pub profession: u8,
    /// The three specialization lines
    pub specializations: [SpecializationSlot; 3],
    /// Terrestrial palette ids: heal, utilities, elite
    pub terrestrial_palettes: [u16; SKILL_SLOTS],
    /// Aquatic palette ids: heal, utilities, elite
    pub aquatic_palettes: [u16; SKILL_SLOTS],
    /// Profession-specific bytes (pets or legend codes)
    pub extras: [u8; 4],
    /// Inactive legend utility palettes, terrestrial then aquatic
    pub inactive_legend_palettes: [u16; 6],
}

impl BuildRecord {
    /// Parses a decoded build record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BUILD_RECORD_LEN {
            return Err(Error::malformed(format!(
                "build record must be {BUILD_RECORD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != BUILD_TEMPLATE_HEADER {
            return Err(Error::malformed(format!(
                "unexpected header byte {:#04x}",
                bytes[0]
            )));
        }

        let read_u16 = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

        let mut record = Self {
            profession: bytes[1],
            ..Self::default()
        };
        for (i, slot) in record.specializations.iter_mut().enumerate() {
            *slot = SpecializationSlot {
                id: bytes[2 + i * 2],
                traits: TraitSelection::from_byte(bytes[3 + i * 2]),
            };
        }
        for i in 0..SKILL_SLOTS {
            record.terrestrial_palettes[i] = read_u16(PALETTE_OFFSET + i * 4);
            record.aquatic_palettes[i] = read_u16(PALETTE_OFFSET + i * 4 + 2);
        }
        record
            .extras
            .copy_from_slice(&bytes[EXTRAS_OFFSET..EXTRAS_OFFSET + 4]);
        for (i, palette) in record.inactive_legend_palettes.iter_mut().enumerate() {
            *palette = read_u16(INACTIVE_LEGEND_OFFSET + i * 2);
        }
        Ok(record)
    }

    /// Serializes the record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; BUILD_RECORD_LEN] {
        let mut bytes = [0u8; BUILD_RECORD_LEN];
        bytes[0] = BUILD_TEMPLATE_HEADER;
        bytes[1] = self.profession;
        for (i, slot) in self.specializations.iter().enumerate() {
            bytes[2 + i * 2] = slot.id;
            bytes[3 + i * 2] = slot.traits.to_byte();
        }
        for i in 0..SKILL_SLOTS {
            let at = PALETTE_OFFSET + i * 4;
            bytes[at..at + 2].copy_from_slice(&self.terrestrial_palettes[i].to_le_bytes());
            bytes[at + 2..at + 4].copy_from_slice(&self.aquatic_palettes[i].to_le_bytes());
        }
        bytes[EXTRAS_OFFSET..EXTRAS_OFFSET + 4].copy_from_slice(&self.extras);
        for (i, palette) in self.inactive_legend_palettes.iter().enumerate() {
            let at = INACTIVE_LEGEND_OFFSET + i * 2;
            bytes[at..at + 2].copy_from_slice(&palette.to_le_bytes());
        }
        bytes
    }

    /// Parses a `[&...]` build template chat code.
    pub fn from_chat_code(code: &str) -> Result<Self> {
        Self::from_bytes(&decode_payload(code)?)
    }

    /// Renders the record as a `[&...]` chat code.
    #[must_use]
    pub fn to_chat_code(&self) -> String {
        wrap_payload(&self.to_bytes())
    }
}

/// Link type, as stored in the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatLinkKind {
    /// Coin amount
    Coin,
    /// Item, with optional skin and upgrades
    Item,
    /// NPC text string
    NpcText,
    /// Point of interest / waypoint
    MapLink,
    /// PvP game
    PvpGame,
    /// Skill
    Skill,
    /// Trait
    Trait,
    /// Player
    User,
    /// Crafting recipe
    Recipe,
    /// Wardrobe skin
    Wardrobe,
    /// Outfit
    Outfit,
    /// WvW objective
    WvwObjective,
    /// Build template
    BuildTemplate,
}

impl ChatLinkKind {
    /// Maps a header byte to its link type.
    #[must_use]
    pub const fn from_header(header: u8) -> Option<Self> {
        Some(match header {
            0x01 => Self::Coin,
            0x02 => Self::Item,
            0x03 => Self::NpcText,
            0x04 => Self::MapLink,
            0x05 => Self::PvpGame,
            0x06 => Self::Skill,
            0x07 => Self::Trait,
            0x08 => Self::User,
            0x09 => Self::Recipe,
            0x0A => Self::Wardrobe,
            0x0B => Self::Outfit,
            0x0C => Self::WvwObjective,
            0x0D => Self::BuildTemplate,
            _ => return None,
        })
    }

    /// Human readable name of the link type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Coin => "Coin",
            Self::Item => "Item",
            Self::NpcText => "NPC text string",
            Self::MapLink => "Map link",
            Self::PvpGame => "PvP Game",
            Self::Skill => "Skill",
            Self::Trait => "Trait",
            Self::User => "User",
            Self::Recipe => "Recipe",
            Self::Wardrobe => "Wardrobe",
            Self::Outfit => "Outfit",
            Self::WvwObjective => "WvW objective",
            Self::BuildTemplate => "Build template",
        }
    }
}

/// Decoded item link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLink {
    /// Stack size
    pub quantity: u8,
    /// Item id
    pub item_id: u32,
    /// Applied wardrobe skin
    pub skin_id: Option<u32>,
    /// Upgrade components, at most two
    pub upgrades: Vec<u32>,
}

/// A decoded chat link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLink {
    /// Coin amount in copper
    Coin(u32),
    /// Item link
    Item(ItemLink),
    /// Point of interest id
    MapLink(u32),
    /// Skill id
    Skill(u32),
    /// Trait id
    Trait(u32),
    /// Recipe id
    Recipe(u32),
    /// Skin id
    Wardrobe(u32),
    /// Outfit id
    Outfit(u32),
    /// Build template
    Build(BuildRecord),
    /// Link types whose payload is not decoded
    Other(ChatLinkKind),
}

impl ChatLink {
    /// Parses any `[&...]` chat link.
    pub fn parse(code: &str) -> Result<Self> {
        let data = decode_payload(code)?;
        let header = *data
            .first()
            .ok_or_else(|| Error::malformed("empty chat link"))?;
        let kind = ChatLinkKind::from_header(header)
            .ok_or_else(|| Error::malformed(format!("unknown link type {header:#04x}")))?;

        Ok(match kind {
            ChatLinkKind::Coin => Self::Coin(read_u32(&data, 1)?),
            ChatLinkKind::Item => Self::Item(parse_item(&data)?),
            ChatLinkKind::MapLink => Self::MapLink(read_u32(&data, 1)?),
            ChatLinkKind::Skill => Self::Skill(read_u32(&data, 1)?),
            ChatLinkKind::Trait => Self::Trait(read_u32(&data, 1)?),
            ChatLinkKind::Recipe => Self::Recipe(read_u32(&data, 1)?),
            ChatLinkKind::Wardrobe => Self::Wardrobe(read_u32(&data, 1)?),
            ChatLinkKind::Outfit => Self::Outfit(read_u32(&data, 1)?),
            ChatLinkKind::BuildTemplate => Self::Build(BuildRecord::from_bytes(&data)?),
            other => Self::Other(other),
        })
    }

    /// Link type of this link.
    #[must_use]
    pub const fn kind(&self) -> ChatLinkKind {
        match self {
            Self::Coin(_) => ChatLinkKind::Coin,
            Self::Item(_) => ChatLinkKind::Item,
            Self::MapLink(_) => ChatLinkKind::MapLink,
            Self::Skill(_) => ChatLinkKind::Skill,
            Self::Trait(_) => ChatLinkKind::Trait,
            Self::Recipe(_) => ChatLinkKind::Recipe,
            Self::Wardrobe(_) => ChatLinkKind::Wardrobe,
            Self::Outfit(_) => ChatLinkKind::Outfit,
            Self::Build(_) => ChatLinkKind::BuildTemplate,
            Self::Other(kind) => *kind,
        }
    }
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::malformed(format!("link truncated at byte {at}")))
}

// Ids inside item links are 24 bits wide.
fn read_u24(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 3)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], 0]))
        .ok_or_else(|| Error::malformed(format!("item link truncated at byte {at}")))
}

fn parse_item(data: &[u8]) -> Result<ItemLink> {
    let quantity = *data
        .get(1)
        .ok_or_else(|| Error::malformed("item link truncated"))?;
    let item_id = read_u24(data, 2)?;
    let mut link = ItemLink {
        quantity,
        item_id,
        skin_id: None,
        upgrades: Vec::new(),
    };

    let Some(&flags) = data.get(5) else {
        return Ok(link);
    };
    let has_skin = flags & 0x80 != 0;
    let mut first_upgrade = flags & 0x40 != 0;
    let mut second_upgrade = flags & 0x20 != 0;
    if second_upgrade && !first_upgrade {
        first_upgrade = true;
        second_upgrade = false;
    }

    let mut at = 6;
    if has_skin {
        link.skin_id = Some(read_u24(data, at)?);
        at += 4;
    }
    for present in [first_upgrade, second_upgrade] {
        if !present {
            break;
        }
        link.upgrades.push(read_u24(data, at)?);
        at += 4;
    }
    Ok(link)
}
