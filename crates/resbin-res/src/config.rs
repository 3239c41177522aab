//! Resource configuration qualifiers (`ResTable_config`).
//!
//! The configuration is a flat record of 32-bit words; most qualifiers are
//! packed bit fields inside those words. Every sub-field is read and written
//! through [`ConfigField`], which knows its word, mask and shift, so a write
//! only touches its own bit range.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use resbin_common::bits::{get_bits, set_bits};
use resbin_common::ReadExt;

use crate::{Error, Result};

/// Defines a qualifier enum with explicit wire values and a `from_u32` parser.
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $value:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            /// Parse from the field value.
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $(v if v == $value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

config_enum! {
    /// Screen orientation.
    pub enum Orientation { Any = 0, Port = 1, Land = 2, Square = 3 }
}

config_enum! {
    /// Touchscreen kind.
    pub enum Touchscreen { Any = 0, NoTouch = 1, Stylus = 2, Finger = 3 }
}

config_enum! {
    /// Keyboard kind.
    pub enum Keyboard { Any = 0, NoKeys = 1, Qwerty = 2, TwelveKey = 3 }
}

config_enum! {
    /// Navigation method.
    pub enum Navigation { Any = 0, NoNav = 1, Dpad = 2, Trackball = 3, Wheel = 4 }
}

config_enum! {
    /// Keyboard availability.
    pub enum KeysHidden { Any = 0, No = 1, Yes = 2, Soft = 3 }
}

config_enum! {
    /// Navigation availability.
    pub enum NavHidden { Any = 0, No = 1, Yes = 2 }
}

config_enum! {
    /// Screen size class.
    pub enum ScreenSize { Any = 0, Small = 1, Normal = 2, Large = 3, XLarge = 4 }
}

config_enum! {
    /// Long screen qualifier.
    pub enum ScreenLong { Any = 0, No = 1, Yes = 2 }
}

config_enum! {
    /// UI mode type.
    pub enum UiModeType { Any = 0, Normal = 1, Desk = 2, Car = 3, Television = 4 }
}

config_enum! {
    /// UI night mode.
    pub enum UiModeNight { Any = 0, No = 1, Yes = 2 }
}

/// Common screen density values (dots per inch).
pub mod density {
    pub const DEFAULT: u16 = 0;
    pub const LOW: u16 = 120;
    pub const MEDIUM: u16 = 160;
    pub const TV: u16 = 213;
    pub const HIGH: u16 = 240;
    pub const XHIGH: u16 = 320;
    pub const XXHIGH: u16 = 480;
    pub const XXXHIGH: u16 = 640;
    pub const ANY: u16 = 0xFFFE;
    pub const NONE: u16 = 0xFFFF;
}

/// The 32-bit words of the configuration record after `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Word {
    Imsi = 0,
    Locale = 1,
    ScreenType = 2,
    Input = 3,
    ScreenSize = 4,
    Version = 5,
    ScreenConfig = 6,
    ScreenSizeDp = 7,
}

const WORD_COUNT: usize = 8;

/// A packed qualifier sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Mcc,
    Mnc,
    Orientation,
    Touchscreen,
    Density,
    Keyboard,
    Navigation,
    KeysHidden,
    NavHidden,
    ScreenWidth,
    ScreenHeight,
    SdkVersion,
    MinorVersion,
    ScreenLayoutSize,
    ScreenLayoutLong,
    UiModeType,
    UiModeNight,
    SmallestScreenWidthDp,
    ScreenWidthDp,
    ScreenHeightDp,
}

impl ConfigField {
    /// Every packed field, in record order.
    pub const ALL: [ConfigField; 20] = [
        Self::Mcc,
        Self::Mnc,
        Self::Orientation,
        Self::Touchscreen,
        Self::Density,
        Self::Keyboard,
        Self::Navigation,
        Self::KeysHidden,
        Self::NavHidden,
        Self::ScreenWidth,
        Self::ScreenHeight,
        Self::SdkVersion,
        Self::MinorVersion,
        Self::ScreenLayoutSize,
        Self::ScreenLayoutLong,
        Self::UiModeType,
        Self::UiModeNight,
        Self::SmallestScreenWidthDp,
        Self::ScreenWidthDp,
        Self::ScreenHeightDp,
    ];

    /// Word, mask (unshifted) and shift of the field.
    const fn layout(self) -> (Word, u32, u32) {
        match self {
            Self::Mcc => (Word::Imsi, 0xFFFF, 16),
            Self::Mnc => (Word::Imsi, 0xFFFF, 0),
            Self::Orientation => (Word::ScreenType, 0xFF, 24),
            Self::Touchscreen => (Word::ScreenType, 0xFF, 16),
            Self::Density => (Word::ScreenType, 0xFFFF, 0),
            Self::Keyboard => (Word::Input, 0xFF, 24),
            Self::Navigation => (Word::Input, 0xFF, 16),
            Self::KeysHidden => (Word::Input, 0x3, 8),
            Self::NavHidden => (Word::Input, 0x3, 10),
            Self::ScreenWidth => (Word::ScreenSize, 0xFFFF, 16),
            Self::ScreenHeight => (Word::ScreenSize, 0xFFFF, 0),
            Self::SdkVersion => (Word::Version, 0xFFFF, 16),
            Self::MinorVersion => (Word::Version, 0xFFFF, 0),
            Self::ScreenLayoutSize => (Word::ScreenConfig, 0xF, 24),
            Self::ScreenLayoutLong => (Word::ScreenConfig, 0x3, 28),
            Self::UiModeType => (Word::ScreenConfig, 0xF, 16),
            Self::UiModeNight => (Word::ScreenConfig, 0x3, 20),
            Self::SmallestScreenWidthDp => (Word::ScreenConfig, 0xFFFF, 0),
            Self::ScreenWidthDp => (Word::ScreenSizeDp, 0xFFFF, 16),
            Self::ScreenHeightDp => (Word::ScreenSizeDp, 0xFFFF, 0),
        }
    }

    /// Largest value the field can hold.
    pub const fn max_value(self) -> u32 {
        self.layout().1
    }
}

/// Configuration qualifiers of a resource table type chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResourceConfig {
    words: [u32; WORD_COUNT],
}

impl ResourceConfig {
    /// Size of the record written by [`ResourceConfig::write`].
    pub const SIZE: u32 = 4 * (WORD_COUNT as u32 + 1);

    /// Create an empty ("any") configuration.
    pub const fn new() -> Self {
        Self {
            words: [0; WORD_COUNT],
        }
    }

    /// Read a configuration record, starting at its `size` word.
    ///
    /// Records shorter than [`Self::SIZE`] leave the missing words zero;
    /// fields of longer records beyond these words are skipped.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u32::<LittleEndian>()?;
        if size < 4 {
            return Err(Error::InvalidArgument(format!("config size {size} is smaller than 4")));
        }

        let present = ((size - 4) / 4) as usize;
        let mut words = [0u32; WORD_COUNT];
        for word in words.iter_mut().take(present) {
            *word = reader.read_u32::<LittleEndian>()?;
        }

        let consumed = 4 + 4 * present.min(WORD_COUNT) as u32;
        if size > consumed {
            reader.skip_bytes(u64::from(size - consumed))?;
        }

        Ok(Self { words })
    }

    /// Write the record, `size` word first.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(Self::SIZE)?;
        for word in self.words {
            writer.write_u32::<LittleEndian>(word)?;
        }
        Ok(())
    }

    /// Serialize the record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE as usize);
        for word in std::iter::once(Self::SIZE).chain(self.words) {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Read a packed field.
    pub fn get(&self, field: ConfigField) -> u32 {
        let (word, mask, shift) = field.layout();
        get_bits(self.words[word as usize], mask, shift)
    }

    /// Write a packed field; bits of `value` beyond the field width are dropped.
    pub fn set(&mut self, field: ConfigField, value: u32) {
        let (word, mask, shift) = field.layout();
        let slot = &mut self.words[word as usize];
        *slot = set_bits(*slot, value, mask, shift);
    }

    pub fn imsi(&self) -> u32 {
        self.words[Word::Imsi as usize]
    }

    pub fn locale(&self) -> u32 {
        self.words[Word::Locale as usize]
    }

    pub fn screen_type(&self) -> u32 {
        self.words[Word::ScreenType as usize]
    }

    pub fn input(&self) -> u32 {
        self.words[Word::Input as usize]
    }

    pub fn screen_size(&self) -> u32 {
        self.words[Word::ScreenSize as usize]
    }

    pub fn version(&self) -> u32 {
        self.words[Word::Version as usize]
    }

    pub fn screen_config(&self) -> u32 {
        self.words[Word::ScreenConfig as usize]
    }

    pub fn screen_size_dp(&self) -> u32 {
        self.words[Word::ScreenSizeDp as usize]
    }

    /// Mobile country code; 0 means any.
    pub fn mcc(&self) -> u16 {
        self.get(ConfigField::Mcc) as u16
    }

    pub fn set_mcc(&mut self, mcc: u16) {
        self.set(ConfigField::Mcc, u32::from(mcc));
    }

    /// Mobile network code; 0 means any.
    pub fn mnc(&self) -> u16 {
        self.get(ConfigField::Mnc) as u16
    }

    pub fn set_mnc(&mut self, mnc: u16) {
        self.set(ConfigField::Mnc, u32::from(mnc));
    }

    /// Two-letter language code, empty when unset.
    pub fn language(&self) -> String {
        let bytes = self.locale().to_le_bytes();
        locale_code([bytes[0], bytes[1]])
    }

    /// Set the two-letter language code.
    pub fn set_language(&mut self, code: &str) -> Result<()> {
        let [a, b] = parse_locale_code(code)?;
        let mut bytes = self.locale().to_le_bytes();
        bytes[0] = a;
        bytes[1] = b;
        self.words[Word::Locale as usize] = u32::from_le_bytes(bytes);
        Ok(())
    }

    /// Two-letter country code, empty when unset.
    pub fn country(&self) -> String {
        let bytes = self.locale().to_le_bytes();
        locale_code([bytes[2], bytes[3]])
    }

    /// Set the two-letter country code.
    pub fn set_country(&mut self, code: &str) -> Result<()> {
        let [a, b] = parse_locale_code(code)?;
        let mut bytes = self.locale().to_le_bytes();
        bytes[2] = a;
        bytes[3] = b;
        self.words[Word::Locale as usize] = u32::from_le_bytes(bytes);
        Ok(())
    }

    pub fn orientation(&self) -> Option<Orientation> {
        Orientation::from_u32(self.get(ConfigField::Orientation))
    }

    pub fn set_orientation(&mut self, value: Orientation) {
        self.set(ConfigField::Orientation, value as u32);
    }

    pub fn touchscreen(&self) -> Option<Touchscreen> {
        Touchscreen::from_u32(self.get(ConfigField::Touchscreen))
    }

    pub fn set_touchscreen(&mut self, value: Touchscreen) {
        self.set(ConfigField::Touchscreen, value as u32);
    }

    /// Screen density; see [`density`] for common values.
    pub fn density(&self) -> u16 {
        self.get(ConfigField::Density) as u16
    }

    pub fn set_density(&mut self, value: u16) {
        self.set(ConfigField::Density, u32::from(value));
    }

    pub fn keyboard(&self) -> Option<Keyboard> {
        Keyboard::from_u32(self.get(ConfigField::Keyboard))
    }

    pub fn set_keyboard(&mut self, value: Keyboard) {
        self.set(ConfigField::Keyboard, value as u32);
    }

    pub fn navigation(&self) -> Option<Navigation> {
        Navigation::from_u32(self.get(ConfigField::Navigation))
    }

    pub fn set_navigation(&mut self, value: Navigation) {
        self.set(ConfigField::Navigation, value as u32);
    }

    pub fn keys_hidden(&self) -> Option<KeysHidden> {
        KeysHidden::from_u32(self.get(ConfigField::KeysHidden))
    }

    pub fn set_keys_hidden(&mut self, value: KeysHidden) {
        self.set(ConfigField::KeysHidden, value as u32);
    }

    pub fn nav_hidden(&self) -> Option<NavHidden> {
        NavHidden::from_u32(self.get(ConfigField::NavHidden))
    }

    pub fn set_nav_hidden(&mut self, value: NavHidden) {
        self.set(ConfigField::NavHidden, value as u32);
    }

    pub fn screen_width(&self) -> u16 {
        self.get(ConfigField::ScreenWidth) as u16
    }

    pub fn set_screen_width(&mut self, value: u16) {
        self.set(ConfigField::ScreenWidth, u32::from(value));
    }

    pub fn screen_height(&self) -> u16 {
        self.get(ConfigField::ScreenHeight) as u16
    }

    pub fn set_screen_height(&mut self, value: u16) {
        self.set(ConfigField::ScreenHeight, u32::from(value));
    }

    pub fn sdk_version(&self) -> u16 {
        self.get(ConfigField::SdkVersion) as u16
    }

    pub fn set_sdk_version(&mut self, value: u16) {
        self.set(ConfigField::SdkVersion, u32::from(value));
    }

    /// Minor version; currently always 0 in practice.
    pub fn minor_version(&self) -> u16 {
        self.get(ConfigField::MinorVersion) as u16
    }

    pub fn set_minor_version(&mut self, value: u16) {
        self.set(ConfigField::MinorVersion, u32::from(value));
    }

    pub fn screen_layout_size(&self) -> Option<ScreenSize> {
        ScreenSize::from_u32(self.get(ConfigField::ScreenLayoutSize))
    }

    pub fn set_screen_layout_size(&mut self, value: ScreenSize) {
        self.set(ConfigField::ScreenLayoutSize, value as u32);
    }

    pub fn screen_layout_long(&self) -> Option<ScreenLong> {
        ScreenLong::from_u32(self.get(ConfigField::ScreenLayoutLong))
    }

    pub fn set_screen_layout_long(&mut self, value: ScreenLong) {
        self.set(ConfigField::ScreenLayoutLong, value as u32);
    }

    pub fn ui_mode_type(&self) -> Option<UiModeType> {
        UiModeType::from_u32(self.get(ConfigField::UiModeType))
    }

    pub fn set_ui_mode_type(&mut self, value: UiModeType) {
        self.set(ConfigField::UiModeType, value as u32);
    }

    pub fn ui_mode_night(&self) -> Option<UiModeNight> {
        UiModeNight::from_u32(self.get(ConfigField::UiModeNight))
    }

    pub fn set_ui_mode_night(&mut self, value: UiModeNight) {
        self.set(ConfigField::UiModeNight, value as u32);
    }

    pub fn smallest_screen_width_dp(&self) -> u16 {
        self.get(ConfigField::SmallestScreenWidthDp) as u16
    }

    pub fn set_smallest_screen_width_dp(&mut self, value: u16) {
        self.set(ConfigField::SmallestScreenWidthDp, u32::from(value));
    }

    pub fn screen_width_dp(&self) -> u16 {
        self.get(ConfigField::ScreenWidthDp) as u16
    }

    pub fn set_screen_width_dp(&mut self, value: u16) {
        self.set(ConfigField::ScreenWidthDp, u32::from(value));
    }

    pub fn screen_height_dp(&self) -> u16 {
        self.get(ConfigField::ScreenHeightDp) as u16
    }

    pub fn set_screen_height_dp(&mut self, value: u16) {
        self.set(ConfigField::ScreenHeightDp, u32::from(value));
    }
}

fn locale_code(bytes: [u8; 2]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn parse_locale_code(code: &str) -> Result<[u8; 2]> {
    match code.as_bytes() {
        [a, b] if a.is_ascii() && b.is_ascii() => Ok([*a, *b]),
        _ => Err(Error::InvalidArgument(format!(
            "locale code must be two ASCII characters, got {code:?}"
        ))),
    }
}
