//! Configuration file management
//!
//! Loads TOML configuration files describing how glyph atlases are built,
//! how serialized fonts are loaded and the default render options.
//! Default config path: ~/.config/fontsheet/config.toml

pub mod charset;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{MAX_SUPER_SAMPLE, MIN_SUPER_SAMPLE};
use crate::error::FontError;
use crate::layout::options::{Monospacing, RenderOptions};
use crate::utils::parse_hex_color_to_rgba;

pub use charset::CharacterSet;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font source used by `fontsheet build`
    pub font: FontSourceConfig,
    /// Atlas build settings
    pub build: BuildConfig,
    /// Settings applied when loading a `.qfont` file
    pub loader: LoaderConfig,
    /// Default render options
    pub render: RenderConfig,
}

/// Font source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSourceConfig {
    /// Family name or file path
    pub font: String,
    /// Point size
    pub size: f32,
    pub style: FontStyle,
}

impl Default for FontSourceConfig {
    fn default() -> Self {
        Self {
            font: String::new(),
            size: 16.0,
            style: FontStyle::Regular,
        }
    }
}

/// Font style requested from the rasterizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl std::fmt::Display for FontStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Regular => "Regular",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::BoldItalic => "BoldItalic",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "regular" | "normal" => Ok(Self::Regular),
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "bolditalic" => Ok(Self::BoldItalic),
            _ => Err(format!("unknown font style \"{}\"", s)),
        }
    }
}

/// Rasterization quality hint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderHint {
    /// Whatever the rasterizer does by default (anti-aliased)
    SystemDefault,
    /// Threshold coverage to whole pixels
    GridFit,
    AntiAlias,
    /// Grid fit at small sizes, anti-alias otherwise
    #[default]
    SizeDependent,
}

/// How the shadow alpha channel is widened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowType {
    /// Box blur
    #[default]
    Blurred,
    /// Alpha dilation
    Expanded,
}

/// Per-character kerning override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterKerningRule {
    /// Geometric kerning
    #[default]
    Normal,
    /// No kerning: pairs keep a one pixel gap
    Zero,
    /// Pairs never overlap by more than half the narrower glyph
    NotMoreThanHalf,
}

/// Atlas build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Predefined Unicode blocks
    pub character_set: CharacterSet,
    /// Characters added on top of `character_set`
    pub extra_chars: String,
    /// Empty pixels kept around each packed glyph
    pub glyph_margin: i32,
    /// Rasterize at this multiple of the target size, then downscale (1-8)
    pub super_sample_levels: u8,
    /// Maximum atlas page dimension
    pub max_texture_size: u32,
    pub render_hint: RenderHint,
    /// Round the cropped page up to a power of two
    pub force_power_of_two: bool,
    pub kerning: KerningConfig,
    /// Drop shadow (disabled when absent)
    pub shadow: Option<ShadowConfig>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            character_set: CharacterSet::GENERAL,
            extra_chars: String::new(),
            glyph_margin: 2,
            super_sample_levels: 1,
            max_texture_size: 4096,
            render_hint: RenderHint::SizeDependent,
            force_power_of_two: true,
            kerning: KerningConfig::default(),
            shadow: None,
        }
    }
}

impl BuildConfig {
    /// Reject settings that would fail mid-build
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(MIN_SUPER_SAMPLE..=MAX_SUPER_SAMPLE).contains(&self.super_sample_levels) {
            return Err(FontError::InvalidSuperSample(self.super_sample_levels));
        }
        Ok(())
    }

    /// Characters to rasterize, in build order
    pub fn chars(&self) -> Vec<char> {
        self.character_set.chars(&self.extra_chars)
    }
}

/// Drop shadow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow pages are scaled by this factor after packing
    pub scale: f32,
    #[serde(rename = "type")]
    pub shadow_type: ShadowType,
    pub blur_radius: u32,
    pub blur_passes: u32,
    pub glyph_margin: i32,
    pub max_texture_size: u32,
    pub force_power_of_two: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            shadow_type: ShadowType::Blurred,
            blur_radius: 3,
            blur_passes: 2,
            glyph_margin: 2,
            max_texture_size: 4096,
            force_power_of_two: true,
        }
    }
}

/// A rule applied to every character of `chars`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerningRule {
    pub chars: String,
    pub rule: CharacterKerningRule,
}

/// Kerning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KerningConfig {
    /// Alpha at or below this value counts as empty
    pub alpha_empty_pixel_tolerance: u8,
    /// Later entries override earlier ones
    pub rules: Vec<KerningRule>,
}

impl Default for KerningConfig {
    fn default() -> Self {
        Self {
            alpha_empty_pixel_tolerance: 0,
            rules: vec![
                KerningRule {
                    chars: "_^".to_string(),
                    rule: CharacterKerningRule::Zero,
                },
                KerningRule {
                    chars: "\"'".to_string(),
                    rule: CharacterKerningRule::NotMoreThanHalf,
                },
            ],
        }
    }
}

impl KerningConfig {
    /// Set the rule for every character in `chars`
    pub fn set_rule(&mut self, chars: &str, rule: CharacterKerningRule) {
        self.rules.push(KerningRule {
            chars: chars.to_string(),
            rule,
        });
    }

    pub fn rule_for(&self, c: char) -> CharacterKerningRule {
        self.rules
            .iter()
            .rev()
            .find(|r| r.chars.contains(c))
            .map(|r| r.rule)
            .unwrap_or_default()
    }

    /// Effective rule of a pair: `Zero` beats `NotMoreThanHalf` beats `Normal`
    pub fn pair_rule(&self, c1: char, c2: char) -> CharacterKerningRule {
        use CharacterKerningRule::*;
        match (self.rule_for(c1), self.rule_for(c2)) {
            (Zero, _) | (_, Zero) => Zero,
            (NotMoreThanHalf, _) | (_, NotMoreThanHalf) => NotMoreThanHalf,
            _ => Normal,
        }
    }
}

/// Settings applied when loading a serialized font
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rescale factor applied to the loaded pages (1.0 = as saved)
    pub down_sample: f32,
    /// Page size limit when repacking glyphs shrunk by `down_sample`
    pub max_texture_size: u32,
    pub kerning: KerningConfig,
    pub shadow: Option<ShadowConfig>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            down_sample: 1.0,
            max_texture_size: 4096,
            kerning: KerningConfig::default(),
            shadow: None,
        }
    }
}

/// Default render options (colours as RRGGBB or RRGGBBAA hex)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub colour: String,
    pub character_spacing: f32,
    pub word_spacing: f32,
    pub line_spacing: f32,
    pub drop_shadow: bool,
    pub drop_shadow_colour: String,
    pub drop_shadow_opacity: f32,
    /// In units of mean glyph width
    pub drop_shadow_offset: [f32; 2],
    pub monospacing: Monospacing,
    pub word_wrap: bool,
    pub justify_character_weight_for_expand: f32,
    pub justify_character_weight_for_contract: f32,
    pub justify_cap_expand: f32,
    pub justify_cap_contract: f32,
    pub justify_contraction_penalty: f32,
    pub lock_to_pixel: bool,
    pub lock_to_pixel_ratio: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            colour: "ffffff".to_string(),
            character_spacing: options.character_spacing,
            word_spacing: options.word_spacing,
            line_spacing: options.line_spacing,
            drop_shadow: options.drop_shadow_active,
            drop_shadow_colour: "000000".to_string(),
            drop_shadow_opacity: options.drop_shadow_opacity,
            drop_shadow_offset: [options.drop_shadow_offset.0, options.drop_shadow_offset.1],
            monospacing: options.monospacing,
            word_wrap: options.word_wrap,
            justify_character_weight_for_expand: options.justify_character_weight_for_expand,
            justify_character_weight_for_contract: options.justify_character_weight_for_contract,
            justify_cap_expand: options.justify_cap_expand,
            justify_cap_contract: options.justify_cap_contract,
            justify_contraction_penalty: options.justify_contraction_penalty,
            lock_to_pixel: options.lock_to_pixel,
            lock_to_pixel_ratio: options.lock_to_pixel_ratio,
        }
    }
}

impl RenderConfig {
    /// Convert to layout options; invalid colours fall back to the defaults
    pub fn to_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        let colour = |hex: &str, fallback: [f32; 4]| {
            parse_hex_color_to_rgba(hex).unwrap_or_else(|| {
                warn!("Invalid colour \"{}\", using default", hex);
                fallback
            })
        };
        RenderOptions {
            colour: colour(&self.colour, defaults.colour),
            character_spacing: self.character_spacing,
            word_spacing: self.word_spacing,
            line_spacing: self.line_spacing,
            drop_shadow_active: self.drop_shadow,
            drop_shadow_colour: colour(&self.drop_shadow_colour, defaults.drop_shadow_colour),
            drop_shadow_opacity: self.drop_shadow_opacity.clamp(0.0, 1.0),
            drop_shadow_offset: (self.drop_shadow_offset[0], self.drop_shadow_offset[1]),
            monospacing: self.monospacing,
            word_wrap: self.word_wrap,
            justify_character_weight_for_expand: self
                .justify_character_weight_for_expand
                .clamp(0.0, 1.0),
            justify_character_weight_for_contract: self
                .justify_character_weight_for_contract
                .clamp(0.0, 1.0),
            justify_cap_expand: self.justify_cap_expand,
            justify_cap_contract: self.justify_cap_contract,
            justify_contraction_penalty: self.justify_contraction_penalty,
            lock_to_pixel: self.lock_to_pixel,
            lock_to_pixel_ratio: self.lock_to_pixel_ratio.clamp(0.0, 1.0),
            ..defaults
        }
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. FONTSHEET_CONFIG environment variable
        if let Ok(path) = std::env::var("FONTSHEET_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/fontsheet/config.toml
        let user_config = Self::default_path()?;
        if user_config.exists() {
            return Some(user_config);
        }

        None
    }

    /// ~/.config/fontsheet/config.toml, whether or not it exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fontsheet").join("config.toml"))
    }

    /// Load configuration with priority:
    /// 1. FONTSHEET_CONFIG environment variable
    /// 2. ~/.config/fontsheet/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .build
            .validate()
            .with_context(|| format!("Invalid build settings in {}", path.display()))?;
        Ok(config)
    }

    /// Write a default config template
    ///
    /// Uses the user config path when `path` is None. Returns the path written.
    pub fn write_default(path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()
                .ok_or_else(|| anyhow::anyhow!("Config directory not found"))?,
        };
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let body = fix_float_precision(&toml::to_string_pretty(&Self::default())?);
        let template = format!(
            r#"# fontsheet configuration file
#
# [font] is only used by `fontsheet build`; the command line wins.
# Character sets: basic, french_quotes, spanish_quest_ex, cyrillic,
#   extended_latin, greek, turkish_i, hebrew, arabic, thai_khmer, hiragana,
#   japanese_digits, asian_quotes, essential_kanji, katakana,
#   general, japanese, thai, all
# Render hints: system_default, grid_fit, anti_alias, size_dependent
#
# Uncomment to add a drop shadow:
# [build.shadow]
# type = "blurred"          # or "expanded"
# blur_radius = 3
# blur_passes = 2

{body}"#
        );

        std::fs::write(&config_path, template)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        info!("Config template written: {}", config_path.display());
        Ok(config_path)
    }
}

/// Shorten f32 values that serialize with f64 noise ("0.05000000074505806" -> "0.05")
fn fix_float_precision(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut token = String::new();

    let flush = |token: &mut String, out: &mut String| {
        out.push_str(&shorten_float(token));
        token.clear();
    };

    for c in content.chars() {
        if c.is_ascii_digit() || c == '.' || (c == '-' && token.is_empty()) {
            token.push(c);
        } else {
            flush(&mut token, &mut result);
            result.push(c);
        }
    }
    flush(&mut token, &mut result);
    result
}

fn shorten_float(token: &str) -> String {
    let Some((_, fraction)) = token.split_once('.') else {
        return token.to_string();
    };
    // f32 carries at most 9 significant digits
    if fraction.len() <= 8 {
        return token.to_string();
    }
    match token.parse::<f64>() {
        Ok(v) => {
            let short = (v as f32).to_string();
            if short.contains('.') {
                short
            } else {
                format!("{}.0", short)
            }
        }
        Err(_) => token.to_string(),
    }
}
