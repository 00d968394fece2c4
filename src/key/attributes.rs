//! Attribute identifiers and the classification enums they carry.
//!
//! Each enum maps on-disk tag values verbatim. Unknown tags are kept as `Other(raw)` so
//! newer catalogs still enumerate.

use serde::Serialize;

/// Attribute identifier used by `KEYFORMAT` and facet key tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RenditionAttribute {
    /// Theme look.
    ThemeLook,
    /// Element id.
    Element,
    /// Part id.
    Part,
    /// Size.
    Size,
    /// Layout direction.
    Direction,
    /// Reserved placeholder.
    Placeholder,
    /// Value.
    Value,
    /// Appearance id, resolved through `APPEARANCEKEYS`.
    Appearance,
    /// First dimension.
    Dimension1,
    /// Second dimension.
    Dimension2,
    /// State.
    State,
    /// Layer.
    Layer,
    /// Device scale factor.
    Scale,
    /// Localization.
    Localization,
    /// Presentation state.
    PresentationState,
    /// Target idiom.
    Idiom,
    /// Device subtype.
    Subtype,
    /// Facet identifier, resolved through `FACETKEYS`.
    Identifier,
    /// Previous value.
    PreviousValue,
    /// Previous state.
    PreviousState,
    /// Horizontal size class.
    HorizontalSizeClass,
    /// Vertical size class.
    VerticalSizeClass,
    /// Memory class.
    MemoryClass,
    /// Graphics feature-set class.
    GraphicsClass,
    /// Display gamut.
    DisplayGamut,
    /// Deployment target.
    DeploymentTarget,
    /// Attribute id not known to this crate.
    Other(u16),
}

impl RenditionAttribute {
    /// Map an on-disk attribute id.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::ThemeLook,
            1 => Self::Element,
            2 => Self::Part,
            3 => Self::Size,
            4 => Self::Direction,
            5 => Self::Placeholder,
            6 => Self::Value,
            7 => Self::Appearance,
            8 => Self::Dimension1,
            9 => Self::Dimension2,
            10 => Self::State,
            11 => Self::Layer,
            12 => Self::Scale,
            13 => Self::Localization,
            14 => Self::PresentationState,
            15 => Self::Idiom,
            16 => Self::Subtype,
            17 => Self::Identifier,
            18 => Self::PreviousValue,
            19 => Self::PreviousState,
            20 => Self::HorizontalSizeClass,
            21 => Self::VerticalSizeClass,
            22 => Self::MemoryClass,
            23 => Self::GraphicsClass,
            24 => Self::DisplayGamut,
            25 => Self::DeploymentTarget,
            x => Self::Other(x),
        }
    }

    /// On-disk attribute id.
    pub fn value(&self) -> u16 {
        match self {
            Self::ThemeLook => 0,
            Self::Element => 1,
            Self::Part => 2,
            Self::Size => 3,
            Self::Direction => 4,
            Self::Placeholder => 5,
            Self::Value => 6,
            Self::Appearance => 7,
            Self::Dimension1 => 8,
            Self::Dimension2 => 9,
            Self::State => 10,
            Self::Layer => 11,
            Self::Scale => 12,
            Self::Localization => 13,
            Self::PresentationState => 14,
            Self::Idiom => 15,
            Self::Subtype => 16,
            Self::Identifier => 17,
            Self::PreviousValue => 18,
            Self::PreviousState => 19,
            Self::HorizontalSizeClass => 20,
            Self::VerticalSizeClass => 21,
            Self::MemoryClass => 22,
            Self::GraphicsClass => 23,
            Self::DisplayGamut => 24,
            Self::DeploymentTarget => 25,
            Self::Other(x) => *x,
        }
    }
}

/// Target device class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Idiom {
    /// Any device.
    #[default]
    Universal,
    /// Phone.
    Phone,
    /// Tablet.
    Pad,
    /// TV.
    Tv,
    /// Car display.
    Car,
    /// Watch.
    Watch,
    /// App store marketing.
    Marketing,
    /// Unknown tag.
    Other(u16),
}

impl Idiom {
    /// Map an on-disk tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Universal,
            1 => Self::Phone,
            2 => Self::Pad,
            3 => Self::Tv,
            4 => Self::Car,
            5 => Self::Watch,
            6 => Self::Marketing,
            x => Self::Other(x),
        }
    }

    /// On-disk tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Universal => 0,
            Self::Phone => 1,
            Self::Pad => 2,
            Self::Tv => 3,
            Self::Car => 4,
            Self::Watch => 5,
            Self::Marketing => 6,
            Self::Other(x) => *x,
        }
    }

    /// Short label; empty for the universal idiom.
    pub fn label(&self) -> String {
        match self {
            Self::Universal => String::new(),
            Self::Phone => "phone".into(),
            Self::Pad => "pad".into(),
            Self::Tv => "tv".into(),
            Self::Car => "car".into(),
            Self::Watch => "watch".into(),
            Self::Marketing => "marketing".into(),
            Self::Other(x) => format!("idiom{x}"),
        }
    }
}

/// Horizontal or vertical size class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SizeClass {
    /// Any size class.
    #[default]
    Unspecified,
    /// Compact.
    Compact,
    /// Regular.
    Regular,
    /// Unknown tag.
    Other(u16),
}

impl SizeClass {
    /// Map an on-disk tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Unspecified,
            1 => Self::Compact,
            2 => Self::Regular,
            x => Self::Other(x),
        }
    }

    /// On-disk tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Unspecified => 0,
            Self::Compact => 1,
            Self::Regular => 2,
            Self::Other(x) => *x,
        }
    }

    /// Short label; empty when unspecified.
    pub fn label(&self) -> String {
        match self {
            Self::Unspecified => String::new(),
            Self::Compact => "compact".into(),
            Self::Regular => "regular".into(),
            Self::Other(x) => format!("sizeclass{x}"),
        }
    }
}

/// GPU feature-set tier, ordered oldest to newest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum GraphicsClass {
    /// No requirement.
    #[default]
    Default,
    /// Metal family 1 v2.
    Metal1v2,
    /// Metal family 2 v2.
    Metal2v2,
    /// Metal family 3 v1.
    Metal3v1,
    /// Metal family 3 v2.
    Metal3v2,
    /// Metal family 4 v1.
    Metal4v1,
    /// Metal family 5 v1.
    Metal5v1,
    /// Unknown tag.
    Other(u16),
}

impl GraphicsClass {
    /// Map an on-disk tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Default,
            1 => Self::Metal1v2,
            2 => Self::Metal2v2,
            3 => Self::Metal3v1,
            4 => Self::Metal3v2,
            5 => Self::Metal4v1,
            6 => Self::Metal5v1,
            x => Self::Other(x),
        }
    }

    /// On-disk tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Default => 0,
            Self::Metal1v2 => 1,
            Self::Metal2v2 => 2,
            Self::Metal3v1 => 3,
            Self::Metal3v2 => 4,
            Self::Metal4v1 => 5,
            Self::Metal5v1 => 6,
            Self::Other(x) => *x,
        }
    }

    /// Short label; empty for the default tier.
    pub fn label(&self) -> String {
        match self {
            Self::Default => String::new(),
            Self::Metal1v2 => "MTL1,2".into(),
            Self::Metal2v2 => "MTL2,2".into(),
            Self::Metal3v1 => "MTL3,1".into(),
            Self::Metal3v2 => "MTL3,2".into(),
            Self::Metal4v1 => "MTL4,1".into(),
            Self::Metal5v1 => "MTL5,1".into(),
            Self::Other(x) => format!("MTL?{x}"),
        }
    }
}

/// Device memory tier.
///
/// Tag order is the platform's rollout order, so 4GB (3) precedes 3GB (4). Do not sort by
/// capacity when mapping tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MemoryClass {
    /// No requirement.
    #[default]
    Low,
    /// 1 GB.
    Gb1,
    /// 2 GB.
    Gb2,
    /// 4 GB.
    Gb4,
    /// 3 GB.
    Gb3,
    /// 6 GB.
    Gb6,
    /// Unknown tag.
    Other(u16),
}

impl MemoryClass {
    /// Map an on-disk tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Low,
            1 => Self::Gb1,
            2 => Self::Gb2,
            3 => Self::Gb4,
            4 => Self::Gb3,
            5 => Self::Gb6,
            x => Self::Other(x),
        }
    }

    /// On-disk tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Low => 0,
            Self::Gb1 => 1,
            Self::Gb2 => 2,
            Self::Gb4 => 3,
            Self::Gb3 => 4,
            Self::Gb6 => 5,
            Self::Other(x) => *x,
        }
    }

    /// Short label; empty for the low tier.
    pub fn label(&self) -> String {
        match self {
            Self::Low => String::new(),
            Self::Gb1 => "1GB".into(),
            Self::Gb2 => "2GB".into(),
            Self::Gb4 => "4GB".into(),
            Self::Gb3 => "3GB".into(),
            Self::Gb6 => "6GB".into(),
            Self::Other(x) => format!("mem{x}"),
        }
    }
}

/// Display color gamut.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DisplayGamut {
    /// sRGB.
    #[default]
    Srgb,
    /// Display P3.
    P3,
    /// Unknown tag.
    Other(u16),
}

impl DisplayGamut {
    /// Map an on-disk tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            0 => Self::Srgb,
            1 => Self::P3,
            x => Self::Other(x),
        }
    }

    /// On-disk tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Srgb => 0,
            Self::P3 => 1,
            Self::Other(x) => *x,
        }
    }

    /// Short label.
    pub fn label(&self) -> String {
        match self {
            Self::Srgb => "sRGB".into(),
            Self::P3 => "P3".into(),
            Self::Other(x) => format!("gamut{x}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/key/attributes.rs"]
mod tests;
