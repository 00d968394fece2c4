use std::collections::HashMap;

use serde::Serialize;

use crate::key::attributes::{
    DisplayGamut, GraphicsClass, Idiom, MemoryClass, RenditionAttribute, SizeClass,
};

/// Classification key of one rendition.
///
/// `name` is shared by every variant of a logical asset; `rendition_name` is unique within a
/// container. `attributes` keeps the raw token pairs so a key can be matched back to its entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionKey {
    /// Facet name, falling back to the rendition name when no facet matches.
    pub name: String,
    /// Name recorded in the rendition header.
    pub rendition_name: String,
    /// Target device class.
    pub idiom: Idiom,
    /// Device subtype (for example a screen-size variant).
    pub subtype: u64,
    /// Horizontal size class.
    pub size_class_horizontal: SizeClass,
    /// Vertical size class.
    pub size_class_vertical: SizeClass,
    /// Graphics feature-set class.
    pub graphics_class: GraphicsClass,
    /// Memory class.
    pub memory_class: MemoryClass,
    /// Display gamut.
    pub display_gamut: DisplayGamut,
    /// Appearance name, such as `NSAppearanceNameDarkAqua`.
    pub appearance: Option<String>,
    /// Scale attribute from the key (0 when unset).
    pub scale: u16,
    /// Layout direction attribute.
    pub direction: u16,
    /// Raw `(attribute, value)` tokens in key-format order.
    pub attributes: Vec<(RenditionAttribute, u16)>,
}

/// Name tables read from `FACETKEYS` and `APPEARANCEKEYS`.
#[derive(Clone, Debug, Default)]
pub(crate) struct NameTables {
    pub(crate) facets: HashMap<u16, String>,
    pub(crate) appearances: HashMap<u16, String>,
}

impl RenditionKey {
    pub(crate) fn from_attributes(
        attributes: Vec<(RenditionAttribute, u16)>,
        rendition_name: String,
        names: &NameTables,
    ) -> Self {
        let get = |wanted: RenditionAttribute| {
            attributes
                .iter()
                .find(|(attr, _)| *attr == wanted)
                .map(|(_, v)| *v)
        };

        let name = get(RenditionAttribute::Identifier)
            .and_then(|id| names.facets.get(&id).cloned())
            .unwrap_or_else(|| rendition_name.clone());
        let appearance = get(RenditionAttribute::Appearance)
            .filter(|id| *id != 0)
            .and_then(|id| names.appearances.get(&id).cloned());

        Self {
            name,
            rendition_name,
            idiom: Idiom::new(get(RenditionAttribute::Idiom).unwrap_or(0)),
            subtype: u64::from(get(RenditionAttribute::Subtype).unwrap_or(0)),
            size_class_horizontal: SizeClass::new(
                get(RenditionAttribute::HorizontalSizeClass).unwrap_or(0),
            ),
            size_class_vertical: SizeClass::new(
                get(RenditionAttribute::VerticalSizeClass).unwrap_or(0),
            ),
            graphics_class: GraphicsClass::new(get(RenditionAttribute::GraphicsClass).unwrap_or(0)),
            memory_class: MemoryClass::new(get(RenditionAttribute::MemoryClass).unwrap_or(0)),
            display_gamut: DisplayGamut::new(get(RenditionAttribute::DisplayGamut).unwrap_or(0)),
            appearance,
            scale: get(RenditionAttribute::Scale).unwrap_or(0),
            direction: get(RenditionAttribute::Direction).unwrap_or(0),
            attributes,
        }
    }

    /// Value of a raw attribute token, if the key format carries it.
    pub fn attribute(&self, attr: RenditionAttribute) -> Option<u16> {
        self.attributes
            .iter()
            .find(|(a, _)| *a == attr)
            .map(|(_, v)| *v)
    }

    /// Short human-readable classification, e.g. `phone @2x compact/regular P3`.
    ///
    /// Unspecified classifications are omitted; sRGB is the default gamut and is not printed.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let idiom = self.idiom.label();
        if !idiom.is_empty() {
            parts.push(idiom);
        }
        if self.subtype != 0 {
            parts.push(format!("subtype {}", self.subtype));
        }
        if self.scale > 1 {
            parts.push(format!("@{}x", self.scale));
        }
        let h = self.size_class_horizontal.label();
        let v = self.size_class_vertical.label();
        if !h.is_empty() || !v.is_empty() {
            let any = |s: String| if s.is_empty() { "any".to_string() } else { s };
            parts.push(format!("{}/{}", any(h), any(v)));
        }
        for label in [self.graphics_class.label(), self.memory_class.label()] {
            if !label.is_empty() {
                parts.push(label);
            }
        }
        if self.display_gamut != DisplayGamut::Srgb {
            parts.push(self.display_gamut.label());
        }
        if let Some(appearance) = &self.appearance {
            parts.push(appearance.clone());
        }
        parts.join(" ")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/key/rendition_key.rs"]
mod tests;
