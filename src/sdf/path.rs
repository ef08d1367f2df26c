//! Spec paths: addresses of prims, variant prims and properties in a layer.
//!
//! Textual form follows the usual scene-description convention:
//! `/World/Geom`, `/World{look=red}Shader`, `/World/Geom.texture`.

use std::fmt;
use std::str::FromStr;

use crate::core::LocalizeError;

/// One step of a prim path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// A named child prim
    Prim(String),
    /// A variant selection on the preceding prim
    Variant {
        /// Variant set name
        set: String,
        /// Selected variant
        selection: String,
    },
}

/// Absolute path to a spec in a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SpecPath {
    elements: Vec<PathElement>,
    property: Option<String>,
}

impl SpecPath {
    /// The pseudo-root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` for the pseudo-root.
    pub fn is_root(&self) -> bool {
        self.elements.is_empty() && self.property.is_none()
    }

    /// Returns `true` if the path addresses a property.
    pub fn is_property(&self) -> bool {
        self.property.is_some()
    }

    /// The prim elements of the path.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// The property name, if this is a property path.
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The owning prim path (drops the property part).
    pub fn prim_path(&self) -> SpecPath {
        Self {
            elements: self.elements.clone(),
            property: None,
        }
    }

    /// Appends a child prim.
    pub fn append_child(&self, name: impl Into<String>) -> SpecPath {
        let mut elements = self.elements.clone();
        elements.push(PathElement::Prim(name.into()));
        Self {
            elements,
            property: None,
        }
    }

    /// Appends a variant selection.
    pub fn append_variant(&self, set: impl Into<String>, selection: impl Into<String>) -> SpecPath {
        let mut elements = self.elements.clone();
        elements.push(PathElement::Variant {
            set: set.into(),
            selection: selection.into(),
        });
        Self {
            elements,
            property: None,
        }
    }

    /// Appends a property name to a prim path.
    pub fn append_property(&self, name: impl Into<String>) -> SpecPath {
        Self {
            elements: self.elements.clone(),
            property: Some(name.into()),
        }
    }
}

impl fmt::Display for SpecPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            write!(f, "/")?;
        }
        for element in &self.elements {
            match element {
                PathElement::Prim(name) => write!(f, "/{name}")?,
                PathElement::Variant {
                    set,
                    selection,
                } => write!(f, "{{{set}={selection}}}")?,
            }
        }
        if let Some(property) = &self.property {
            write!(f, ".{property}")?;
        }
        Ok(())
    }
}

impl FromStr for SpecPath {
    type Err = LocalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| LocalizeError::InvalidSpecPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let Some(mut rest) = s.strip_prefix('/') else {
            return Err(invalid("spec paths must be absolute"));
        };

        let mut path = SpecPath::root();
        // A variant selection is followed directly by a prim name, without '/'.
        let mut expect_name = !rest.is_empty();

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('{') {
                let close = after.find('}').ok_or_else(|| invalid("unterminated variant"))?;
                let (set, selection) =
                    after[..close].split_once('=').ok_or_else(|| invalid("variant needs '='"))?;
                if path.elements.is_empty() {
                    return Err(invalid("variant selection without a prim"));
                }
                path = path.append_variant(set, selection);
                rest = &after[close + 1..];
                expect_name = !rest.is_empty() && !rest.starts_with('.');
                continue;
            }

            if let Some(property) = rest.strip_prefix('.') {
                if property.is_empty() || path.elements.is_empty() {
                    return Err(invalid("empty property name"));
                }
                return Ok(path.append_property(property));
            }

            let rest_name = rest.strip_prefix('/').unwrap_or(rest);
            if !expect_name && rest_name.len() == rest.len() {
                return Err(invalid("expected '/' between prim names"));
            }
            let end = rest_name.find(['/', '{', '.']).unwrap_or(rest_name.len());
            let name = &rest_name[..end];
            if name.is_empty() {
                return Err(invalid("empty prim name"));
            }
            path = path.append_child(name);
            rest = &rest_name[end..];
            expect_name = false;
        }

        Ok(path)
    }
}
