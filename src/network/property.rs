//! Processor parameters.
//!
//! Properties form a tree per processor: composites group children, leaves
//! hold a [`PropertyValue`]. A leaf is addressed by its dotted path from the
//! processor root, e.g. `"transfer.scale"`.

use super::invalidation::InvalidationLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value held by a leaf property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Convert `incoming` to this value's kind, if the kinds are compatible.
    /// An integer is accepted where a float is expected.
    pub(crate) fn coerce(&self, incoming: PropertyValue) -> Option<PropertyValue> {
        match (self, incoming) {
            (PropertyValue::Float(_), PropertyValue::Int(v)) => Some(PropertyValue::Float(v as f64)),
            (current, incoming) if current.kind() == incoming.kind() => Some(incoming),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Text(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

/// A named parameter, either a leaf with a value or a composite of children.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    identifier: String,
    value: Option<PropertyValue>,
    invalidation_level: InvalidationLevel,
    children: Vec<Property>,
    modified: bool,
}

impl Property {
    pub fn new(identifier: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            identifier: identifier.into(),
            value: Some(value.into()),
            invalidation_level: InvalidationLevel::InvalidOutput,
            children: Vec::new(),
            modified: false,
        }
    }

    pub fn composite(identifier: impl Into<String>, children: Vec<Property>) -> Self {
        Self {
            identifier: identifier.into(),
            value: None,
            invalidation_level: InvalidationLevel::InvalidOutput,
            children,
            modified: false,
        }
    }

    /// Level raised on the owning processor when this property changes.
    pub fn with_invalidation_level(mut self, level: InvalidationLevel) -> Self {
        self.invalidation_level = level;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[Property] {
        &self.children
    }

    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.invalidation_level
    }

    /// True from a value change until the owning processor completes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Store `value`. Returns `true` when the stored value actually changed.
    pub(crate) fn assign(&mut self, value: PropertyValue) -> bool {
        if self.value.as_ref() == Some(&value) {
            return false;
        }
        self.value = Some(value);
        self.modified = true;
        true
    }
}

/// Resolve a dotted `path` within a property list.
pub fn find_property<'a>(properties: &'a [Property], path: &str) -> Option<&'a Property> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = properties.iter().find(|p| p.identifier == first)?;
    for segment in segments {
        current = current.children.iter().find(|p| p.identifier == segment)?;
    }
    Some(current)
}

pub(crate) fn find_property_mut<'a>(
    properties: &'a mut [Property],
    path: &str,
) -> Option<&'a mut Property> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = properties.iter_mut().find(|p| p.identifier == first)?;
    for segment in segments {
        current = current
            .children
            .iter_mut()
            .find(|p| p.identifier == segment)?;
    }
    Some(current)
}

/// Flatten every leaf value into `path -> value`.
pub(crate) fn collect_values(properties: &[Property]) -> BTreeMap<String, PropertyValue> {
    let mut values = BTreeMap::new();
    let mut stack: Vec<(String, &Property)> = properties
        .iter()
        .rev()
        .map(|p| (p.identifier.clone(), p))
        .collect();

    while let Some((path, property)) = stack.pop() {
        if let Some(value) = &property.value {
            values.insert(path.clone(), value.clone());
        }
        for child in property.children.iter().rev() {
            stack.push((format!("{}.{}", path, child.identifier), child));
        }
    }
    values
}

pub(crate) fn clear_modified(properties: &mut [Property]) {
    let mut stack: Vec<&mut Property> = properties.iter_mut().collect();
    while let Some(property) = stack.pop() {
        property.modified = false;
        stack.extend(property.children.iter_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Property> {
        vec![
            Property::new("enabled", true),
            Property::composite(
                "transfer",
                vec![
                    Property::new("scale", 2.0),
                    Property::new("label", "gain")
                        .with_invalidation_level(InvalidationLevel::InvalidResources),
                ],
            ),
        ]
    }

    #[test]
    fn finds_nested_paths() {
        let props = sample();
        assert_eq!(
            find_property(&props, "transfer.scale").and_then(|p| p.value()),
            Some(&PropertyValue::Float(2.0))
        );
        assert!(find_property(&props, "transfer").is_some());
        assert!(find_property(&props, "transfer.missing").is_none());
        assert!(find_property(&props, "").is_none());
    }

    #[test]
    fn coerce_widens_ints_into_floats_only() {
        let float = PropertyValue::Float(1.0);
        assert_eq!(float.coerce(PropertyValue::Int(3)), Some(PropertyValue::Float(3.0)));
        assert_eq!(PropertyValue::Int(1).coerce(PropertyValue::Float(3.0)), None);
        assert_eq!(float.coerce(PropertyValue::Text("x".into())), None);
    }

    #[test]
    fn assign_tracks_modification() {
        let mut props = sample();
        let scale = find_property_mut(&mut props, "transfer.scale").unwrap();
        assert!(!scale.assign(PropertyValue::Float(2.0)));
        assert!(!scale.is_modified());
        assert!(scale.assign(PropertyValue::Float(4.0)));
        assert!(scale.is_modified());

        clear_modified(&mut props);
        assert!(!find_property(&props, "transfer.scale").unwrap().is_modified());
    }

    #[test]
    fn collect_values_flattens_nested_paths() {
        let values = collect_values(&sample());
        let keys: Vec<_> = values.keys().cloned().collect();
        assert_eq!(keys, vec!["enabled", "transfer.label", "transfer.scale"]);
    }

    #[test]
    fn untagged_values_parse_from_yaml() {
        let values: Vec<PropertyValue> = serde_yaml::from_str("[true, 3, 2.5, hello]").unwrap();
        assert_eq!(
            values,
            vec![
                PropertyValue::Bool(true),
                PropertyValue::Int(3),
                PropertyValue::Float(2.5),
                PropertyValue::Text("hello".into()),
            ]
        );
    }
}
