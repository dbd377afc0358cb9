use serde::Deserialize;

/// A user facing column width: a named size or an explicit pixel value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WidthSpec {
    Pixels(f64),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedSize {
    Small,
    Medium,
    Large,
}

impl NamedSize {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "small" => Some(NamedSize::Small),
            "medium" => Some(NamedSize::Medium),
            "large" => Some(NamedSize::Large),
            _ => None,
        }
    }

    pub fn pixels(self) -> f64 {
        match self {
            NamedSize::Small => 75.0,
            NamedSize::Medium => 200.0,
            NamedSize::Large => 400.0,
        }
    }
}

/// Maps a width specifier to pixels. Unknown names resolve to `None`, numbers
/// are passed through without clamping.
pub fn resolve_width(spec: Option<&WidthSpec>) -> Option<f64> {
    match spec? {
        WidthSpec::Pixels(px) => Some(*px),
        WidthSpec::Named(name) => NamedSize::from_name(name).map(NamedSize::pixels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(s: &str) -> WidthSpec {
        WidthSpec::Named(s.to_string())
    }

    #[test]
    fn named_sizes() {
        assert_eq!(resolve_width(Some(&named("small"))), Some(75.0));
        assert_eq!(resolve_width(Some(&named("medium"))), Some(200.0));
        assert_eq!(resolve_width(Some(&named("large"))), Some(400.0));
    }

    #[test]
    fn pixels_pass_through() {
        assert_eq!(resolve_width(Some(&WidthSpec::Pixels(123.0))), Some(123.0));
        assert_eq!(resolve_width(Some(&WidthSpec::Pixels(-5.0))), Some(-5.0));
    }

    #[test]
    fn absent_and_unknown() {
        assert_eq!(resolve_width(None), None);
        assert_eq!(resolve_width(Some(&named("bogus"))), None);
        assert_eq!(resolve_width(Some(&named("Small"))), None);
    }

    #[test]
    fn deserializes_numbers_and_names() {
        let w: WidthSpec = serde_json::from_str("123").unwrap();
        assert_eq!(w, WidthSpec::Pixels(123.0));
        let w: WidthSpec = serde_json::from_str("\"large\"").unwrap();
        assert_eq!(w, named("large"));
    }
}
