use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind tag carried by a parsed document segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Document heading (`section_header`)
    SectionHeader,

    /// Body text (`text`)
    Text,

    /// Any other label (captions, list items, tables, ...); ignored by the builder
    Other(String),
}

impl SegmentKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SectionHeader => "section_header",
            Self::Text => "text",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl From<&str> for SegmentKind {
    fn from(label: &str) -> Self {
        match label {
            "section_header" => Self::SectionHeader,
            "text" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for SegmentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SegmentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from(label.as_str()))
    }
}

/// One unit of parsed document content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(alias = "label")]
    pub kind: SegmentKind,
    #[serde(default)]
    pub text: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn section_header(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::SectionHeader, text)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Text, text)
    }

    pub fn other(label: &str, text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Other(label.to_string()), text)
    }
}
