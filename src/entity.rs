//! Translatable site content and the static table of which fields are
//! translated with which shape.

use crate::error::{Result, TranscacheError};
use crate::shape::FieldShape;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of content a translation record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Service,
    ServiceOption,
    CollageText,
    GalleryGroup,
    TermsOfService,
    PrivacyPolicy,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Service,
        SourceType::ServiceOption,
        SourceType::CollageText,
        SourceType::GalleryGroup,
        SourceType::TermsOfService,
        SourceType::PrivacyPolicy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Service => "service",
            SourceType::ServiceOption => "service_option",
            SourceType::CollageText => "collage_text",
            SourceType::GalleryGroup => "gallery_group",
            SourceType::TermsOfService => "terms_of_service",
            SourceType::PrivacyPolicy => "privacy_policy",
        }
    }

    /// Translated fields of this kind, in translation order.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            SourceType::Service | SourceType::ServiceOption => OFFERING_FIELDS,
            SourceType::CollageText => COLLAGE_TEXT_FIELDS,
            SourceType::GalleryGroup => GALLERY_GROUP_FIELDS,
            SourceType::TermsOfService | SourceType::PrivacyPolicy => DOCUMENT_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|f| f.name == name)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = TranscacheError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| TranscacheError::UnknownSourceType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: FieldShape,
}

const fn field(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec { name, shape }
}

const OFFERING_FIELDS: &[FieldSpec] = &[
    field("name", FieldShape::Plain),
    field("description", FieldShape::Plain),
    field("details", FieldShape::StringList),
    field("packages", FieldShape::PackageTable),
    field("refund_policy", FieldShape::PipeTable),
    field("overtime_charge", FieldShape::PipeTable),
    field("faq", FieldShape::Nested),
];

const COLLAGE_TEXT_FIELDS: &[FieldSpec] = &[field("caption", FieldShape::Plain)];

const GALLERY_GROUP_FIELDS: &[FieldSpec] = &[field("title", FieldShape::Plain)];

const DOCUMENT_FIELDS: &[FieldSpec] = &[field("content", FieldShape::Plain)];

/// Content that can be translated and resolved.
pub trait Translatable: Send + Sync {
    fn source_type(&self) -> SourceType;

    fn id(&self) -> i64;

    /// Live source-language value of a schema field, `Value::Null` when unset.
    fn field_value(&self, name: &str) -> Value;

    fn schema(&self) -> &'static [FieldSpec] {
        self.source_type().schema()
    }
}

/// One row of a package/price table.
pub type PackageRow = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub details: Vec<String>,
    pub packages: Vec<PackageRow>,
    pub refund_policy: Option<String>,
    pub overtime_charge: Option<String>,
    /// Free-form JSON such as FAQ sections; every string leaf is translated.
    pub faq: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOption {
    pub id: i64,
    pub service_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub details: Vec<String>,
    pub packages: Vec<PackageRow>,
    pub refund_policy: Option<String>,
    pub overtime_charge: Option<String>,
    /// Free-form JSON such as FAQ sections; every string leaf is translated.
    pub faq: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageText {
    pub id: i64,
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryGroup {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsOfService {
    pub id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPolicy {
    pub id: i64,
    pub content: String,
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn optional_text(value: &Option<String>) -> Value {
    value.as_deref().map(text).unwrap_or(Value::Null)
}

fn text_list(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| text(s)).collect())
}

fn package_rows(rows: &[PackageRow]) -> Value {
    Value::Array(rows.iter().cloned().map(Value::Object).collect())
}

macro_rules! offering_field_value {
    ($self:ident, $name:ident) => {
        match $name {
            "name" => text(&$self.name),
            "description" => optional_text(&$self.description),
            "details" => text_list(&$self.details),
            "packages" => package_rows(&$self.packages),
            "refund_policy" => optional_text(&$self.refund_policy),
            "overtime_charge" => optional_text(&$self.overtime_charge),
            "faq" => $self.faq.clone(),
            _ => Value::Null,
        }
    };
}

impl Translatable for Service {
    fn source_type(&self) -> SourceType {
        SourceType::Service
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        offering_field_value!(self, name)
    }
}

impl Translatable for ServiceOption {
    fn source_type(&self) -> SourceType {
        SourceType::ServiceOption
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        offering_field_value!(self, name)
    }
}

impl Translatable for CollageText {
    fn source_type(&self) -> SourceType {
        SourceType::CollageText
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "caption" => text(&self.caption),
            _ => Value::Null,
        }
    }
}

impl Translatable for GalleryGroup {
    fn source_type(&self) -> SourceType {
        SourceType::GalleryGroup
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "title" => text(&self.title),
            _ => Value::Null,
        }
    }
}

impl Translatable for TermsOfService {
    fn source_type(&self) -> SourceType {
        SourceType::TermsOfService
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "content" => text(&self.content),
            _ => Value::Null,
        }
    }
}

impl Translatable for PrivacyPolicy {
    fn source_type(&self) -> SourceType {
        SourceType::PrivacyPolicy
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field_value(&self, name: &str) -> Value {
        match name {
            "content" => text(&self.content),
            _ => Value::Null,
        }
    }
}

/// Any translatable entity, chosen by source type at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEntity {
    Service(Service),
    ServiceOption(ServiceOption),
    CollageText(CollageText),
    GalleryGroup(GalleryGroup),
    TermsOfService(TermsOfService),
    PrivacyPolicy(PrivacyPolicy),
}

impl AnyEntity {
    /// Decode a JSON object as the entity kind named by `source_type`.
    pub fn from_json(source_type: SourceType, value: Value) -> Result<Self> {
        Ok(match source_type {
            SourceType::Service => AnyEntity::Service(serde_json::from_value(value)?),
            SourceType::ServiceOption => AnyEntity::ServiceOption(serde_json::from_value(value)?),
            SourceType::CollageText => AnyEntity::CollageText(serde_json::from_value(value)?),
            SourceType::GalleryGroup => AnyEntity::GalleryGroup(serde_json::from_value(value)?),
            SourceType::TermsOfService => {
                AnyEntity::TermsOfService(serde_json::from_value(value)?)
            }
            SourceType::PrivacyPolicy => AnyEntity::PrivacyPolicy(serde_json::from_value(value)?),
        })
    }

    fn inner(&self) -> &dyn Translatable {
        match self {
            AnyEntity::Service(e) => e,
            AnyEntity::ServiceOption(e) => e,
            AnyEntity::CollageText(e) => e,
            AnyEntity::GalleryGroup(e) => e,
            AnyEntity::TermsOfService(e) => e,
            AnyEntity::PrivacyPolicy(e) => e,
        }
    }
}

impl Translatable for AnyEntity {
    fn source_type(&self) -> SourceType {
        self.inner().source_type()
    }

    fn id(&self) -> i64 {
        self.inner().id()
    }

    fn field_value(&self, name: &str) -> Value {
        self.inner().field_value(name)
    }
}
