//! Entries, assets and deletion markers.

use crate::error::ModelError;
use crate::locale::{Locale, LocalizationContext};
use crate::localization::{resolve, resolve_field, Fields, LocalizedFields};
use crate::value::{FieldValue, Link};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The kind of item the service returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// An entry with typed fields.
    Entry,
    /// A media asset.
    Asset,
    /// Marker for a deleted entry.
    DeletedEntry,
    /// Marker for a deleted asset.
    DeletedAsset,
}

impl ResourceType {
    /// Returns the name the service uses for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Entry => "Entry",
            ResourceType::Asset => "Asset",
            ResourceType::DeletedEntry => "DeletedEntry",
            ResourceType::DeletedAsset => "DeletedAsset",
        }
    }

    /// Returns true for deletion markers.
    pub fn is_deletion(&self) -> bool {
        matches!(self, ResourceType::DeletedEntry | ResourceType::DeletedAsset)
    }
}

impl FromStr for ResourceType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Entry" => Ok(ResourceType::Entry),
            "Asset" => Ok(ResourceType::Asset),
            "DeletedEntry" => Ok(ResourceType::DeletedEntry),
            "DeletedAsset" => Ok(ResourceType::DeletedAsset),
            other => Err(ModelError::unsupported_type(other)),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System metadata shared by every resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Sys {
    /// Resource id, unique within its type in a space.
    pub id: String,
    /// Resource type.
    pub resource_type: ResourceType,
    /// Owning space.
    pub space_id: Option<String>,
    /// Owning environment.
    pub environment_id: Option<String>,
    /// Content type, for entries.
    pub content_type_id: Option<String>,
    /// Published revision.
    pub revision: Option<u64>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Deletion time, for deletion markers.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Locale the response was requested in. Absent in sync responses.
    pub locale: Option<String>,
}

impl Sys {
    /// Creates metadata with only an id and type set.
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
            space_id: None,
            environment_id: None,
            content_type_id: None,
            revision: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
            locale: None,
        }
    }
}

/// Per-locale fields together with the context they resolve against.
///
/// Immutable after construction and shared between clones of a resource.
#[derive(Debug)]
pub struct LocalizedContent {
    fields: LocalizedFields,
    context: Arc<LocalizationContext>,
}

impl LocalizedContent {
    /// Wraps raw per-locale fields.
    pub fn new(fields: LocalizedFields, context: Arc<LocalizationContext>) -> Self {
        Self { fields, context }
    }

    /// Raw per-locale fields.
    pub fn fields(&self) -> &LocalizedFields {
        &self.fields
    }

    /// The space's localization context.
    pub fn context(&self) -> &Arc<LocalizationContext> {
        &self.context
    }
}

/// The locale currently selected on one resource value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCursor {
    selected: Locale,
}

impl LocaleCursor {
    pub(crate) fn new(selected: Locale) -> Self {
        Self { selected }
    }

    /// The selected locale.
    pub fn locale(&self) -> &Locale {
        &self.selected
    }

    pub(crate) fn select(&mut self, locale: Locale) {
        self.selected = locale;
    }
}

/// Resources whose fields are stored per locale.
///
/// Implemented by [`Entry`] and [`Asset`]. Everything but the two accessors
/// is provided on top of the fallback resolver.
pub trait Localizable {
    /// The shared per-locale content.
    fn content(&self) -> &LocalizedContent;

    /// The locale selection of this value.
    fn cursor(&self) -> &LocaleCursor;

    /// Mutable access to the locale selection.
    fn cursor_mut(&mut self) -> &mut LocaleCursor;

    /// The locale fields currently resolve against.
    fn selected_locale(&self) -> &Locale {
        self.cursor().locale()
    }

    /// Selects the locale with `code`.
    ///
    /// Returns false and leaves the selection unchanged if the space has no
    /// such locale.
    fn set_locale(&mut self, code: &str) -> bool {
        let Some(locale) = self.content().context().locale(code).cloned() else {
            return false;
        };
        self.cursor_mut().select(locale);
        true
    }

    /// Effective fields for the selected locale.
    fn fields(&self) -> Fields {
        let content = self.content();
        resolve(content.fields(), self.selected_locale(), content.context())
    }

    /// Effective value of one field for the selected locale.
    fn field(&self, name: &str) -> Option<&FieldValue> {
        let content = self.content();
        let by_locale = content.fields().get(name)?;
        resolve_field(by_locale, self.selected_locale(), content.context())
    }

    /// Returns true if the resource stores `name` at any locale.
    fn has_field(&self, name: &str) -> bool {
        self.content().fields().contains_key(name)
    }

    /// Text value of a field.
    fn string_at(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_text()
    }

    /// List-of-text value of a field.
    fn strings_at(&self, name: &str) -> Option<Vec<&str>> {
        self.field(name)?.as_text_array()
    }

    /// Integer value of a field.
    fn int_at(&self, name: &str) -> Option<i64> {
        self.field(name)?.as_integer()
    }

    /// Link value of a field.
    fn link_at(&self, name: &str) -> Option<&Link> {
        self.field(name)?.as_link()
    }
}

fn initial_cursor(sys: &Sys, context: &LocalizationContext) -> LocaleCursor {
    let locale = sys
        .locale
        .as_deref()
        .and_then(|code| context.locale(code))
        .unwrap_or_else(|| context.default_locale());
    LocaleCursor::new(locale.clone())
}

/// An entry.
#[derive(Debug, Clone)]
pub struct Entry {
    sys: Sys,
    content: Arc<LocalizedContent>,
    cursor: LocaleCursor,
}

impl Entry {
    /// Builds an entry.
    ///
    /// The initial locale is `sys.locale` when the context knows it, the
    /// default locale otherwise.
    pub fn new(sys: Sys, fields: LocalizedFields, context: Arc<LocalizationContext>) -> Self {
        let cursor = initial_cursor(&sys, &context);
        Self {
            sys,
            content: Arc::new(LocalizedContent::new(fields, context)),
            cursor,
        }
    }

    /// Entry id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// System metadata.
    pub fn sys(&self) -> &Sys {
        &self.sys
    }

    /// Id of the entry's content type.
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type_id.as_deref()
    }
}

impl Localizable for Entry {
    fn content(&self) -> &LocalizedContent {
        &self.content
    }

    fn cursor(&self) -> &LocaleCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut LocaleCursor {
        &mut self.cursor
    }
}

/// A media asset.
#[derive(Debug, Clone)]
pub struct Asset {
    sys: Sys,
    content: Arc<LocalizedContent>,
    cursor: LocaleCursor,
}

impl Asset {
    /// Builds an asset. Locale selection follows [`Entry::new`].
    pub fn new(sys: Sys, fields: LocalizedFields, context: Arc<LocalizationContext>) -> Self {
        let cursor = initial_cursor(&sys, &context);
        Self {
            sys,
            content: Arc::new(LocalizedContent::new(fields, context)),
            cursor,
        }
    }

    /// Asset id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// System metadata.
    pub fn sys(&self) -> &Sys {
        &self.sys
    }

    /// Title for the selected locale.
    pub fn title(&self) -> Option<&str> {
        self.string_at("title")
    }

    /// The stored `file.url` for the selected locale, as returned by the service.
    pub fn file_url(&self) -> Option<&str> {
        self.field("file")?.get("url")?.as_text()
    }

    /// The stored `file.contentType` for the selected locale.
    pub fn mime_type(&self) -> Option<&str> {
        self.field("file")?.get("contentType")?.as_text()
    }
}

impl Localizable for Asset {
    fn content(&self) -> &LocalizedContent {
        &self.content
    }

    fn cursor(&self) -> &LocaleCursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut LocaleCursor {
        &mut self.cursor
    }
}

/// A deletion marker reported by sync.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedResource {
    sys: Sys,
}

impl DeletedResource {
    /// Wraps deletion metadata.
    pub fn new(sys: Sys) -> Self {
        Self { sys }
    }

    /// Id of the deleted resource.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// System metadata.
    pub fn sys(&self) -> &Sys {
        &self.sys
    }
}

/// Any item a response page may carry.
#[derive(Debug, Clone)]
pub enum Resource {
    /// An entry.
    Entry(Entry),
    /// An asset.
    Asset(Asset),
    /// A deleted entry.
    DeletedEntry(DeletedResource),
    /// A deleted asset.
    DeletedAsset(DeletedResource),
}

impl Resource {
    /// Id of the resource.
    pub fn id(&self) -> &str {
        &self.sys().id
    }

    /// System metadata.
    pub fn sys(&self) -> &Sys {
        match self {
            Resource::Entry(entry) => entry.sys(),
            Resource::Asset(asset) => asset.sys(),
            Resource::DeletedEntry(marker) | Resource::DeletedAsset(marker) => marker.sys(),
        }
    }

    /// Resource type.
    pub fn resource_type(&self) -> ResourceType {
        self.sys().resource_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Arc<LocalizationContext> {
        Arc::new(
            LocalizationContext::new(vec![
                Locale::new("en-US").as_default(),
                Locale::new("de-DE").with_fallback("en-US"),
            ])
            .unwrap(),
        )
    }

    fn cat() -> Entry {
        let mut fields = LocalizedFields::new();
        fields.entry("name".into()).or_default().extend([
            ("en-US".to_string(), FieldValue::from("Nyan Cat")),
            ("de-DE".to_string(), FieldValue::from("Nyan Katze")),
        ]);
        fields
            .entry("lives".into())
            .or_default()
            .insert("en-US".into(), FieldValue::from(9));
        fields
            .entry("likes".into())
            .or_default()
            .insert("en-US".into(), FieldValue::from(vec!["rainbows", "fish"]));
        Entry::new(Sys::new("nyancat", ResourceType::Entry), fields, context())
    }

    #[test]
    fn starts_at_default_locale() {
        let entry = cat();
        assert_eq!(entry.selected_locale().code, "en-US");
        assert_eq!(entry.string_at("name"), Some("Nyan Cat"));
    }

    #[test]
    fn starts_at_api_locale_when_known() {
        let mut sys = Sys::new("nyancat", ResourceType::Entry);
        sys.locale = Some("de-DE".into());
        let entry = Entry::new(sys, LocalizedFields::new(), context());
        assert_eq!(entry.selected_locale().code, "de-DE");
    }

    #[test]
    fn set_locale_switches_resolution() {
        let mut entry = cat();
        assert!(entry.set_locale("de-DE"));
        assert_eq!(entry.string_at("name"), Some("Nyan Katze"));
        // Falls back for fields without a German value.
        assert_eq!(entry.int_at("lives"), Some(9));
        assert_eq!(entry.strings_at("likes"), Some(vec!["rainbows", "fish"]));
    }

    #[test]
    fn unknown_locale_leaves_selection() {
        let mut entry = cat();
        assert!(!entry.set_locale("fr-FR"));
        assert_eq!(entry.selected_locale().code, "en-US");
    }

    #[test]
    fn clones_have_independent_cursors() {
        let original = cat();
        let mut copy = original.clone();
        copy.set_locale("de-DE");
        assert_eq!(original.string_at("name"), Some("Nyan Cat"));
        assert_eq!(copy.string_at("name"), Some("Nyan Katze"));
    }

    #[test]
    fn has_field_probes_storage() {
        let entry = cat();
        assert!(entry.has_field("lives"));
        assert!(!entry.has_field("color"));
        assert!(entry.field("color").is_none());
    }

    #[test]
    fn resource_type_parsing() {
        assert_eq!("Asset".parse::<ResourceType>().unwrap(), ResourceType::Asset);
        assert!("DeletedEntry".parse::<ResourceType>().unwrap().is_deletion());
        assert!(matches!(
            "ContentType".parse::<ResourceType>(),
            Err(ModelError::UnsupportedType { .. })
        ));
    }
}
