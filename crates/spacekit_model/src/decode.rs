//! Building resources from API JSON items.

use crate::error::{ModelError, ModelResult};
use crate::locale::LocalizationContext;
use crate::localization::LocalizedFields;
use crate::resource::{Asset, DeletedResource, Entry, Resource, ResourceType, Sys};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// A `{"sys": {"id": ..}}` reference inside `sys`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLink {
    /// The referenced resource's metadata.
    pub sys: RawLinkSys,
}

/// Metadata of a [`RawLink`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawLinkSys {
    /// The referenced id.
    pub id: String,
}

/// The `sys` object of an item as sent by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSys {
    /// Resource id.
    pub id: String,
    /// Resource type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Owning space.
    #[serde(default)]
    pub space: Option<RawLink>,
    /// Owning environment.
    #[serde(default)]
    pub environment: Option<RawLink>,
    /// Content type of an entry.
    #[serde(default)]
    pub content_type: Option<RawLink>,
    /// Published revision.
    #[serde(default)]
    pub revision: Option<u64>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Deletion time.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Locale the item was requested in.
    #[serde(default)]
    pub locale: Option<String>,
}

/// One item of a response page before resource construction.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    /// System metadata.
    pub sys: RawSys,
    /// Field payload. Absent on deletion markers.
    #[serde(default)]
    pub fields: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RawItem {
    /// Decodes an item from JSON.
    pub fn from_json(value: &serde_json::Value) -> ModelResult<Self> {
        RawItem::deserialize(value).map_err(|e| ModelError::invalid_resource(e.to_string()))
    }

    /// The item's resource type.
    pub fn resource_type(&self) -> ModelResult<ResourceType> {
        self.sys.type_name.parse()
    }
}

fn sys_from_raw(raw: RawSys, resource_type: ResourceType) -> Sys {
    Sys {
        id: raw.id,
        resource_type,
        space_id: raw.space.map(|link| link.sys.id),
        environment_id: raw.environment.map(|link| link.sys.id),
        content_type_id: raw.content_type.map(|link| link.sys.id),
        revision: raw.revision,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        deleted_at: raw.deleted_at,
        locale: raw.locale,
    }
}

/// Normalizes a `fields` object into per-locale storage.
///
/// With `single_locale` set, the payload is `name -> value` (a response for
/// one locale) and every value is stored under that code. Otherwise the
/// payload must already be `name -> {locale -> value}`.
pub fn normalize_fields(
    id: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
    single_locale: Option<&str>,
) -> ModelResult<LocalizedFields> {
    let mut normalized = LocalizedFields::new();

    for (name, value) in fields {
        let by_locale = match single_locale {
            Some(code) => [(code.to_string(), FieldValue::from_json(value))]
                .into_iter()
                .collect(),
            None => value
                .as_object()
                .ok_or_else(|| {
                    ModelError::invalid_fields(id, format!("field {name} is not keyed by locale"))
                })?
                .iter()
                .map(|(code, v)| (code.clone(), FieldValue::from_json(v)))
                .collect(),
        };
        normalized.insert(name.clone(), by_locale);
    }

    Ok(normalized)
}

impl Resource {
    /// Builds a resource from one JSON item.
    pub fn from_json(
        value: &serde_json::Value,
        context: &Arc<LocalizationContext>,
    ) -> ModelResult<Self> {
        Self::from_raw(RawItem::from_json(value)?, context)
    }

    /// Builds a resource from a decoded item.
    ///
    /// Items that carry `sys.locale` were fetched for a single locale; their
    /// fields are stored under the locale the resource starts out with.
    pub fn from_raw(raw: RawItem, context: &Arc<LocalizationContext>) -> ModelResult<Self> {
        let resource_type = raw.resource_type()?;
        let RawItem { sys, fields } = raw;
        let sys = sys_from_raw(sys, resource_type);

        if resource_type.is_deletion() {
            let marker = DeletedResource::new(sys);
            return Ok(match resource_type {
                ResourceType::DeletedEntry => Resource::DeletedEntry(marker),
                _ => Resource::DeletedAsset(marker),
            });
        }

        let single_locale = sys.locale.as_deref().map(|code| {
            if context.contains(code) {
                code.to_string()
            } else {
                context.default_locale().code.clone()
            }
        });
        let localized = match &fields {
            Some(fields) => normalize_fields(&sys.id, fields, single_locale.as_deref())?,
            None => LocalizedFields::new(),
        };

        Ok(match resource_type {
            ResourceType::Entry => Resource::Entry(Entry::new(sys, localized, Arc::clone(context))),
            _ => Resource::Asset(Asset::new(sys, localized, Arc::clone(context))),
        })
    }
}
