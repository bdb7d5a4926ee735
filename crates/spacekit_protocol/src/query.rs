//! Query construction and validation for list requests.
//!
//! A [`Query`] accumulates filter, order and selection parameters. Every
//! call that could produce a query the service would refuse is checked
//! immediately and returns a [`QueryError`], so a query that exists is
//! always safe to send.

use crate::error::{QueryError, QueryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use spacekit_model::Location;
use std::collections::BTreeMap;
use std::fmt;

/// Largest page size the service accepts.
pub const MAX_LIMIT: u32 = 1000;

/// Caller selections allowed next to the implicit `sys`.
pub const MAX_SELECTIONS: usize = 99;

/// Shortest accepted full-text search term, in characters.
pub const MIN_SEARCH_LENGTH: usize = 2;

/// Segments a selected key path may have (`sys.contentType.sys` at most).
const MAX_SELECTION_SEGMENTS: usize = 3;

/// A filter operator and its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperation {
    /// Exact match.
    Equals(String),
    /// Anything but this value.
    DoesNotEqual(String),
    /// At least one of the values.
    Includes(Vec<String>),
    /// None of the values.
    Excludes(Vec<String>),
    /// All of the values (array fields).
    HasAll(Vec<String>),
    /// Field presence.
    Exists(bool),
    /// Full-text match on one field.
    Matches(String),
    /// Ordered by distance from a point.
    IsNear(Location),
    /// Inside a bounding area.
    IsWithin(Bounds),
    /// Strictly below.
    IsLessThan(String),
    /// Below or equal.
    IsLessThanOrEqualTo(String),
    /// Strictly above.
    IsGreaterThan(String),
    /// Above or equal.
    IsGreaterThanOrEqualTo(String),
}

impl QueryOperation {
    /// The suffix appended to the filtered key.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Equals(_) => "",
            Self::DoesNotEqual(_) => "[ne]",
            Self::Includes(_) => "[in]",
            Self::Excludes(_) => "[nin]",
            Self::HasAll(_) => "[all]",
            Self::Exists(_) => "[exists]",
            Self::Matches(_) => "[match]",
            Self::IsNear(_) => "[near]",
            Self::IsWithin(_) => "[within]",
            Self::IsLessThan(_) => "[lt]",
            Self::IsLessThanOrEqualTo(_) => "[lte]",
            Self::IsGreaterThan(_) => "[gt]",
            Self::IsGreaterThanOrEqualTo(_) => "[gte]",
        }
    }

    /// The operand as sent on the wire.
    pub fn value(&self) -> String {
        match self {
            Self::Equals(v)
            | Self::DoesNotEqual(v)
            | Self::Matches(v)
            | Self::IsLessThan(v)
            | Self::IsLessThanOrEqualTo(v)
            | Self::IsGreaterThan(v)
            | Self::IsGreaterThanOrEqualTo(v) => v.clone(),
            Self::Includes(values) | Self::Excludes(values) | Self::HasAll(values) => {
                values.join(",")
            }
            Self::Exists(flag) => flag.to_string(),
            Self::IsNear(location) => format!("{},{}", location.lat, location.lon),
            Self::IsWithin(bounds) => bounds.to_string(),
        }
    }

    /// Before the given instant.
    pub fn before(date: DateTime<Utc>) -> Self {
        Self::IsLessThan(format_date(date))
    }

    /// At or before the given instant.
    pub fn at_or_before(date: DateTime<Utc>) -> Self {
        Self::IsLessThanOrEqualTo(format_date(date))
    }

    /// After the given instant.
    pub fn after(date: DateTime<Utc>) -> Self {
        Self::IsGreaterThan(format_date(date))
    }

    /// At or after the given instant.
    pub fn at_or_after(date: DateTime<Utc>) -> Self {
        Self::IsGreaterThanOrEqualTo(format_date(date))
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Area for [`QueryOperation::IsWithin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Rectangle from its bottom-left and top-right corners.
    Box {
        /// Bottom-left corner.
        bottom_left: Location,
        /// Top-right corner.
        top_right: Location,
    },
    /// Circle around a center, radius in kilometers.
    Circle {
        /// Center point.
        center: Location,
        /// Radius in kilometers.
        radius: f64,
    },
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box {
                bottom_left,
                top_right,
            } => write!(
                f,
                "{},{},{},{}",
                bottom_left.lat, bottom_left.lon, top_right.lat, top_right.lon
            ),
            Self::Circle { center, radius } => {
                write!(f, "{},{},{}", center.lat, center.lon, radius)
            }
        }
    }
}

/// Asset mimetype families understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimetypeGroup {
    /// Any attachment.
    Attachment,
    /// Plain text.
    Plaintext,
    /// Images.
    Image,
    /// Audio.
    Audio,
    /// Video.
    Video,
    /// Rich text documents.
    RichText,
    /// Slide decks.
    Presentation,
    /// Spreadsheets.
    Spreadsheet,
    /// PDF documents.
    PdfDocument,
    /// Archives.
    Archive,
    /// Source code.
    Code,
    /// Markup.
    Markup,
}

impl MimetypeGroup {
    /// Wire name of the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Plaintext => "plaintext",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::RichText => "richtext",
            Self::Presentation => "presentation",
            Self::Spreadsheet => "spreadsheet",
            Self::PdfDocument => "pdfdocument",
            Self::Archive => "archive",
            Self::Code => "code",
            Self::Markup => "markup",
        }
    }
}

/// One key of the `order` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderParameter {
    /// Property path, `sys.` or `fields.` prefixed.
    pub property: String,
    /// Descending when set.
    pub reverse: bool,
}

impl OrderParameter {
    /// Ascending order on `property`.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reverse: false,
        }
    }

    /// Descending order on `property`.
    pub fn reversed(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reverse: true,
        }
    }

    fn validate(&self) -> QueryResult<()> {
        if self.property.starts_with("sys.") || self.property.starts_with("fields.") {
            Ok(())
        } else {
            Err(QueryError::InvalidOrderProperty {
                property: self.property.clone(),
            })
        }
    }

    fn wire(&self) -> String {
        if self.reverse {
            format!("-{}", self.property)
        } else {
            self.property.clone()
        }
    }
}

/// Conditions on the target of a link field.
///
/// Used with [`Query::where_linked`] to search entries by the content of
/// the entries they reference. Keys are relative to the linked entry
/// (`fields.name`, `sys.id`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery {
    conditions: Vec<(String, QueryOperation)>,
}

impl FilterQuery {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on the linked entry.
    pub fn filter(mut self, key: impl Into<String>, operation: QueryOperation) -> Self {
        self.conditions.push((key.into(), operation));
        self
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true when no condition was added.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// A validated list query.
///
/// ```
/// use spacekit_protocol::{OrderParameter, Query, QueryOperation};
///
/// let query = Query::of_content_type("cat")
///     .filter("fields.color", QueryOperation::DoesNotEqual("gray".into()))
///     .filter("fields.lives", QueryOperation::Equals("9".into()))
///     .order_by(OrderParameter::reversed("sys.createdAt"))
///     .unwrap()
///     .limit(10)
///     .unwrap();
///
/// let params = query.parameters();
/// assert_eq!(params["content_type"], "cat");
/// assert_eq!(params["fields.color[ne]"], "gray");
/// assert_eq!(params["order"], "-sys.createdAt");
/// assert_eq!(params["limit"], "10");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, String)>,
    content_type: Option<String>,
    mimetype_group: Option<MimetypeGroup>,
    selections: Vec<String>,
    order: Vec<OrderParameter>,
    limit: Option<u32>,
    skip: Option<u32>,
    search: Option<String>,
    locale: Option<String>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query restricted to one content type.
    pub fn of_content_type(content_type_id: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type_id.into()),
            ..Self::default()
        }
    }

    /// A query with a single filter.
    pub fn where_field(key: impl Into<String>, operation: QueryOperation) -> Self {
        Self::new().filter(key, operation)
    }

    /// A query selecting only the given key paths.
    pub fn selecting<I, S>(paths: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().select(paths)
    }

    /// A query ordered by one key.
    pub fn ordered_by(order: OrderParameter) -> QueryResult<Self> {
        Self::new().order_by(order)
    }

    /// Adds a filter. Filters combine with AND.
    ///
    /// The same key with another operator adds a second constraint; the
    /// same key with the same operator replaces the operand.
    pub fn filter(mut self, key: impl Into<String>, operation: QueryOperation) -> Self {
        let name = format!("{}{}", key.into(), operation.operator());
        self.set_filter(name, operation.value());
        self
    }

    fn set_filter(&mut self, name: String, value: String) {
        match self.filters.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.filters.push((name, value)),
        }
    }

    /// Restricts entries to a content type.
    pub fn content_type(mut self, content_type_id: impl Into<String>) -> QueryResult<Self> {
        if self.mimetype_group.is_some() {
            return Err(QueryError::MimetypeSpecifiedOnEntry);
        }
        self.content_type = Some(content_type_id.into());
        Ok(self)
    }

    /// Restricts assets to a mimetype family.
    pub fn mimetype_group(mut self, group: MimetypeGroup) -> QueryResult<Self> {
        if self.content_type.is_some() {
            return Err(QueryError::MimetypeSpecifiedOnEntry);
        }
        self.mimetype_group = Some(group);
        Ok(self)
    }

    /// Limits the returned key paths. `sys` is always included.
    pub fn select<I, S>(mut self, paths: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            let path = path.into();
            if path == "sys" || self.selections.contains(&path) {
                continue;
            }
            validate_selection(&path)?;
            self.selections.push(path);
        }

        if self.selections.len() > MAX_SELECTIONS {
            return Err(QueryError::MaxSelectionLimitExceeded {
                count: self.selections.len(),
            });
        }
        Ok(self)
    }

    /// Appends an order key. Keys apply left to right.
    pub fn order_by(mut self, order: OrderParameter) -> QueryResult<Self> {
        order.validate()?;
        self.order.push(order);
        Ok(self)
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> QueryResult<Self> {
        if limit > MAX_LIMIT {
            return Err(QueryError::MaximumLimitExceeded { limit });
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Skips the first `skip` results.
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Full-text search across all text fields.
    pub fn search(mut self, term: impl Into<String>) -> QueryResult<Self> {
        let term = term.into();
        if term.chars().count() < MIN_SEARCH_LENGTH {
            return Err(QueryError::TextSearchTooShort { term });
        }
        self.search = Some(term);
        Ok(self)
    }

    /// Requests content in one locale, or `*` for all.
    pub fn locale(mut self, code: impl Into<String>) -> Self {
        self.locale = Some(code.into());
        self
    }

    /// Filters on the entries a link field points to.
    ///
    /// `link_field` is the link field's name without prefix; the linked
    /// entries must be of `content_type_id`.
    pub fn where_linked(
        mut self,
        link_field: &str,
        content_type_id: impl Into<String>,
        filter: FilterQuery,
    ) -> Self {
        let base = format!("fields.{link_field}");
        self.set_filter(
            format!("{base}.sys.contentType.sys.id"),
            content_type_id.into(),
        );
        for (key, operation) in filter.conditions {
            self.set_filter(
                format!("{base}.{key}{}", operation.operator()),
                operation.value(),
            );
        }
        self
    }

    /// The content type restriction, if any.
    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The mimetype restriction, if any.
    pub fn selected_mimetype_group(&self) -> Option<MimetypeGroup> {
        self.mimetype_group
    }

    /// Caller selections, without the implicit `sys`.
    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    /// The wire parameters of this query.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = self.filters.iter().cloned().collect();

        if let Some(content_type) = &self.content_type {
            params.insert("content_type".into(), content_type.clone());
        }
        if let Some(group) = self.mimetype_group {
            params.insert("mimetype_group".into(), group.as_str().into());
        }
        if !self.selections.is_empty() {
            let mut select = String::from("sys");
            for path in &self.selections {
                select.push(',');
                select.push_str(path);
            }
            params.insert("select".into(), select);
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(OrderParameter::wire).collect();
            params.insert("order".into(), order.join(","));
        }
        if let Some(limit) = self.limit {
            params.insert("limit".into(), limit.to_string());
        }
        if let Some(skip) = self.skip {
            params.insert("skip".into(), skip.to_string());
        }
        if let Some(term) = &self.search {
            params.insert("query".into(), term.clone());
        }
        if let Some(locale) = &self.locale {
            params.insert("locale".into(), locale.clone());
        }

        params
    }
}

fn validate_selection(path: &str) -> QueryResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() > MAX_SELECTION_SEGMENTS || segments.iter().any(|s| s.is_empty()) {
        return Err(QueryError::InvalidSelection {
            path: path.to_string(),
        });
    }
    Ok(())
}
