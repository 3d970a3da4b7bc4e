use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows per page for every listing endpoint
pub const PER_PAGE: u32 = 20;

/// Raw paging/sorting query parameters. Values are parsed leniently:
/// an unreadable page number falls back to the first page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub sort_field: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageQuery {
    pub fn limit(&self) -> Limit {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Limit::new(page, PER_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub page: u32,
    pub per_page: u32,
}

impl Limit {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(value: Option<&str>, default: SortDirection) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => default,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Columns a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Address,
    Body,
    Quantity,
    Created,
    Modified,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "name" => Some(SortField::Name),
            "address" => Some(SortField::Address),
            "body" => Some(SortField::Body),
            "quantity" => Some(SortField::Quantity),
            "created" => Some(SortField::Created),
            "modified" => Some(SortField::Modified),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Address => "address",
            SortField::Body => "body",
            SortField::Quantity => "quantity",
            SortField::Created => "created",
            SortField::Modified => "modified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortBy {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid sort field: {0}")]
pub struct InvalidSortField(pub String);

/// The sort fields one resource accepts, and its default ordering.
#[derive(Debug)]
pub struct SortSpec {
    allowed: &'static [SortField],
    default: SortBy,
}

pub const LOCATION_SORT: SortSpec = SortSpec {
    allowed: &[SortField::Name, SortField::Address, SortField::Created, SortField::Modified],
    default: SortBy { field: SortField::Name, direction: SortDirection::Asc },
};

pub const CONTAINER_SORT: SortSpec = SortSpec {
    allowed: &[SortField::Name, SortField::Created, SortField::Modified],
    default: SortBy { field: SortField::Modified, direction: SortDirection::Desc },
};

pub const ITEM_SORT: SortSpec = SortSpec {
    allowed: &[SortField::Body, SortField::Quantity, SortField::Created, SortField::Modified],
    default: SortBy { field: SortField::Created, direction: SortDirection::Desc },
};

impl SortSpec {
    /// Unknown fields are an error.
    pub fn parse(&self, query: &PageQuery) -> Result<SortBy, InvalidSortField> {
        let field = match query.sort_field.as_deref().filter(|f| !f.trim().is_empty()) {
            None => self.default.field,
            Some(name) => SortField::parse(name)
                .filter(|f| self.allowed.contains(f))
                .ok_or_else(|| InvalidSortField(name.to_string()))?,
        };
        Ok(SortBy {
            field,
            direction: SortDirection::parse(query.sort_dir.as_deref(), self.default.direction),
        })
    }

    /// Unknown fields fall back to the default ordering.
    pub fn parse_or_default(&self, query: &PageQuery) -> SortBy {
        self.parse(query).unwrap_or(SortBy {
            field: self.default.field,
            direction: SortDirection::parse(query.sort_dir.as_deref(), self.default.direction),
        })
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, limit: Limit) -> Self {
        Self {
            data,
            total,
            page: limit.page,
            limit: limit.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, field: Option<&str>, dir: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            sort_field: field.map(String::from),
            sort_dir: dir.map(String::from),
        }
    }

    #[test]
    fn page_numbers_are_clamped() {
        assert_eq!(query(None, None, None).limit().offset(), 0);
        assert_eq!(query(Some("0"), None, None).limit().page, 1);
        assert_eq!(query(Some("junk"), None, None).limit().page, 1);
        assert_eq!(query(Some("3"), None, None).limit().offset(), 40);
    }

    #[test]
    fn strict_sort_rejects_unknown_field() {
        let err = LOCATION_SORT.parse(&query(None, Some("quantity"), None)).unwrap_err();
        assert_eq!(err, InvalidSortField("quantity".to_string()));
    }

    #[test]
    fn lenient_sort_falls_back() {
        let sort = CONTAINER_SORT.parse_or_default(&query(None, Some("nope"), Some("ASC")));
        assert_eq!(sort.field, SortField::Modified);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn known_field_and_direction() {
        let sort = ITEM_SORT.parse(&query(None, Some("quantity"), Some("asc"))).unwrap();
        assert_eq!(sort, SortBy { field: SortField::Quantity, direction: SortDirection::Asc });
    }
}
