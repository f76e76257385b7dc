//! Pagination query handling and response envelopes

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Common listing query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<Order>,
    /// Active-status filter, decoded by [`flag`]
    pub active: Option<String>,
    /// Soft-deleted filter, decoded by [`flag`]
    pub deleted: Option<String>,
    /// Comma-separated role id filter (admin listing only)
    pub roles: Option<String>,
}

impl PageQuery {
    /// Requested page, 1-based
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Requested page size, clamped to 1..=200
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 200)
    }

    /// Row offset for the requested page
    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.limit()
    }

    pub fn order(&self) -> Order {
        self.order.unwrap_or_default()
    }

    /// LIKE pattern for the search term (matches everything when absent)
    pub fn search_pattern(&self) -> String {
        format!("%{}%", self.search.as_deref().unwrap_or(""))
    }

    /// Decoded `active` flag
    pub fn active_flag(&self) -> ApiResult<Option<bool>> {
        flag("active", self.active.as_deref())
    }

    /// Decoded `deleted` flag
    pub fn deleted_flag(&self) -> ApiResult<Option<bool>> {
        flag("deleted", self.deleted.as_deref())
    }

    /// Decoded role id filter
    pub fn role_filter(&self) -> ApiResult<Option<Vec<uuid::Uuid>>> {
        let Some(raw) = self.roles.as_deref() else {
            return Ok(None);
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        let ids = raw
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<uuid::Uuid>()
                    .map_err(|_| ApiError::Validation(format!("Invalid role id: {}", part.trim())))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(Some(ids))
    }

    /// Resolve the requested sort key against an explicit allow-list of
    /// (query key, column) pairs. Unknown keys are rejected rather than
    /// passed through to the query builder.
    pub fn sort_column(
        &self,
        allowed: &[(&str, &'static str)],
        default: &'static str,
    ) -> ApiResult<&'static str> {
        match self.sort.as_deref() {
            None | Some("") => Ok(default),
            Some(key) => allowed
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, col)| *col)
                .ok_or_else(|| ApiError::Validation(format!("Unknown sort key: {}", key))),
        }
    }
}

/// Decode a boolean query-string flag.
///
/// Truthy: `true`, `1`, `yes`, `on`. Falsy: `false`, `0`, `no`, `off`.
/// Case-insensitive. An absent or empty value means "no filter"; anything
/// else is a validation error.
pub fn flag(name: &str, value: Option<&str>) -> ApiResult<Option<bool>> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        other => Err(ApiError::Validation(format!(
            "Invalid value for {}: {}",
            name, other
        ))),
    }
}

/// Pagination metadata attached to every listing response
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub page_count: u32,
}

impl PageMeta {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        let page_count = ((total.max(0) as u32) + limit - 1) / limit;

        PageMeta {
            page: query.page(),
            limit,
            total,
            page_count,
        }
    }
}

/// Paginated listing response envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Page {
            items,
            meta: PageMeta::new(query, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.order(), Order::Asc);
    }

    #[test]
    fn test_limit_is_clamped() {
        let query = PageQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(query.limit(), 200);

        let query = PageQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.limit(), 1);
    }

    #[test]
    fn test_offset() {
        let query = PageQuery {
            page: Some(3),
            limit: Some(25),
            ..Default::default()
        };
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn test_flag_truthy_and_falsy() {
        assert_eq!(flag("active", Some("true")).unwrap(), Some(true));
        assert_eq!(flag("active", Some("1")).unwrap(), Some(true));
        assert_eq!(flag("active", Some("YES")).unwrap(), Some(true));
        assert_eq!(flag("active", Some("false")).unwrap(), Some(false));
        assert_eq!(flag("active", Some("off")).unwrap(), Some(false));
        assert_eq!(flag("active", None).unwrap(), None);
        assert_eq!(flag("active", Some("")).unwrap(), None);
    }

    #[test]
    fn test_flag_rejects_unknown_values() {
        assert!(flag("active", Some("maybe")).is_err());
    }

    #[test]
    fn test_sort_column_allow_list() {
        let allowed = [("username", "username"), ("created", "created_at")];

        let query = PageQuery {
            sort: Some("created".to_string()),
            ..Default::default()
        };
        assert_eq!(query.sort_column(&allowed, "id").unwrap(), "created_at");

        let query = PageQuery::default();
        assert_eq!(query.sort_column(&allowed, "id").unwrap(), "id");

        let query = PageQuery {
            sort: Some("password_hash".to_string()),
            ..Default::default()
        };
        assert!(query.sort_column(&allowed, "id").is_err());
    }

    #[test]
    fn test_role_filter() {
        let id = uuid::Uuid::new_v4();
        let query = PageQuery {
            roles: Some(format!("{}", id)),
            ..Default::default()
        };
        assert_eq!(query.role_filter().unwrap(), Some(vec![id]));

        let query = PageQuery {
            roles: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(query.role_filter().is_err());

        assert_eq!(PageQuery::default().role_filter().unwrap(), None);
    }

    #[test]
    fn test_page_meta() {
        let query = PageQuery {
            limit: Some(10),
            ..Default::default()
        };
        let meta = PageMeta::new(&query, 41);
        assert_eq!(meta.page_count, 5);
        assert_eq!(meta.total, 41);

        let meta = PageMeta::new(&query, 0);
        assert_eq!(meta.page_count, 0);
    }
}
