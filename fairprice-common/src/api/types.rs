//! Response envelope and pagination parameters

use serde::Serialize;

use crate::validation::FieldErrors;

/// Default page number
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size
pub const DEFAULT_LIMIT: i64 = 10;
/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Envelope shared by every response
///
/// `{success, data?, message?, errors?, pagination?}`; absent members are
/// omitted from the JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
            pagination: None,
        }
    }

    /// Failure envelope
    pub fn failure(message: impl Into<String>, errors: Option<FieldErrors>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors,
            pagination: None,
        }
    }
}

/// Pagination block returned with list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Sanitised page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: i64,
    /// Page size in [1, MAX_LIMIT]
    pub limit: i64,
}

impl PageRequest {
    /// Row offset for LIMIT/OFFSET queries
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Pagination block for a result set of `total` rows
    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Parse raw `page`/`limit` query values
///
/// Missing, non-numeric or non-positive values fall back to the defaults;
/// a limit above [`MAX_LIMIT`] is clamped to it. Never fails.
///
/// # Examples
///
/// ```
/// use fairprice_common::api::validate_pagination;
///
/// let p = validate_pagination(Some("3"), Some("1000"));
/// assert_eq!((p.page, p.limit), (3, 100));
///
/// let p = validate_pagination(Some("zero"), None);
/// assert_eq!((p.page, p.limit), (1, 10));
/// ```
pub fn validate_pagination(page: Option<&str>, limit: Option<&str>) -> PageRequest {
    let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n >= 1);

    PageRequest {
        page: parse(page).unwrap_or(DEFAULT_PAGE),
        limit: parse(limit).map(|l| l.min(MAX_LIMIT)).unwrap_or(DEFAULT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(validate_pagination(None, None), PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn test_pagination_invalid_values_fall_back() {
        assert_eq!(validate_pagination(Some("0"), Some("-4")), PageRequest { page: 1, limit: 10 });
        assert_eq!(validate_pagination(Some("abc"), Some("1.5")), PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn test_pagination_limit_clamped() {
        assert_eq!(validate_pagination(Some("2"), Some("1000")).limit, MAX_LIMIT);
        assert_eq!(validate_pagination(Some("2"), Some("100")).limit, 100);
        assert_eq!(validate_pagination(Some("2"), Some("25")).limit, 25);
    }

    #[test]
    fn test_offset_and_meta() {
        let p = PageRequest { page: 3, limit: 10 };
        assert_eq!(p.offset(), 20);
        assert_eq!(p.meta(21), PaginationMeta { page: 3, limit: 10, total: 21, pages: 3 });
        assert_eq!(p.meta(0).pages, 0);
    }

    #[test]
    fn test_envelope_omits_absent_members() {
        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));

        let body = serde_json::to_value(ApiResponse::failure("Validation failed", Some(FieldErrors::from([(
            "price".to_string(),
            "Price must be a positive number".to_string(),
        )]))))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["price"], "Price must be a positive number");
        assert!(body.get("data").is_none());
    }
}
