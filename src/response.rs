use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block on list responses. Single-resource responses carry
/// `empty()` so clients can always deserialize the same shape.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope for every endpoint, success and failure alike. Guest devices
/// render `message` directly, so error responses go through `failure`
/// rather than a separate shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn failure(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: Some(Meta::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_keeps_message_and_payload() {
        let response = ApiResponse::failure("No open bill for this table", serde_json::json!({}));
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body["message"], "No open bill for this table");
        assert!(body["data"].is_object());
        assert!(body["meta"]["page"].is_null());
    }
}
