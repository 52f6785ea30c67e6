//! Request boundary
//!
//! Typed request/response shapes for the HTTP surface, without the framework
//! plumbing: a router maps bodies onto these structs and copies the status
//! and body back out. Statuses follow the storefront contract: adds answer
//! 201/400, reads 200, updates 200/500, clears 204, validation 200/400/503.
use crate::cart::{CartRecord, CartService};
use crate::error::CartError;
use crate::validation::{Resource, ValidationService};

#[derive(Debug, Clone)]
pub struct CartItemRequest {
    pub slug: String,
    pub quantity: u64,
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone)]
pub struct AddCartRequest {
    pub cid: Option<String>,
    pub item: CartItemRequest,
}

#[derive(Debug, Clone)]
pub struct CartDeltaRequest {
    pub slug: String,
    pub quantity_delta: i64,
}

/// Body of `PATCH /api/cart/{id}`.
#[derive(Debug, Clone)]
pub struct UpdateCartRequest {
    pub item: CartDeltaRequest,
}

/// Body of `POST /api/validation`.
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub resource: Resource,
    pub value: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ApiBody {
    CartId { id: String },
    Items { items: Option<CartRecord> },
    Error { error: String },
    Success,
    Empty,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ApiBody,
}

impl ApiResponse {
    fn error(status: u16, err: &CartError) -> Self {
        Self {
            status,
            body: ApiBody::Error {
                error: err.to_string(),
            },
        }
    }
}

pub struct StorefrontApi {
    cart: CartService,
    validation: ValidationService,
}

impl StorefrontApi {
    pub fn new(cart: CartService, validation: ValidationService) -> Self {
        Self { cart, validation }
    }

    /// `POST /api/cart`
    pub fn add_to_cart(&self, request: &AddCartRequest) -> ApiResponse {
        match self
            .cart
            .add(request.cid.as_deref(), &request.item.slug, request.item.quantity)
        {
            Ok(id) => ApiResponse {
                status: 201,
                body: ApiBody::CartId { id },
            },
            Err(err @ CartError::ServiceUnavailable(_)) => ApiResponse::error(503, &err),
            Err(err) => ApiResponse::error(400, &err),
        }
    }

    /// `GET /api/cart/{id}`
    pub fn get_cart(&self, id: &str) -> ApiResponse {
        match self.cart.get_all(id) {
            Ok(items) => ApiResponse {
                status: 200,
                body: ApiBody::Items { items },
            },
            Err(err) => ApiResponse::error(503, &err),
        }
    }

    /// `PATCH /api/cart/{id}`
    pub fn update_cart(&self, id: &str, request: &UpdateCartRequest) -> ApiResponse {
        match self
            .cart
            .update(id, &request.item.slug, request.item.quantity_delta)
        {
            Ok(()) => ApiResponse {
                status: 200,
                body: ApiBody::Empty,
            },
            Err(err @ CartError::ServiceUnavailable(_)) => ApiResponse::error(503, &err),
            Err(err) => ApiResponse::error(500, &err),
        }
    }

    /// `DELETE /api/cart/{id}`
    pub fn clear_cart(&self, id: &str) -> ApiResponse {
        match self.cart.clear(id) {
            Ok(()) => ApiResponse {
                status: 204,
                body: ApiBody::Empty,
            },
            Err(err) => ApiResponse::error(503, &err),
        }
    }

    /// `POST /api/validation`
    pub fn validate(&self, request: &ValidateRequest) -> ApiResponse {
        if request.value.is_empty() {
            return ApiResponse {
                status: 400,
                body: ApiBody::Error {
                    error: "Must provide a resource to validate".into(),
                },
            };
        }

        match self.validation.validate(&request.resource, &request.value) {
            Ok(()) => ApiResponse {
                status: 200,
                body: ApiBody::Success,
            },
            Err(err @ CartError::ServiceUnavailable(_)) => ApiResponse::error(503, &err),
            Err(err) => ApiResponse::error(400, &err),
        }
    }
}
