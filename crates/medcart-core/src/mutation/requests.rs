// ── Storefront write requests ──
//
// Constructors for every write the storefront performs. Each one names the
// cache keys the write makes stale; the coordinator revalidates exactly
// those and nothing else.

use serde::Serialize;
use serde_json::{Value, json};

use medcart_api::Method;

use super::MutationRequest;
use crate::endpoints;
use crate::error::CoreError;
use crate::form::{
    AddressInput, CategoryInput, DoctorRegisterInput, LoginInput, PharmacyInput, ProductInput,
    RegisterInput,
};
use crate::model::{OrderStatus, Role};

fn encode<B: Serialize>(body: &B) -> Result<Value, CoreError> {
    serde_json::to_value(body).map_err(|e| CoreError::Decode {
        what: "request body".into(),
        message: e.to_string(),
    })
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Login endpoint for a role. Pharmacy admins share the admin endpoint.
pub fn login_path(role: Role) -> &'static str {
    match role {
        Role::User => "/v1/auth/login",
        Role::Doctor => "/v1/auth/doctors/login",
        Role::PharmacyAdmin | Role::Admin => "/v1/auth/admin/login",
    }
}

pub fn login(role: Role, input: &LoginInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, login_path(role))
        .with_body(encode(input)?)
        .affects([endpoints::me()]))
}

pub fn register_user(input: &RegisterInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, "/v1/auth/register").with_body(encode(input)?))
}

pub fn register_doctor(input: &DoctorRegisterInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, "/v1/auth/doctors/register").with_body(encode(input)?))
}

// ── Categories ───────────────────────────────────────────────────────

pub fn create_category(input: &CategoryInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, endpoints::categories().as_str())
        .with_body(encode(input)?)
        .affects([endpoints::categories()]))
}

pub fn update_category(id: u64, input: &CategoryInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::PUT, endpoints::category(id).as_str())
        .with_body(encode(input)?)
        .affects([endpoints::categories(), endpoints::category(id)]))
}

pub fn delete_category(id: u64) -> MutationRequest {
    MutationRequest::new(Method::DELETE, endpoints::category(id).as_str())
        .affects([endpoints::categories(), endpoints::category(id)])
}

// ── Products ─────────────────────────────────────────────────────────

pub fn create_product(input: &ProductInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, "/v1/products")
        .with_body(encode(input)?)
        .affects([
            endpoints::products(1),
            endpoints::products_in_category(input.category_id, 1),
        ]))
}

pub fn update_product(id: u64, input: &ProductInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::PUT, endpoints::product(id).as_str())
        .with_body(encode(input)?)
        .affects([
            endpoints::product(id),
            endpoints::products(1),
            endpoints::products_in_category(input.category_id, 1),
        ]))
}

pub fn delete_product(id: u64) -> MutationRequest {
    MutationRequest::new(Method::DELETE, endpoints::product(id).as_str())
        .affects([endpoints::product(id), endpoints::products(1)])
}

// ── Pharmacies ───────────────────────────────────────────────────────

pub fn create_pharmacy(input: &PharmacyInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, "/v1/pharmacies")
        .with_body(encode(input)?)
        .affects([endpoints::pharmacies(1)]))
}

pub fn update_pharmacy(id: u64, input: &PharmacyInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::PUT, endpoints::pharmacy(id).as_str())
        .with_body(encode(input)?)
        .affects([endpoints::pharmacies(1), endpoints::pharmacy(id)]))
}

pub fn delete_pharmacy(id: u64) -> MutationRequest {
    MutationRequest::new(Method::DELETE, endpoints::pharmacy(id).as_str())
        .affects([endpoints::pharmacies(1), endpoints::pharmacy(id)])
}

// ── Orders and cart ──────────────────────────────────────────────────

/// Move an order to `status`. Refreshes the order, the unfiltered list,
/// and the list filtered on the new status.
pub fn update_order_status(id: u64, status: OrderStatus) -> MutationRequest {
    MutationRequest::new(Method::PATCH, endpoints::order(id).as_str())
        .with_body(json!({ "status": status }))
        .affects([
            endpoints::order(id),
            endpoints::orders(None, 1),
            endpoints::orders(Some(status), 1),
        ])
}

pub fn add_to_cart(product_id: u64, quantity: u32) -> MutationRequest {
    MutationRequest::new(Method::POST, endpoints::cart().as_str())
        .with_body(json!({ "product_id": product_id, "quantity": quantity }))
        .affects([endpoints::cart()])
}

pub fn remove_from_cart(product_id: u64) -> MutationRequest {
    MutationRequest::new(Method::DELETE, &format!("/v1/cart/{product_id}"))
        .affects([endpoints::cart()])
}

pub fn add_address(input: &AddressInput) -> Result<MutationRequest, CoreError> {
    Ok(MutationRequest::new(Method::POST, endpoints::addresses().as_str())
        .with_body(encode(input)?)
        .affects([endpoints::addresses()]))
}

// ── Consultations ────────────────────────────────────────────────────

pub fn send_message(room_id: u64, message: &str) -> MutationRequest {
    let key = endpoints::consultation_messages(room_id);
    MutationRequest::new(Method::POST, key.as_str())
        .with_body(json!({ "message": message }))
        .affects([key])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn order_status_change_invalidates_both_lists() {
        let req = update_order_status(9, OrderStatus::Shipped);
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.path, "/v1/orders/9");
        assert_eq!(req.body, Some(json!({"status": "shipped"})));
        let affected: Vec<_> = req.affected.iter().map(ToString::to_string).collect();
        assert_eq!(
            affected,
            ["/v1/orders/9", "/v1/orders?page=1", "/v1/orders?page=1&status=shipped"]
        );
    }

    #[test]
    fn doctor_login_targets_doctor_endpoint() {
        let input = LoginInput {
            email: "dr.andi@medcart.id".into(),
            password: "rahasia123".into(),
        };
        let req = login(Role::Doctor, &input).unwrap();
        assert_eq!(req.path, "/v1/auth/doctors/login");
        assert_eq!(req.affected, vec![endpoints::me()]);
    }
}
