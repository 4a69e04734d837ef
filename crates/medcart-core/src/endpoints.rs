// ── Storefront resource keys ──
//
// One builder per backend collection so call sites never hand-assemble
// paths. Mutations declare their affected keys with these same builders,
// which keeps read keys and invalidation keys byte-identical.

use crate::key::ResourceKey;
use crate::model::OrderStatus;

pub fn me() -> ResourceKey {
    ResourceKey::new("/v1/users/me")
}

pub fn users(page: u32) -> ResourceKey {
    ResourceKey::new("/v1/users").with_query("page", page)
}

pub fn doctors(page: u32) -> ResourceKey {
    ResourceKey::new("/v1/doctors").with_query("page", page)
}

pub fn products(page: u32) -> ResourceKey {
    ResourceKey::new("/v1/products").with_query("page", page)
}

pub fn products_in_category(category_id: u64, page: u32) -> ResourceKey {
    products(page).with_query("category", category_id)
}

pub fn product(id: u64) -> ResourceKey {
    ResourceKey::new(format!("/v1/products/{id}"))
}

pub fn categories() -> ResourceKey {
    ResourceKey::new("/v1/categories")
}

pub fn category(id: u64) -> ResourceKey {
    ResourceKey::new(format!("/v1/categories/{id}"))
}

pub fn pharmacies(page: u32) -> ResourceKey {
    ResourceKey::new("/v1/pharmacies").with_query("page", page)
}

pub fn pharmacy(id: u64) -> ResourceKey {
    ResourceKey::new(format!("/v1/pharmacies/{id}"))
}

pub fn orders(status: Option<OrderStatus>, page: u32) -> ResourceKey {
    ResourceKey::new("/v1/orders")
        .with_query("page", page)
        .with_optional_query("status", status)
}

pub fn order(id: u64) -> ResourceKey {
    ResourceKey::new(format!("/v1/orders/{id}"))
}

pub fn cart() -> ResourceKey {
    ResourceKey::new("/v1/cart")
}

pub fn addresses() -> ResourceKey {
    ResourceKey::new("/v1/users/me/addresses")
}

pub fn consultation_rooms() -> ResourceKey {
    ResourceKey::new("/v1/consultations")
}

pub fn consultation_messages(room_id: u64) -> ResourceKey {
    ResourceKey::new(format!("/v1/consultations/{room_id}/messages"))
}
