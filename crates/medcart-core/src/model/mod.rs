// ── Domain model ──
//
// Canonical shapes of the storefront resources as the backend serves
// them. Views decode cache data into these via `Subscription::data_as`.

mod catalog;
mod consultation;
mod order;
mod page;
mod user;

pub use catalog::{Category, Pharmacy, Product};
pub use consultation::{ChatMessage, ConsultationRoom};
pub use order::{Order, OrderItem, OrderStatus};
pub use page::Page;
pub use user::{AuthToken, Role, User};
