// ── Storefront form schemas ──
//
// One schema per form, each producing the request payload the backend
// expects. Messages are the ones shown inline next to the fields.

use serde::{Deserialize, Serialize};

use super::rules;
use super::schema::{FieldErrors, FormValues, Schema};

const EMAIL_REQUIRED: &str = "Email is required";
const EMAIL_INVALID: &str = "Please enter a valid email address";
const PASSWORD_REQUIRED: &str = "Password is required";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
const MIN_PASSWORD_LEN: usize = 8;

fn email_field(errors: &mut FieldErrors, values: &FormValues) -> Option<String> {
    errors.check("email", || {
        rules::required(values.trimmed("email"), EMAIL_REQUIRED)
            .and_then(|v| rules::email(v, EMAIL_INVALID))
            .map(str::to_owned)
    })
}

fn new_password_field(errors: &mut FieldErrors, values: &FormValues) -> Option<String> {
    let password = errors.check("password", || {
        rules::required(values.get("password"), PASSWORD_REQUIRED)
            .and_then(|v| rules::min_len(v, MIN_PASSWORD_LEN, PASSWORD_TOO_SHORT))
            .map(str::to_owned)
    });
    errors.check("confirm_password", || {
        rules::required(values.get("confirm_password"), "Please confirm your password")
            .and_then(|v| rules::matches(v, values.get("password"), "Passwords do not match"))
            .map(drop)
    })?;
    password
}

fn text_field(
    errors: &mut FieldErrors,
    values: &FormValues,
    field: &str,
    message: &str,
) -> Option<String> {
    errors.check(field, || rules::required(values.trimmed(field), message).map(str::to_owned))
}

fn optional_text(values: &FormValues, field: &str) -> Option<String> {
    let value = values.trimmed(field);
    (!value.is_empty()).then(|| value.to_owned())
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoginSchema;

impl Schema for LoginSchema {
    type Output = LoginInput;

    fn validate(&self, values: &FormValues) -> Result<LoginInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = email_field(&mut errors, values);
        let password = errors.check("password", || {
            rules::required(values.get("password"), PASSWORD_REQUIRED).map(str::to_owned)
        });
        match (email, password) {
            (Some(email), Some(password)) => Ok(LoginInput { email, password }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterSchema;

impl Schema for RegisterSchema {
    type Output = RegisterInput;

    fn validate(&self, values: &FormValues) -> Result<RegisterInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, values, "name", "Name is required");
        let email = email_field(&mut errors, values);
        let password = new_password_field(&mut errors, values);
        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(RegisterInput {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialization: String,
    pub experience_years: u64,
    pub certificate_url: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoctorRegisterSchema;

impl Schema for DoctorRegisterSchema {
    type Output = DoctorRegisterInput;

    fn validate(&self, values: &FormValues) -> Result<DoctorRegisterInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, values, "name", "Name is required");
        let email = email_field(&mut errors, values);
        let password = new_password_field(&mut errors, values);
        let specialization = text_field(
            &mut errors,
            values,
            "specialization",
            "Specialization is required",
        );
        let experience_years = errors.check("experience_years", || {
            rules::required(values.trimmed("experience_years"), "Years of experience is required")
                .and_then(|v| {
                    rules::non_negative_integer(v, "Years of experience must be a whole number")
                })
        });
        let certificate_url = text_field(
            &mut errors,
            values,
            "certificate_url",
            "Practice certificate is required",
        );

        match (name, email, password, specialization, experience_years, certificate_url) {
            (
                Some(name),
                Some(email),
                Some(password),
                Some(specialization),
                Some(experience_years),
                Some(certificate_url),
            ) if errors.is_empty() => Ok(DoctorRegisterInput {
                name,
                email,
                password,
                specialization,
                experience_years,
                certificate_url,
            }),
            _ => Err(errors),
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategorySchema;

impl Schema for CategorySchema {
    type Output = CategoryInput;

    fn validate(&self, values: &FormValues) -> Result<CategoryInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = errors.check("name", || {
            rules::required(values.trimmed("name"), "Category name is required")
                .and_then(|v| rules::min_len(v, 3, "Category name must be at least 3 characters"))
                .map(str::to_owned)
        });
        match name {
            Some(name) => Ok(CategoryInput {
                name,
                image_url: optional_text(values, "image_url"),
            }),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: u64,
    pub stock: u64,
    pub category_id: u64,
    pub requires_prescription: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSchema;

impl Schema for ProductSchema {
    type Output = ProductInput;

    fn validate(&self, values: &FormValues) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, values, "name", "Product name is required");
        let price = errors.check("price", || {
            rules::required(values.trimmed("price"), "Price is required")
                .and_then(|v| rules::positive_number::<u64>(v, "Price must be greater than 0"))
        });
        let stock = errors.check("stock", || {
            rules::required(values.trimmed("stock"), "Stock is required")
                .and_then(|v| rules::non_negative_integer(v, "Stock must be a whole number"))
        });
        let category_id = errors.check("category_id", || {
            rules::required(values.trimmed("category_id"), "Category is required")
                .and_then(|v| rules::positive_number::<u64>(v, "Category is required"))
        });
        let requires_prescription = matches!(
            values.trimmed("requires_prescription"),
            "true" | "on" | "yes" | "1"
        );

        match (name, price, stock, category_id) {
            (Some(name), Some(price), Some(stock), Some(category_id)) => Ok(ProductInput {
                name,
                description: optional_text(values, "description"),
                price,
                stock,
                category_id,
                requires_prescription,
            }),
            _ => Err(errors),
        }
    }
}

// ── Pharmacies and addresses ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyInput {
    pub name: String,
    pub address: String,
    pub city: String,
    pub pharmacist_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PharmacySchema;

impl Schema for PharmacySchema {
    type Output = PharmacyInput;

    fn validate(&self, values: &FormValues) -> Result<PharmacyInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, values, "name", "Pharmacy name is required");
        let address = text_field(&mut errors, values, "address", "Address is required");
        let city = text_field(&mut errors, values, "city", "City is required");
        let pharmacist_name = text_field(
            &mut errors,
            values,
            "pharmacist_name",
            "Pharmacist name is required",
        );
        let phone = errors.check("phone", || {
            rules::required(values.trimmed("phone"), "Phone number is required")
                .and_then(|v| rules::phone(v, "Please enter a valid phone number"))
                .map(str::to_owned)
        });
        let latitude = errors.check("latitude", || {
            rules::optional(values.get("latitude"), |v| {
                rules::in_range(v, -90.0..=90.0, "Latitude must be between -90 and 90")
            })
        });
        let longitude = errors.check("longitude", || {
            rules::optional(values.get("longitude"), |v| {
                rules::in_range(v, -180.0..=180.0, "Longitude must be between -180 and 180")
            })
        });

        match (name, address, city, pharmacist_name, phone, latitude, longitude) {
            (
                Some(name),
                Some(address),
                Some(city),
                Some(pharmacist_name),
                Some(phone),
                Some(latitude),
                Some(longitude),
            ) => Ok(PharmacyInput {
                name,
                address,
                city,
                pharmacist_name,
                phone,
                operational_hours: optional_text(values, "operational_hours"),
                latitude,
                longitude,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddressSchema;

impl Schema for AddressSchema {
    type Output = AddressInput;

    fn validate(&self, values: &FormValues) -> Result<AddressInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let recipient =
            text_field(&mut errors, values, "recipient", "Recipient name is required");
        let phone = errors.check("phone", || {
            rules::required(values.trimmed("phone"), "Phone number is required")
                .and_then(|v| rules::phone(v, "Please enter a valid phone number"))
                .map(str::to_owned)
        });
        let street = text_field(&mut errors, values, "street", "Street address is required");
        let city = text_field(&mut errors, values, "city", "City is required");
        let postal_code = errors.check("postal_code", || {
            rules::required(values.trimmed("postal_code"), "Postal code is required")
                .and_then(|v| {
                    if v.len() == 5 && v.bytes().all(|b| b.is_ascii_digit()) {
                        Ok(v.to_owned())
                    } else {
                        Err("Postal code must be 5 digits".to_owned())
                    }
                })
        });

        match (recipient, phone, street, city, postal_code) {
            (Some(recipient), Some(phone), Some(street), Some(city), Some(postal_code)) => {
                Ok(AddressInput {
                    recipient,
                    phone,
                    street,
                    city,
                    postal_code,
                })
            }
            _ => Err(errors),
        }
    }
}
