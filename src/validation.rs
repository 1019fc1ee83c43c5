//! Declarative validation rules for the vendor form and the admin credentials.
//!
//! Every entry point returns either a typed, normalized value or an
//! [`AppError::Validation`] carrying field-level messages. Malformed input never
//! panics. Lengths are counted in characters, so Arabic input is measured the
//! same way as Latin input.

use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    error::{AppError, FieldErrors},
    models::submission::{BusinessProfile, FormVariant, PolicyAcknowledgements},
};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[0-9 \-]{8,20}$").expect("phone pattern is a valid regex")
});

const REQUIRED: &str = "This field is required";
const POLICY_NOT_ACCEPTED: &str = "This policy must be accepted";

/// Common text fields of the vendor form.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct VendorForm {
    #[validate(length(min = 2, max = 100))]
    pub designer_name: String,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 2, max = 100))]
    pub city: String,

    #[validate(length(min = 1, message = "This field is required"))]
    pub category: String,

    #[validate(length(min = 2, max = 200))]
    pub brand_name: String,

    #[validate(regex(path = *PHONE_PATTERN, message = "Please enter a valid phone number"))]
    pub phone_number: String,

    /// Empty input is normalized to `None` before validation.
    #[validate(url(message = "Please enter a valid URL"))]
    pub store_link: Option<String>,

    #[validate(length(min = 50, max = 2000))]
    pub brand_story: String,

    #[validate(length(min = 1, message = "This field is required"))]
    pub fulfillment_method: String,
}

#[derive(Debug, Clone, Validate)]
struct StockDetails {
    #[validate(length(min = 1, message = "This field is required"))]
    stock_availability: String,

    #[validate(range(min = 0, max = 1000))]
    branch_count: i32,
}

/// A vendor form that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVendorForm {
    pub form: VendorForm,
    pub business: BusinessProfile,
}

/// Text fields every variant requires, by wire name.
const REQUIRED_FIELDS: [&str; 8] = [
    "designerName",
    "email",
    "city",
    "category",
    "brandName",
    "phoneNumber",
    "brandStory",
    "fulfillmentMethod",
];

const POLICY_FIELDS: [&str; 6] = [
    "productImagePolicy",
    "returnRefundPolicy",
    "privacyPolicy",
    "termsOfUse",
    "commissionShippingPolicy",
    "whistleblowingPolicy",
];

/// Return the wire names of required text fields that are absent or blank.
pub fn missing_vendor_fields(
    fields: &HashMap<String, String>,
    variant: FormVariant,
) -> Vec<&'static str> {
    let extra: &[&'static str] = match variant {
        FormVariant::Stock => &["stockAvailability"],
        FormVariant::Policy => &[],
    };

    REQUIRED_FIELDS
        .iter()
        .chain(extra)
        .copied()
        .filter(|name| {
            fields
                .get(*name)
                .is_none_or(|value| value.trim().is_empty())
        })
        .collect()
}

/// Validate the text part of a vendor submission.
///
/// `fields` maps multipart field names (camelCase) to their text values.
/// Values are trimmed; an empty `storeLink` counts as absent; an absent or
/// empty `branchCount` counts as zero.
pub fn validate_vendor_form(
    fields: &HashMap<String, String>,
    variant: FormVariant,
) -> Result<ValidatedVendorForm, AppError> {
    let text = |name: &str| {
        fields
            .get(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    let store_link = Some(text("storeLink")).filter(|link| !link.is_empty());

    let form = VendorForm {
        designer_name: text("designerName"),
        email: text("email"),
        city: text("city"),
        category: text("category"),
        brand_name: text("brandName"),
        phone_number: text("phoneNumber"),
        store_link,
        brand_story: text("brandStory"),
        fulfillment_method: text("fulfillmentMethod"),
    };

    let mut errors = FieldErrors::new();
    collect(&mut errors, form.validate());

    let business = match variant {
        FormVariant::Stock => {
            let raw_count = text("branchCount");
            let branch_count = if raw_count.is_empty() {
                Some(0)
            } else {
                raw_count.parse::<i32>().ok()
            };

            match branch_count {
                Some(branch_count) => {
                    let details = StockDetails {
                        stock_availability: text("stockAvailability"),
                        branch_count,
                    };
                    collect(&mut errors, details.validate());
                    Some(BusinessProfile::Stock {
                        stock_availability: details.stock_availability,
                        branch_count: details.branch_count,
                    })
                }
                None => {
                    push(&mut errors, "branchCount", "Must be a whole number");
                    None
                }
            }
        }
        FormVariant::Policy => {
            let accepted = |name: &str| parse_flag(&text(name));
            for name in POLICY_FIELDS {
                if !accepted(name) {
                    push(&mut errors, name, POLICY_NOT_ACCEPTED);
                }
            }
            Some(BusinessProfile::Policy(PolicyAcknowledgements {
                product_image_policy: accepted("productImagePolicy"),
                return_refund_policy: accepted("returnRefundPolicy"),
                privacy_policy: accepted("privacyPolicy"),
                terms_of_use: accepted("termsOfUse"),
                commission_shipping_policy: accepted("commissionShippingPolicy"),
                whistleblowing_policy: accepted("whistleblowingPolicy"),
            }))
        }
    };

    match business {
        Some(business) if errors.is_empty() => Ok(ValidatedVendorForm { form, business }),
        _ => Err(AppError::from_fields(errors)),
    }
}

/// Checkbox values as browsers and scripts send them.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 8))]
    pub password: String,
}

/// `POST /api/auth/setup` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 8), custom(function = "password_strength"))]
    pub password: String,

    #[serde(default)]
    pub confirm_password: String,
}

fn password_strength(password: &str) -> Result<(), ValidationError> {
    let rules: [(fn(&char) -> bool, &'static str, &'static str); 3] = [
        (
            char::is_ascii_uppercase,
            "password_uppercase",
            "Password must contain at least one uppercase letter",
        ),
        (
            char::is_ascii_lowercase,
            "password_lowercase",
            "Password must contain at least one lowercase letter",
        ),
        (
            char::is_ascii_digit,
            "password_digit",
            "Password must contain at least one number",
        ),
    ];

    for (predicate, code, message) in rules {
        if !password.chars().any(|c| predicate(&c)) {
            return Err(ValidationError::new(code).with_message(Cow::Borrowed(message)));
        }
    }
    Ok(())
}

/// Validate login credentials.
pub fn validate_login(request: &LoginRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    collect(&mut errors, request.validate());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::from_fields(errors))
    }
}

/// Validate the bootstrap form. The confirmation error is reported on `confirmPassword`.
pub fn validate_setup(request: &SetupRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    collect(&mut errors, request.validate());
    if request.password != request.confirm_password {
        push(&mut errors, "confirmPassword", "Passwords do not match");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::from_fields(errors))
    }
}

fn collect(target: &mut FieldErrors, result: Result<(), ValidationErrors>) {
    let Err(errors) = result else {
        return;
    };
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            push(target, &camel_case(&field), &describe(error));
        }
    }
}

fn push(target: &mut FieldErrors, field: &str, message: &str) {
    target
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// `brand_name` -> `brandName`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Turn a validator error into the message shown to the client.
fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name);
    let number = |name: &str| param(name).and_then(|v| v.as_f64());

    match error.code.as_ref() {
        "length" => {
            let length = param("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as f64);
            match (param("min"), param("max"), length) {
                (Some(min), _, Some(len)) if min.as_f64().is_some_and(|m| len < m) => {
                    format!("Must be at least {min} characters")
                }
                (_, Some(max), _) => format!("Must be at most {max} characters"),
                (Some(min), None, _) => format!("Must be at least {min} characters"),
                _ => "Invalid length".to_string(),
            }
        }
        "range" => match (number("value"), param("min"), param("max")) {
            (Some(value), Some(min), _) if min.as_f64().is_some_and(|m| value < m) => {
                format!("Must be at least {min}")
            }
            (_, _, Some(max)) => format!("Must be at most {max}"),
            _ => "Out of range".to_string(),
        },
        "required" => REQUIRED.to_string(),
        "email" => "Please enter a valid email address".to_string(),
        "url" => "Please enter a valid URL".to_string(),
        _ => "Invalid value".to_string(),
    }
}
