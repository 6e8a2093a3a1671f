use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_ORGANIZER: &str = "ORGANIZER";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    pub email: String,

    pub full_name: String,

    pub phone: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMeResponse {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl User {
    pub fn new(register: RegisterRequest, password_hash: String) -> Result<Self, String> {
        let full_name = match register.full_name.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => return Err("Full name is required".to_string()),
        };

        let email = register
            .email
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default();
        if !is_valid_email(&email) {
            return Err("A valid email is required".to_string());
        }

        let phone = match register.phone.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => normalize_phone(v),
            _ => return Err("Phone is required".to_string()),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            phone,
            password_hash,
            role: ROLE_ORGANIZER.to_string(),
            created_at: Utc::now(),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Normalizes a phone number to `+` followed by digits: formatting
/// characters are stripped and a doubled leading country code is collapsed
/// (`+994994501234567` becomes `+994501234567`).
pub fn normalize_phone(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-' | '+'))
        .collect();

    let digits = if cleaned.chars().all(|c| c.is_ascii_digit()) {
        collapse_country_code(cleaned)
    } else {
        cleaned
    };

    format!("+{}", digits)
}

// Only code lengths 3 and 2 are checked: real numbers legitimately start
// with a doubled digit (+994... begins with 99), so a length-1 collapse
// would corrupt them. Repeats until stable, which makes normalize_phone
// idempotent.
fn collapse_country_code(mut digits: String) -> String {
    'outer: loop {
        for len in [3usize, 2] {
            if digits.len() >= 2 * len && digits[..len] == digits[len..2 * len] {
                digits.replace_range(len..2 * len, "");
                continue 'outer;
            }
        }
        return digits;
    }
}
