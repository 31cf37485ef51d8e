//! Order intent captured by the landing form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::vin::{Vin, VinError};

/// Errors that can occur when building an [`OrderIntent`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderIntentError {
    /// One of VIN, email or car model is blank.
    #[error("VIN, email, and car model are required")]
    MissingFields,
    #[error("VIN must be exactly 17 characters")]
    VinLength,
    #[error("VIN may only contain letters and digits")]
    VinCharacters,
    #[error("Please provide a valid email address")]
    InvalidEmail,
}

impl From<VinError> for OrderIntentError {
    fn from(err: VinError) -> Self {
        match err {
            VinError::WrongLength(_) => Self::VinLength,
            VinError::InvalidCharacter(_) => Self::VinCharacters,
        }
    }
}

/// What the visitor asked for on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub vin: Vin,
    pub email: Email,
    pub car_model: String,
    pub created_at: DateTime<Utc>,
}

impl OrderIntent {
    /// Validate raw landing form input.
    ///
    /// Presence is checked for all three fields first, then the VIN, then the
    /// email.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderIntentError`] that applies.
    pub fn new(
        vin: &str,
        email: &str,
        car_model: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderIntentError> {
        let car_model = car_model.trim();
        if vin.trim().is_empty() || email.trim().is_empty() || car_model.is_empty() {
            return Err(OrderIntentError::MissingFields);
        }

        let vin = Vin::parse(vin)?;
        let email = Email::parse(email.trim()).map_err(|_| OrderIntentError::InvalidEmail)?;

        Ok(Self {
            vin,
            email,
            car_model: car_model.to_owned(),
            created_at,
        })
    }
}
