//! Checkout form data, input masks and submit-time validation.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::card::{self, CardType};
use super::country;
use super::email::Email;

/// `maxlength` of the card number input: [`card::MAX_DIGITS`] digits plus
/// the separating spaces.
pub const CARD_NUMBER_INPUT_MAX: usize = card::MAX_DIGITS + (card::MAX_DIGITS - 1) / 4;

/// Longest CVV the mask lets through.
pub const CVV_MAX: usize = 4;

/// Longest ZIP code the mask lets through.
pub const ZIP_CODE_MAX: usize = 5;

/// A field of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Email,
    FirstName,
    LastName,
    Country,
    CardNumber,
    ExpiryDate,
    Cvv,
    NameOnCard,
    BillingAddress,
    City,
    State,
    ZipCode,
}

impl FormField {
    /// Every field, in display order.
    pub const ALL: [Self; 12] = [
        Self::Email,
        Self::FirstName,
        Self::LastName,
        Self::Country,
        Self::CardNumber,
        Self::ExpiryDate,
        Self::Cvv,
        Self::NameOnCard,
        Self::BillingAddress,
        Self::City,
        Self::State,
        Self::ZipCode,
    ];

    /// Order in which required-field checks run.
    pub const REQUIRED_CHECK_ORDER: [Self; 12] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Country,
        Self::CardNumber,
        Self::ExpiryDate,
        Self::Cvv,
        Self::NameOnCard,
        Self::BillingAddress,
        Self::City,
        Self::State,
        Self::ZipCode,
    ];

    /// The HTML `name` attribute / JSON key of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Country => "country",
            Self::CardNumber => "cardNumber",
            Self::ExpiryDate => "expiryDate",
            Self::Cvv => "cvv",
            Self::NameOnCard => "nameOnCard",
            Self::BillingAddress => "billingAddress",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zipCode",
        }
    }

    const fn required_message(self) -> &'static str {
        match self {
            Self::Email => "Email is required",
            Self::FirstName => "First name is required",
            Self::LastName => "Last name is required",
            Self::Country => "Please select a country",
            Self::CardNumber => "Card number is required",
            Self::ExpiryDate => "Expiry date is required",
            Self::Cvv => "CVV is required",
            Self::NameOnCard => "Name on card is required",
            Self::BillingAddress => "Billing address is required",
            Self::City => "City is required",
            Self::State => "State is required",
            Self::ZipCode => "ZIP code is required",
        }
    }

    /// Apply this field's input mask to raw keystrokes.
    ///
    /// - card number: digits only, at most [`card::MAX_DIGITS`], grouped by four
    /// - expiry: digits only, `/` after the second digit
    /// - CVV: digits only, at most four
    /// - ZIP: digits only, at most five
    /// - everything else passes through untouched
    #[must_use]
    pub fn format_input(self, raw: &str) -> String {
        match self {
            Self::CardNumber => {
                let capped: String = card::digits(raw).chars().take(card::MAX_DIGITS).collect();
                card::format_number(&capped)
            }
            Self::ExpiryDate => {
                let digits = card::digits(raw);
                if digits.len() > 2 {
                    let (month, rest) = digits.split_at(2);
                    format!("{month}/{rest}")
                } else {
                    digits
                }
            }
            Self::Cvv => card::digits(raw).chars().take(CVV_MAX).collect(),
            Self::ZipCode => card::digits(raw).chars().take(ZIP_CODE_MAX).collect(),
            _ => raw.to_owned(),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validation message attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Field errors in the order they were first raised.
///
/// Re-raising an error for a field replaces its message but keeps its
/// position, so [`FieldErrors::first`] is always the first field that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    fn single(field: FormField, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Record an error for `field`.
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        let message = message.into();
        if let Some(existing) = self.0.iter_mut().find(|e| e.field == field) {
            existing.message = message;
        } else {
            self.0.push(FieldError { field, message });
        }
    }

    /// Drop the error for `field`, if any.
    pub fn clear(&mut self, field: FormField) {
        self.0.retain(|e| e.field != field);
    }

    /// Message for `field`, if it has one.
    #[must_use]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// The field to scroll to and focus.
    #[must_use]
    pub fn first(&self) -> Option<FormField> {
        self.0.first().map(|e| e.field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

/// A parsed `MM/YY` card expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryDate {
    month: u32,
    year: u32,
}

impl ExpiryDate {
    /// Parse `MM/YY`. The month must be 1-12 and the year exactly two digits.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (month, year) = input.trim().split_once('/')?;

        let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !is_digits(month) || month.len() > 2 || !is_digits(year) || year.len() != 2 {
            return None;
        }

        let month: u32 = month.parse().ok()?;
        let year: u32 = year.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        Some(Self { month, year })
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Two-digit year.
    #[must_use]
    pub const fn year(&self) -> u32 {
        self.year
    }

    /// Whether the card expired before the month containing `today`.
    ///
    /// A card expiring in the current month is still valid.
    #[must_use]
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        let current_year = today.year().rem_euclid(100).unsigned_abs();
        let current_month = today.month();
        self.year < current_year || (self.year == current_year && self.month < current_month)
    }
}

/// Everything the checkout form collects.
///
/// Missing keys deserialize as empty strings so that absent fields surface as
/// "required" errors instead of rejections at the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentFormData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub name_on_card: String,
    pub billing_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl PaymentFormData {
    /// A fresh form with the email prefilled and the default country selected.
    #[must_use]
    pub fn prefilled(email: &str) -> Self {
        Self {
            email: email.to_owned(),
            country: country::DEFAULT_COUNTRY.to_owned(),
            ..Self::default()
        }
    }

    /// Current value of `field`.
    #[must_use]
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Email => &self.email,
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Country => &self.country,
            FormField::CardNumber => &self.card_number,
            FormField::ExpiryDate => &self.expiry_date,
            FormField::Cvv => &self.cvv,
            FormField::NameOnCard => &self.name_on_card,
            FormField::BillingAddress => &self.billing_address,
            FormField::City => &self.city,
            FormField::State => &self.state,
            FormField::ZipCode => &self.zip_code,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Email => &mut self.email,
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Country => &mut self.country,
            FormField::CardNumber => &mut self.card_number,
            FormField::ExpiryDate => &mut self.expiry_date,
            FormField::Cvv => &mut self.cvv,
            FormField::NameOnCard => &mut self.name_on_card,
            FormField::BillingAddress => &mut self.billing_address,
            FormField::City => &mut self.city,
            FormField::State => &mut self.state,
            FormField::ZipCode => &mut self.zip_code,
        }
    }

    /// Store raw input for `field` after applying its mask.
    pub fn apply_input(&mut self, field: FormField, raw: &str) {
        *self.value_mut(field) = field.format_input(raw);
    }

    /// "First Last" as entered.
    #[must_use]
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Validate the whole form as of `today`.
    ///
    /// Required fields, email format and country membership are checked
    /// together and every violation is reported. Only when those pass are the
    /// card number, expiry and CVV checked, each stopping at its own failure.
    ///
    /// # Errors
    ///
    /// Returns the ordered field errors when any check fails.
    pub fn validate(&self, today: NaiveDate) -> Result<CardType, FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in FormField::REQUIRED_CHECK_ORDER {
            let value = self.value(field);
            // The country select has no free text, so it is not trimmed
            let missing = if field == FormField::Country {
                value.is_empty()
            } else {
                value.trim().is_empty()
            };
            if missing {
                errors.insert(field, field.required_message());
            }
        }

        if !self.email.is_empty() && Email::parse(&self.email).is_err() {
            errors.insert(FormField::Email, "Please enter a valid email address");
        }

        if !self.country.is_empty() && country::find(&self.country).is_none() {
            errors.insert(FormField::Country, "Please select a valid country");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        if !card::is_valid_number(&self.card_number) {
            return Err(FieldErrors::single(
                FormField::CardNumber,
                "Please enter a valid credit card number",
            ));
        }

        let Some(expiry) = ExpiryDate::parse(&self.expiry_date) else {
            return Err(FieldErrors::single(
                FormField::ExpiryDate,
                "Please enter a valid expiry date (MM/YY)",
            ));
        };
        if expiry.is_expired_at(today) {
            return Err(FieldErrors::single(
                FormField::ExpiryDate,
                "Your card has expired. Please use a valid card",
            ));
        }

        let card_type = card::classify(&self.card_number);
        let cvv_length = card_type.cvv_length();
        let cvv_ok = self.cvv.len() == cvv_length && self.cvv.chars().all(|c| c.is_ascii_digit());
        if !cvv_ok {
            return Err(FieldErrors::single(
                FormField::Cvv,
                format!("Please enter a valid {cvv_length}-digit CVV for {card_type} cards"),
            ));
        }

        Ok(card_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn complete_form() -> PaymentFormData {
        PaymentFormData {
            email: "buyer@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            country: "GB".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            expiry_date: "12/28".to_string(),
            cvv: "123".to_string(),
            name_on_card: "Ada Lovelace".to_string(),
            billing_address: "12 St James's Square".to_string(),
            city: "London".to_string(),
            state: "London".to_string(),
            zip_code: "12345".to_string(),
        }
    }

    #[test]
    fn test_card_number_mask() {
        let field = FormField::CardNumber;
        assert_eq!(field.format_input("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(field.format_input("4111 11x"), "4111 11");
        // Over-length input keeps the first nineteen digits
        assert_eq!(
            field.format_input("41111111111111111111"),
            "4111 1111 1111 1111 111"
        );
        assert_eq!(
            field.format_input("4111 1111 1111 1111 1111"),
            "4111 1111 1111 1111 111"
        );
        assert_eq!(CARD_NUMBER_INPUT_MAX, "4111 1111 1111 1111 111".len());
    }

    #[test]
    fn test_expiry_mask() {
        let field = FormField::ExpiryDate;
        assert_eq!(field.format_input("1"), "1");
        assert_eq!(field.format_input("12"), "12");
        assert_eq!(field.format_input("122"), "12/2");
        assert_eq!(field.format_input("12/28"), "12/28");
        assert_eq!(field.format_input("1228"), "12/28");
    }

    #[test]
    fn test_cvv_and_zip_masks() {
        assert_eq!(FormField::Cvv.format_input("12a345"), "1234");
        assert_eq!(FormField::ZipCode.format_input("90210-1234"), "90210");
    }

    #[test]
    fn test_other_fields_pass_through() {
        assert_eq!(FormField::City.format_input("  São Paulo "), "  São Paulo ");
        assert_eq!(FormField::Email.format_input("A@B.C"), "A@B.C");
    }

    #[test]
    fn test_set_applies_mask() {
        let mut form = PaymentFormData::prefilled("a@b.co");
        assert_eq!(form.country, "US");
        form.apply_input(FormField::CardNumber, "5500000000000004");
        assert_eq!(form.card_number, "5500 0000 0000 0004");
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        assert_eq!(complete_form().validate(today()), Ok(CardType::Visa));
    }

    #[test]
    fn test_validate_collects_all_required_errors() {
        let errors = PaymentFormData::default().validate(today()).unwrap_err();
        assert_eq!(errors.len(), 12);
        assert_eq!(errors.first(), Some(FormField::FirstName));
        assert_eq!(errors.get(FormField::Country), Some("Please select a country"));
        assert_eq!(errors.get(FormField::ZipCode), Some("ZIP code is required"));
    }

    #[test]
    fn test_validate_whitespace_only_is_missing() {
        let mut form = complete_form();
        form.city = "   ".to_string();
        let errors = form.validate(today()).unwrap_err();
        assert_eq!(errors.get(FormField::City), Some("City is required"));
    }

    #[test]
    fn test_validate_email_and_country_reported_together() {
        let mut form = complete_form();
        form.email = "not-an-email".to_string();
        form.country = "XX".to_string();
        form.last_name = String::new();

        let errors = form.validate(today()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.first(), Some(FormField::LastName));
        assert_eq!(
            errors.get(FormField::Email),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            errors.get(FormField::Country),
            Some("Please select a valid country")
        );
    }

    #[test]
    fn test_validate_card_checks_wait_for_required_fields() {
        let mut form = complete_form();
        form.card_number = "1234 5678 9012 3456".to_string();
        form.city = String::new();

        let errors = form.validate(today()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first(), Some(FormField::City));
    }

    #[test]
    fn test_validate_luhn_failure() {
        let mut form = complete_form();
        form.card_number = "1234 5678 9012 3456".to_string();
        let errors = form.validate(today()).unwrap_err();
        assert_eq!(
            errors.get(FormField::CardNumber),
            Some("Please enter a valid credit card number")
        );
    }

    #[test]
    fn test_expiry_parse() {
        assert_eq!(ExpiryDate::parse("12/28").map(|e| (e.month(), e.year())), Some((12, 28)));
        assert_eq!(ExpiryDate::parse("1/28").map(|e| e.month()), Some(1));
        assert!(ExpiryDate::parse("13/28").is_none());
        assert!(ExpiryDate::parse("00/28").is_none());
        assert!(ExpiryDate::parse("12").is_none());
        assert!(ExpiryDate::parse("12/").is_none());
        assert!(ExpiryDate::parse("/28").is_none());
        assert!(ExpiryDate::parse("12/2028").is_none());
        assert!(ExpiryDate::parse("ab/cd").is_none());
    }

    #[test]
    fn test_expiry_relative_to_current_month() {
        // Current month is 10/26
        let expired = ExpiryDate::parse("09/26").unwrap();
        let this_month = ExpiryDate::parse("10/26").unwrap();
        let next_month = ExpiryDate::parse("11/26").unwrap();
        let last_year = ExpiryDate::parse("12/25").unwrap();
        let next_year = ExpiryDate::parse("01/27").unwrap();

        assert!(expired.is_expired_at(today()));
        assert!(last_year.is_expired_at(today()));
        assert!(!this_month.is_expired_at(today()));
        assert!(!next_month.is_expired_at(today()));
        assert!(!next_year.is_expired_at(today()));
    }

    #[test]
    fn test_validate_expiry_errors() {
        let mut form = complete_form();
        form.expiry_date = "13/28".to_string();
        assert_eq!(
            form.validate(today()).unwrap_err().get(FormField::ExpiryDate),
            Some("Please enter a valid expiry date (MM/YY)")
        );

        form.expiry_date = "09/26".to_string();
        assert_eq!(
            form.validate(today()).unwrap_err().get(FormField::ExpiryDate),
            Some("Your card has expired. Please use a valid card")
        );

        form.expiry_date = "10/26".to_string();
        assert!(form.validate(today()).is_ok());
    }

    #[test]
    fn test_validate_cvv_length_by_card_type() {
        let mut form = complete_form();
        form.cvv = "1234".to_string();
        assert_eq!(
            form.validate(today()).unwrap_err().get(FormField::Cvv),
            Some("Please enter a valid 3-digit CVV for Visa cards")
        );

        form.card_number = "3400 000000 00009".to_string();
        assert_eq!(form.validate(today()), Ok(CardType::AmericanExpress));

        form.cvv = "123".to_string();
        assert_eq!(
            form.validate(today()).unwrap_err().get(FormField::Cvv),
            Some("Please enter a valid 4-digit CVV for American Express cards")
        );

        // Unclassified but Luhn-valid numbers need three digits
        form.card_number = "0000 0000 0000 0000".to_string();
        assert_eq!(form.validate(today()), Ok(CardType::Unknown));
    }

    #[test]
    fn test_field_errors_keep_first_position() {
        let mut errors = FieldErrors::new();
        errors.insert(FormField::Email, "Email is required");
        errors.insert(FormField::City, "City is required");
        errors.insert(FormField::Email, "Please enter a valid email address");

        assert_eq!(errors.first(), Some(FormField::Email));
        assert_eq!(
            errors.get(FormField::Email),
            Some("Please enter a valid email address")
        );

        errors.clear(FormField::Email);
        assert_eq!(errors.first(), Some(FormField::City));
    }

    #[test]
    fn test_masks_are_stable_when_reapplied() {
        let cases = [
            (FormField::CardNumber, "4000000000000000006"),
            (FormField::CardNumber, "41111111111111111111"),
            (FormField::CardNumber, "4111 1111 1111 1111 1111"),
            (FormField::CardNumber, "3782 822463 10005"),
            (FormField::ExpiryDate, "1228"),
            (FormField::Cvv, "12a345"),
            (FormField::ZipCode, "90210-1234"),
        ];
        for (field, raw) in cases {
            let once = field.format_input(raw);
            assert_eq!(field.format_input(&once), once, "{field}: {raw}");
        }
    }

    #[test]
    fn test_nineteen_digit_card_survives_resubmit() {
        let mut form = complete_form();
        form.apply_input(FormField::CardNumber, "4000000000000000006");
        assert_eq!(form.card_number, "4000 0000 0000 0000 006");
        assert_eq!(form.validate(today()), Ok(CardType::Visa));

        let posted = form.card_number.clone();
        form.apply_input(FormField::CardNumber, &posted);
        assert_eq!(form.card_number, "4000 0000 0000 0000 006");
        assert_eq!(form.validate(today()), Ok(CardType::Visa));
    }

    #[test]
    fn test_deserialize_camel_case_with_missing_fields() {
        let form: PaymentFormData =
            serde_json::from_str(r#"{"firstName":"Ada","zipCode":"123"}"#).unwrap();
        assert_eq!(form.first_name, "Ada");
        assert_eq!(form.zip_code, "123");
        assert!(form.email.is_empty());
    }
}
