//! Registration form model and the form state store.
//!
//! Writes are tagged by origin: `FormStore::set_field` is the only local
//! write and the only one that yields a [`LocalEdit`]. Remote patches go
//! through `FormStore::merge_remote`, which never schedules an outbound sync.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::FormError;

/// A named field of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    NationalId,
    DateOfBirth,
    Gender,
    Province,
    District,
    Ward,
    Address,
    Phone,
    Symptoms,
    Department,
}

impl FormField {
    /// All fields in display order.
    pub const ALL: [FormField; 11] = [
        FormField::Name,
        FormField::DateOfBirth,
        FormField::Gender,
        FormField::Phone,
        FormField::NationalId,
        FormField::Province,
        FormField::District,
        FormField::Ward,
        FormField::Address,
        FormField::Symptoms,
        FormField::Department,
    ];

    /// Key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::NationalId => "cccd",
            FormField::DateOfBirth => "dob",
            FormField::Gender => "gender",
            FormField::Province => "province",
            FormField::District => "district",
            FormField::Ward => "ward",
            FormField::Address => "address",
            FormField::Phone => "phone",
            FormField::Symptoms => "symptoms",
            FormField::Department => "department",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Full name",
            FormField::NationalId => "National ID (CCCD)",
            FormField::DateOfBirth => "Date of birth",
            FormField::Gender => "Gender",
            FormField::Province => "Province/City",
            FormField::District => "District",
            FormField::Ward => "Ward/Commune",
            FormField::Address => "Address",
            FormField::Phone => "Phone number",
            FormField::Symptoms => "Symptoms",
            FormField::Department => "Department",
        }
    }

    /// Look up a field by wire key only.
    pub fn from_key(key: &str) -> Option<Self> {
        FormField::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FormField {
    type Err = FormError;

    /// Accepts wire keys plus the long aliases typed at the prompt.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        if let Some(field) = FormField::from_key(&normalized) {
            return Ok(field);
        }
        match normalized.as_str() {
            "national-id" | "id" => Ok(FormField::NationalId),
            "date-of-birth" | "birthday" => Ok(FormField::DateOfBirth),
            _ => Err(FormError::UnknownField(s.to_string())),
        }
    }
}

/// The patient registration record.
///
/// Every field starts empty; no validation is applied to the contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub name: String,
    #[serde(rename = "cccd")]
    pub national_id: String,
    #[serde(rename = "dob")]
    pub date_of_birth: String,
    pub gender: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub address: String,
    pub phone: String,
    pub symptoms: String,
    pub department: String,
}

impl RegistrationForm {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::NationalId => &self.national_id,
            FormField::DateOfBirth => &self.date_of_birth,
            FormField::Gender => &self.gender,
            FormField::Province => &self.province,
            FormField::District => &self.district,
            FormField::Ward => &self.ward,
            FormField::Address => &self.address,
            FormField::Phone => &self.phone,
            FormField::Symptoms => &self.symptoms,
            FormField::Department => &self.department,
        }
    }

    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::NationalId => &mut self.national_id,
            FormField::DateOfBirth => &mut self.date_of_birth,
            FormField::Gender => &mut self.gender,
            FormField::Province => &mut self.province,
            FormField::District => &mut self.district,
            FormField::Ward => &mut self.ward,
            FormField::Address => &mut self.address,
            FormField::Phone => &mut self.phone,
            FormField::Symptoms => &mut self.symptoms,
            FormField::Department => &mut self.department,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    /// Fields holding a non-blank value, in display order.
    pub fn filled_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| !self.get(*field).trim().is_empty())
            .collect()
    }
}

/// A partial form pushed by the remote peer.
///
/// Later entries for the same field win, mirroring a shallow object spread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPatch {
    entries: Vec<(FormField, String)>,
}

impl FormPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FormField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: FormField, value: impl Into<String>) {
        self.entries.push((field, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.entries
            .iter()
            .map(|(field, value)| (*field, value.as_str()))
    }
}

/// Marker returned by a local edit.
///
/// Only values of this type are fed to the debouncer, so remote merges can
/// never echo back to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEdit {
    pub revision: u64,
}

/// Holds the registration form for the lifetime of the view.
#[derive(Debug, Default)]
pub struct FormStore {
    form: RegistrationForm,
    revision: u64,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Number of local edits applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Overwrite a field from user input.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> LocalEdit {
        self.form.set(field, value);
        self.revision += 1;
        LocalEdit {
            revision: self.revision,
        }
    }

    /// Apply a remote patch, leaving unspecified fields untouched.
    ///
    /// Returns the fields whose value actually changed.
    pub fn merge_remote(&mut self, patch: &FormPatch) -> Vec<FormField> {
        let mut changed = Vec::new();
        for (field, value) in patch.iter() {
            if self.form.get(field) != value {
                self.form.set(field, value);
                if !changed.contains(&field) {
                    changed.push(field);
                }
            }
        }
        changed
    }
}
