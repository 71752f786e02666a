//! Request bodies accepted by the gateway.
//!
//! DESIGN
//! ======
//! Agent endpoints take multipart form submissions regardless of payload
//! shape, so `FormData` is the common currency of the endpoint catalog. It is
//! only turned into a `reqwest` form at send time, which keeps it cheap to
//! build and inspect in tests.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8>, mime: Option<String> },
}

/// Ordered multipart fields. Names may repeat, as with browser `FormData`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File { file_name: file_name.into(), bytes, mime: mime.map(str::to_owned) },
        ));
        self
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), FormValue::Text(value.into())));
    }

    /// First text value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(key, value)| match value {
            FormValue::Text(text) if key == name => Some(text.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the multipart body.
    ///
    /// # Errors
    ///
    /// Returns an error if a file part carries an unparseable MIME type.
    pub fn into_multipart(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File { file_name, bytes, mime } => {
                    let mut part = Part::bytes(bytes).file_name(file_name);
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime)?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (name, value) in iter {
            form.append(name, value);
        }
        form
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(FormData),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Self::Multipart(form)
    }
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
