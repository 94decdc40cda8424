//! Frontend Models
//!
//! Data structures exchanged with the defaults and search endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AutofillError, AutofillResult};

// ========================
// Client Identity
// ========================

/// Positive numeric client identifier taken from a selection control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(u64);

impl ClientId {
    /// Parse a control value. Empty, non-numeric and zero values mean
    /// "no client selected".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok().filter(|id| *id > 0).map(ClientId)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ========================
// Client Defaults
// ========================

/// Fields a client's defaults can populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultField {
    PickupAddress,
    PickupCity,
    PickupState,
    DropoffAddress,
    DropoffCity,
    DropoffState,
    PickupTime,
    Notes,
}

impl DefaultField {
    /// Reconciliation order
    pub const ALL: [DefaultField; 8] = [
        DefaultField::PickupAddress,
        DefaultField::PickupCity,
        DefaultField::PickupState,
        DefaultField::DropoffAddress,
        DefaultField::DropoffCity,
        DefaultField::DropoffState,
        DefaultField::PickupTime,
        DefaultField::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultField::PickupAddress => "pickup_address",
            DefaultField::PickupCity => "pickup_city",
            DefaultField::PickupState => "pickup_state",
            DefaultField::DropoffAddress => "dropoff_address",
            DefaultField::DropoffCity => "dropoff_city",
            DefaultField::DropoffState => "dropoff_state",
            DefaultField::PickupTime => "pickup_time",
            DefaultField::Notes => "notes",
        }
    }
}

/// Normalized defaults for one client. Absent values read as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDefaults {
    pub pickup_address: Option<String>,
    pub pickup_city: Option<String>,
    pub pickup_state: Option<String>,
    pub dropoff_address: Option<String>,
    pub dropoff_city: Option<String>,
    pub dropoff_state: Option<String>,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
}

impl ClientDefaults {
    pub fn get(&self, field: DefaultField) -> &str {
        let value = match field {
            DefaultField::PickupAddress => &self.pickup_address,
            DefaultField::PickupCity => &self.pickup_city,
            DefaultField::PickupState => &self.pickup_state,
            DefaultField::DropoffAddress => &self.dropoff_address,
            DefaultField::DropoffCity => &self.dropoff_city,
            DefaultField::DropoffState => &self.dropoff_state,
            DefaultField::PickupTime => &self.pickup_time,
            DefaultField::Notes => &self.notes,
        };
        value.as_deref().unwrap_or("")
    }

    /// Non-empty values in reconciliation order
    pub fn present(&self) -> impl Iterator<Item = (DefaultField, &str)> + '_ {
        DefaultField::ALL
            .into_iter()
            .map(move |f| (f, self.get(f)))
            .filter(|(_, v)| !v.is_empty())
    }
}

/// Body of `GET <defaults>/{id}/`
#[derive(Debug, Deserialize)]
struct DefaultsEnvelope {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    client: Option<WireClient>,
}

/// Raw client payload. Values are taken loosely: strings, numbers or null.
#[derive(Debug, Default, Deserialize)]
struct WireClient {
    #[serde(default)]
    pickup_address: Option<Value>,
    #[serde(default)]
    pickup_city: Option<Value>,
    #[serde(default)]
    pickup_state: Option<Value>,
    #[serde(default)]
    dropoff_address: Option<Value>,
    #[serde(default)]
    dropoff_city: Option<Value>,
    #[serde(default)]
    dropoff_state: Option<Value>,
    #[serde(default)]
    pickup_time: Option<Value>,
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<WireClient> for ClientDefaults {
    fn from(wire: WireClient) -> Self {
        // pickup_time falls back to start_time when missing or blank
        let pickup_time = text(wire.pickup_time)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| text(wire.start_time));
        ClientDefaults {
            pickup_address: text(wire.pickup_address),
            pickup_city: text(wire.pickup_city),
            pickup_state: text(wire.pickup_state),
            dropoff_address: text(wire.dropoff_address),
            dropoff_city: text(wire.dropoff_city),
            dropoff_state: text(wire.dropoff_state),
            pickup_time,
            notes: text(wire.notes),
        }
    }
}

/// Parse the JSON body of a defaults response
pub fn parse_defaults_body(body: &str) -> AutofillResult<ClientDefaults> {
    let envelope: DefaultsEnvelope = serde_json::from_str(body)
        .map_err(|e| AutofillError::format("application/json", e.to_string()))?;
    if envelope.ok != Some(true) {
        return Err(AutofillError::Semantic("ok flag false or missing".into()));
    }
    let client = envelope
        .client
        .ok_or_else(|| AutofillError::Semantic("client payload missing".into()))?;
    Ok(client.into())
}

// ========================
// Client Search
// ========================

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl SearchResultItem {
    /// Option label, synthesized from the id when the name is blank
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Client #{}", self.id),
        }
    }
}

/// Body of `GET <search>/?q=&limit=`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<SearchResultItem>,
    #[serde(default)]
    pub has_more: bool,
    /// Set when this is the fallback page for a failed request
    #[serde(skip)]
    pub failed: bool,
}

impl SearchPage {
    pub fn unavailable() -> Self {
        SearchPage { failed: true, ..Default::default() }
    }
}
