use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Store as embedded in products and invoices: either populated or a bare id.
/// Outgoing payloads carry only the id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl StoreRef {
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }
}

impl Serialize for StoreRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.id {
            Some(id) => serializer.serialize_str(id),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for StoreRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Populated {
            #[serde(default, alias = "_id")]
            id: Option<String>,
            #[serde(default)]
            name: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Populated(Populated),
            Id(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Populated(p) => StoreRef { id: p.id, name: p.name },
            Wire::Id(id) => StoreRef { id: Some(id), name: None },
        })
    }
}

impl From<&StoreRecord> for StoreRef {
    fn from(s: &StoreRecord) -> Self {
        StoreRef {
            id: Some(s.id.clone()),
            name: Some(s.name.clone()).filter(|n| !n.trim().is_empty()),
        }
    }
}
