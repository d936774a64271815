use serde::{Deserialize, Deserializer, Serialize};

fn is_false(v: &bool) -> bool {
    !*v
}

/// Checkpoint document, one JSON object per state file.
///
/// Written with plain JSON numbers and booleans. Files produced by older
/// crawlers encode `from_thread` as the literal string `"True"` and the
/// counters as strings; the readers accept both forms.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateDoc {
    #[serde(default)]
    pub instances: Vec<String>,

    #[serde(default)]
    pub users: Vec<AccountDoc>,

    #[serde(default)]
    pub toots: Vec<TootDoc>,

    #[serde(default)]
    pub toots_todo: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountDoc {
    pub instance: String,
    pub acct: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acct_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seen_by: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TootDoc {
    pub uri: String,
    pub acct: String,
    pub toot_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub local_instance: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub local_id: String,

    #[serde(
        default,
        deserialize_with = "loose_bool",
        skip_serializing_if = "is_false"
    )]
    pub from_thread: bool,

    #[serde(default, deserialize_with = "loose_count")]
    pub favor: u32,

    #[serde(default, deserialize_with = "loose_count")]
    pub related: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Text(String),
}

fn loose_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match LooseBool::deserialize(d)? {
        LooseBool::Bool(b) => b,
        LooseBool::Text(s) => s == "True" || s == "true",
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseCount {
    Num(u32),
    Text(String),
    Other(serde_json::Value),
}

fn loose_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(match LooseCount::deserialize(d)? {
        LooseCount::Num(n) => n,
        LooseCount::Text(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %s, "unparsable count in state file, using 0");
            0
        }),
        LooseCount::Other(v) => {
            tracing::warn!(value = %v, "unparsable count in state file, using 0");
            0
        }
    })
}
