use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// One logged API call, as captured by an instrumented client.
///
/// Every field defaults when absent so that a sparse event never fails the
/// whole batch. Missing or unusable fields are handled per event by the
/// admission loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestData {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: i16,
    #[serde(default)]
    pub response_time: i16,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub created_at: String,
}

/// One batch submission: an API key, a framework tag, a privacy level, and
/// the events captured since the client's last flush.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestPayload {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub requests: Vec<RequestData>,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
}

/// Tiered policy controlling whether the client IP and/or the inferred
/// country code are persisted.
///
/// Ordered: `P1 < P2 < P3`, monotonically reducing identifiability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivacyLevel {
    /// IP stored as given; country code inferred and stored.
    P1,
    /// IP discarded before storage; country still inferred from the original IP.
    P2,
    /// Neither IP nor country; `user_id` is the only identity signal.
    P3,
}

impl Default for PrivacyLevel {
    // Absent level fails closed to the most private tier.
    fn default() -> Self {
        PrivacyLevel::P3
    }
}

impl PrivacyLevel {
    pub fn as_i16(self) -> i16 {
        match self {
            PrivacyLevel::P1 => 1,
            PrivacyLevel::P2 => 2,
            PrivacyLevel::P3 => 3,
        }
    }
}

impl<'de> Deserialize<'de> for PrivacyLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Out-of-range values fail closed to P3 rather than failing the batch.
        match i64::deserialize(deserializer)? {
            1 => Ok(PrivacyLevel::P1),
            2 => Ok(PrivacyLevel::P2),
            _ => Ok(PrivacyLevel::P3),
        }
    }
}

impl Serialize for PrivacyLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i16(self.as_i16())
    }
}

/// HTTP methods accepted by the ingestion pipeline, with their storage codes.
///
/// Events carrying any other method string are dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Connect,
    Head,
    Trace,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "OPTIONS" => Some(Method::Options),
            "CONNECT" => Some(Method::Connect),
            "HEAD" => Some(Method::Head),
            "TRACE" => Some(Method::Trace),
            _ => None,
        }
    }

    /// Integer code persisted in the `method` column.
    pub fn code(self) -> i16 {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Patch => 3,
            Method::Delete => 4,
            Method::Options => 5,
            Method::Connect => 6,
            Method::Head => 7,
            Method::Trace => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Head => "HEAD",
            Method::Trace => "TRACE",
        }
    }
}

/// Client integrations accepted by the ingestion pipeline, with their storage
/// codes. Unlike [`Method`], an unknown framework rejects the whole batch;
/// it is a batch-level field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    FastApi,
    Flask,
    Gin,
    Echo,
    Express,
    Fastify,
    Koa,
    Chi,
    Fiber,
    Actix,
    Axum,
    Tornado,
    Django,
    Rails,
    Laravel,
    Sinatra,
    Rocket,
    AspNetCore,
}

impl Framework {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FastAPI" => Some(Framework::FastApi),
            "Flask" => Some(Framework::Flask),
            "Gin" => Some(Framework::Gin),
            "Echo" => Some(Framework::Echo),
            "Express" => Some(Framework::Express),
            "Fastify" => Some(Framework::Fastify),
            "Koa" => Some(Framework::Koa),
            "Chi" => Some(Framework::Chi),
            "Fiber" => Some(Framework::Fiber),
            "Actix" => Some(Framework::Actix),
            "Axum" => Some(Framework::Axum),
            "Tornado" => Some(Framework::Tornado),
            "Django" => Some(Framework::Django),
            "Rails" => Some(Framework::Rails),
            "Laravel" => Some(Framework::Laravel),
            "Sinatra" => Some(Framework::Sinatra),
            "Rocket" => Some(Framework::Rocket),
            "ASP.NET Core" => Some(Framework::AspNetCore),
            _ => None,
        }
    }

    /// Integer code persisted in the `framework` column.
    pub fn code(self) -> i16 {
        match self {
            Framework::FastApi => 0,
            Framework::Flask => 1,
            Framework::Gin => 2,
            Framework::Echo => 3,
            Framework::Express => 4,
            Framework::Fastify => 5,
            Framework::Koa => 6,
            Framework::Chi => 7,
            Framework::Fiber => 8,
            Framework::Actix => 9,
            Framework::Axum => 10,
            Framework::Tornado => 11,
            Framework::Django => 12,
            Framework::Rails => 13,
            Framework::Laravel => 14,
            Framework::Sinatra => 15,
            Framework::Rocket => 16,
            Framework::AspNetCore => 17,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Framework::FastApi => "FastAPI",
            Framework::Flask => "Flask",
            Framework::Gin => "Gin",
            Framework::Echo => "Echo",
            Framework::Express => "Express",
            Framework::Fastify => "Fastify",
            Framework::Koa => "Koa",
            Framework::Chi => "Chi",
            Framework::Fiber => "Fiber",
            Framework::Actix => "Actix",
            Framework::Axum => "Axum",
            Framework::Tornado => "Tornado",
            Framework::Django => "Django",
            Framework::Rails => "Rails",
            Framework::Laravel => "Laravel",
            Framework::Sinatra => "Sinatra",
            Framework::Rocket => "Rocket",
            Framework::AspNetCore => "ASP.NET Core",
        }
    }
}

/// The persisted projection of an admitted event: validated, redacted, and
/// code-translated. Field order matches the `requests` table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub api_key: String,
    pub path: String,
    pub hostname: String,
    pub ip_address: String,
    pub user_agent: String,
    pub status: i16,
    pub response_time: i16,
    pub method: i16,
    pub framework: i16,
    pub location: String,
    pub user_id: String,
    pub created_at: String,
}
