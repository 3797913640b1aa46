//! Delivery channel of an alert.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Medium an alert is delivered through.
///
/// Parsing is total: any unrecognised value maps to [`DeliveryChannel::InApp`],
/// both when decoding rows and when deserializing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryChannel {
    /// In-application notification.
    InApp,
    /// Outbound email.
    Email,
    /// Outbound SMS.
    Sms,
}

impl DeliveryChannel {
    /// Every channel, in a stable order.
    pub const ALL: [DeliveryChannel; 3] = [Self::InApp, Self::Email, Self::Sms];

    /// Parse from string, falling back to in-app.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "InApp" => Self::InApp,
            "Email" => Self::Email,
            "SMS" => Self::Sms,
            other => {
                tracing::warn!(value = other, "Unknown delivery channel, using InApp");
                Self::InApp
            }
        }
    }

    /// Return the channel as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "InApp",
            Self::Email => "Email",
            Self::Sms => "SMS",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for DeliveryChannel {
    fn from(value: String) -> Self {
        Self::from_str_value(&value)
    }
}

impl From<DeliveryChannel> for String {
    fn from(channel: DeliveryChannel) -> String {
        channel.as_str().to_string()
    }
}

impl sqlx::Type<sqlx::Postgres> for DeliveryChannel {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DeliveryChannel {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DeliveryChannel {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_str_value(raw))
    }
}
