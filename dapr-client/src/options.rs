//! Write/read options and their wire tokens.
//!
//! The sidecar understands a small closed vocabulary of string tokens for
//! consistency, concurrency and retry patterns. Each enum here maps onto that
//! vocabulary exhaustively, in both directions.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Serialize, Serializer};

use crate::error::Error;

/// Defines a closed option enum together with its wire token mapping.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// All values, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The token the sidecar expects for this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok($name::$variant), )+
                    _ => Err(Error::UnknownToken {
                        kind: $kind,
                        token: s.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Read guarantee requested from the backing store.
    ConsistencyMode, "consistency" {
        Eventual => "eventual",
        Strong => "strong",
    }
}

wire_enum! {
    /// Conflict resolution policy requested for writes.
    ConcurrencyMode, "concurrency" {
        FirstWrite => "first-write",
        LastWrite => "last-write",
    }
}

wire_enum! {
    /// Backoff pattern the sidecar applies when it retries a failed operation.
    RetryMode, "retry pattern" {
        Linear => "linear",
        Exponential => "exponential",
    }
}

impl Default for ConsistencyMode {
    fn default() -> Self {
        ConsistencyMode::Eventual
    }
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::LastWrite
    }
}

/// Retry policy forwarded to the sidecar. It is never executed locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryOptions {
    #[serde(rename = "pattern")]
    pub mode: RetryMode,
    /// Sent as whole milliseconds.
    #[serde(serialize_with = "serialize_millis")]
    pub interval: Duration,
    pub threshold: u32,
}

/// Options attached to every write and delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateOptions {
    pub concurrency: ConcurrencyMode,
    pub consistency: ConsistencyMode,
    #[serde(rename = "retryPolicy", skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOptions>,
}

fn serialize_millis<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokens() {
        assert_eq!(ConsistencyMode::Eventual.as_str(), "eventual");
        assert_eq!(ConsistencyMode::Strong.as_str(), "strong");
        assert_eq!(ConcurrencyMode::FirstWrite.as_str(), "first-write");
        assert_eq!(ConcurrencyMode::LastWrite.as_str(), "last-write");
        assert_eq!(RetryMode::Linear.as_str(), "linear");
        assert_eq!(RetryMode::Exponential.as_str(), "exponential");
    }

    #[test]
    fn test_tokens_parse_back() {
        for v in ConsistencyMode::ALL {
            assert_eq!(v.as_str().parse::<ConsistencyMode>().unwrap(), *v);
        }
        for v in ConcurrencyMode::ALL {
            assert_eq!(v.to_string().parse::<ConcurrencyMode>().unwrap(), *v);
        }
        for v in RetryMode::ALL {
            assert_eq!(v.as_str().parse::<RetryMode>().unwrap(), *v);
        }
    }

    #[test]
    fn test_unknown_token() {
        let e = "Strong".parse::<ConsistencyMode>().unwrap_err();
        assert_eq!(e.to_string(), "unknown consistency token: Strong");
        assert!("first_write".parse::<ConcurrencyMode>().is_err());
    }

    #[test]
    fn test_state_options_json() {
        let options = StateOptions {
            concurrency: ConcurrencyMode::FirstWrite,
            consistency: ConsistencyMode::Strong,
            retry: Some(RetryOptions {
                mode: RetryMode::Exponential,
                interval: Duration::from_secs(5),
                threshold: 10,
            }),
        };
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "concurrency": "first-write",
                "consistency": "strong",
                "retryPolicy": {
                    "pattern": "exponential",
                    "interval": 5000,
                    "threshold": 10,
                },
            })
        );
    }

    #[test]
    fn test_state_options_default_json() {
        assert_eq!(
            serde_json::to_value(StateOptions::default()).unwrap(),
            json!({
                "concurrency": "last-write",
                "consistency": "eventual",
            })
        );
    }
}
