//! EchoMap config tuning params
#![allow(missing_docs)]

/// Wrapper for the actual EchoMapTuningParams struct
/// so the widely used type def can be an Arc<>
pub mod tuning_params_struct {
    use std::collections::HashMap;

    macro_rules! mk_tune {
        ($($(#[doc = $doc:expr])* $i:ident: $t:ty = $d:expr,)*) => {
            /// Lifecycle tuning parameters.
            /// This is serialized carefully so all the values can be represented
            /// as strings in config files - and we will be able to proceed with
            /// a printed warning for tuning params that are removed, but still
            /// specified in configs.
            #[non_exhaustive]
            #[derive(Clone, Debug, PartialEq)]
            pub struct EchoMapTuningParams {
                $(
                    $(#[doc = $doc])*
                    pub $i: $t,
                )*
            }

            impl Default for EchoMapTuningParams {
                fn default() -> Self {
                    Self {
                        $(
                            $i: $d,
                        )*
                    }
                }
            }

            impl serde::Serialize for EchoMapTuningParams {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    use serde::ser::SerializeMap;
                    let mut m = serializer.serialize_map(None)?;
                    $(
                        m.serialize_entry(
                            stringify!($i),
                            &format!("{}", &self.$i),
                        )?;
                    )*
                    m.end()
                }
            }

            impl<'de> serde::Deserialize<'de> for EchoMapTuningParams {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let result = <HashMap<String, String>>::deserialize(deserializer)?;
                    let mut out = EchoMapTuningParams::default();
                    for (k, v) in result.into_iter() {
                        match k.as_str() {
                            $(
                                stringify!($i) => match v.parse::<$t>() {
                                    Ok(v) => out.$i = v,
                                    Err(e) => tracing::warn!("failed to parse {}: {}", k, e),
                                },
                            )*
                            _ => tracing::warn!("INVALID TUNING PARAM: '{}'", k),
                        }
                    }
                    Ok(out)
                }
            }
        };
    }

    mk_tune! {
        /// How long a ping stays live before the sweep may evict it.
        /// [Default: 8s]
        ping_ttl_ms: u64 = 8_000,

        /// Delay between sweep passes over the registry.
        /// [Default: 1s]
        sweep_interval_ms: u64 = 1_000,

        /// Cadence at which the simulated ambient feed emits a ping.
        /// [Default: 2.5s]
        ambient_interval_ms: u64 = 2_500,

        /// Hard cap on concurrently held pings. Inserting past the cap
        /// silently drops the oldest entries.
        /// [Default: 50]
        max_active_pings: usize = 50,

        /// How long a location resolve may run before it is abandoned
        /// and reported as a timeout.
        /// [Default: 10s]
        resolve_timeout_ms: u64 = 10_000,

        /// Depth of the inbound transport channel. Subscribers slower
        /// than this will stall the hub, not lose messages.
        /// [Default: 32]
        inbound_channel_depth: usize = 32,
    }

    impl EchoMapTuningParams {
        /// Get the ping_ttl_ms param as a proper Duration
        pub fn ping_ttl(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.ping_ttl_ms)
        }

        /// Get the sweep_interval_ms param as a proper Duration
        pub fn sweep_interval(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.sweep_interval_ms)
        }

        /// Get the ambient_interval_ms param as a proper Duration
        pub fn ambient_interval(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.ambient_interval_ms)
        }

        /// Get the resolve_timeout_ms param as a proper Duration
        pub fn resolve_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.resolve_timeout_ms)
        }
    }
}

/// We don't want to clone these tuning params over-and-over.
/// They should normally be passed around as an Arc.
pub type EchoMapTuningParams = std::sync::Arc<tuning_params_struct::EchoMapTuningParams>;

/// Configure an EchoMap session.
#[non_exhaustive]
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EchoMapConfig {
    /// Lifecycle tuning parameters. These are managed loosely,
    /// as they are subject to change. If you specify a tuning parameter
    /// that no longer exists, or a value that does not parse,
    /// a warning will be printed in the tracing log.
    #[serde(default)]
    pub tuning_params: EchoMapTuningParams,

    /// All tracing logs from session tasks will be instrumented to contain
    /// this string, so that logs from multiple sessions in the same process
    /// can be disambiguated.
    #[serde(default)]
    pub tracing_scope: Option<String>,
}

impl EchoMapConfig {
    /// Return a copy with the tuning params altered
    pub fn tune(
        mut self,
        f: impl Fn(
            tuning_params_struct::EchoMapTuningParams,
        ) -> tuning_params_struct::EchoMapTuningParams,
    ) -> Self {
        let tp = (*self.tuning_params).clone();
        self.tuning_params = std::sync::Arc::new(f(tp));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let tp = tuning_params_struct::EchoMapTuningParams::default();
        assert_eq!(tp.ping_ttl_ms, 8_000);
        assert_eq!(tp.sweep_interval_ms, 1_000);
        assert_eq!(tp.ambient_interval_ms, 2_500);
        assert_eq!(tp.max_active_pings, 50);
        assert_eq!(tp.resolve_timeout_ms, 10_000);
        assert_eq!(tp.inbound_channel_depth, 32);
        assert_eq!(tp.ping_ttl(), std::time::Duration::from_millis(8_000));
    }

    #[test]
    fn tuning_params_parse_from_a_string_map() {
        let tp: tuning_params_struct::EchoMapTuningParams = serde_json::from_str(
            r#"{
                "ping_ttl_ms": "250",
                "max_active_pings": "3",
                "no_such_param": "anything",
                "sweep_interval_ms": "not-a-number"
            }"#,
        )
        .unwrap();
        assert_eq!(tp.ping_ttl_ms, 250);
        assert_eq!(tp.max_active_pings, 3);
        // unknown keys and bad values fall back to the default with a warning
        assert_eq!(tp.sweep_interval_ms, 1_000);
    }

    #[test]
    fn tuning_params_serialize_as_strings() {
        let json =
            serde_json::to_value(tuning_params_struct::EchoMapTuningParams::default()).unwrap();
        assert_eq!(json["ping_ttl_ms"], "8000");
        assert_eq!(json["inbound_channel_depth"], "32");
    }

    #[test]
    fn tune_replaces_the_shared_params() {
        let config = EchoMapConfig::default().tune(|mut tp| {
            tp.ping_ttl_ms = 42;
            tp
        });
        assert_eq!(config.tuning_params.ping_ttl_ms, 42);
        assert_eq!(config.tuning_params.sweep_interval_ms, 1_000);
    }
}
