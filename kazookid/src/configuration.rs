use serde::{Deserialize, Serialize};

/// Ordering between recording an invocation and raising its configured fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultRecording {
    /// Append the invocation to the history, then raise: a failing call still reports
    /// `was_called`.
    #[default]
    RecordThenRaise,

    /// Raise before anything is recorded: a failing call never reports `was_called`.
    RaiseWithoutRecording,
}

/// Settings of a [Substitute][crate::Substitute].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstituteConfiguration {
    /// Whether invocations raising a configured fault are recorded.
    pub fault_recording: FaultRecording,

    /// When `true` the [get][crate::GET_MEMBER] member reads the substitute mapping if it has no
    /// configured return value.
    pub map_style_get: bool,
}

impl Default for SubstituteConfiguration {
    fn default() -> Self {
        Self {
            fault_recording: FaultRecording::default(),
            map_style_get: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_partial_configuration_with_defaults() {
        let configuration: SubstituteConfiguration =
            serde_json::from_str(r#"{ "fault_recording": "raise_without_recording" }"#).unwrap();

        assert_eq!(
            SubstituteConfiguration {
                fault_recording: FaultRecording::RaiseWithoutRecording,
                map_style_get: true,
            },
            configuration
        );
    }

    #[test]
    fn deserialize_empty_configuration_to_default() {
        let configuration: SubstituteConfiguration = serde_json::from_str("{}").unwrap();

        assert_eq!(SubstituteConfiguration::default(), configuration);
        assert_eq!(
            FaultRecording::RecordThenRaise,
            configuration.fault_recording
        );
    }
}
