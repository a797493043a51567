use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, WeatherError};

/// Firmware-supplied tuning for the adjustment methods. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AdjustmentOptions {
    /// Baseline humidity, percent.
    pub bh: Option<f64>,
    /// Baseline temperature, °F.
    pub bt: Option<f64>,
    /// Baseline precipitation, inches.
    pub br: Option<f64>,
    /// Humidity weight, percent.
    pub h: Option<f64>,
    /// Temperature weight, percent.
    pub t: Option<f64>,
    /// Precipitation weight, percent.
    pub r: Option<f64>,
    /// Rain delay, hours.
    pub d: Option<f64>,
}

impl AdjustmentOptions {
    /// Decode the controller's `wto` parameter.
    ///
    /// The controller sends the body of a JSON object without its braces and with
    /// `\x` standing in for `%`, e.g. `"h":100,"t":100,"r":100,"bh":30`.
    pub fn from_wto(raw: &str) -> Result<Self> {
        let unescaped = raw.replace("\\x", "%");
        let decoded = urlencoding::decode(&unescaped)
            .map_err(|e| WeatherError::InvalidAdjustmentOptions(e.to_string()))?;

        let map: Map<String, Value> = serde_json::from_str(&format!("{{{decoded}}}"))
            .map_err(|e| WeatherError::InvalidAdjustmentOptions(e.to_string()))?;

        Ok(Self::from_map(&map))
    }

    /// Like [`from_wto`](Self::from_wto), but treats malformed input as "no options".
    pub fn from_wto_lenient(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match Self::from_wto(raw) {
            Ok(options) => Some(options),
            Err(e) => {
                tracing::debug!(error = %e, wto = raw, "ignoring adjustment options");
                None
            }
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let num = |key: &str| map.get(key).and_then(Value::as_f64);

        Self {
            bh: num("bh"),
            bt: num("bt"),
            br: num("br"),
            h: num("h"),
            t: num("t"),
            r: num("r"),
            d: num("d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_controller_fragment() {
        let opts = AdjustmentOptions::from_wto(r#""h":100,"t":50,"r":0,"bh":30,"bt":70,"br":0"#)
            .expect("valid options");

        assert_eq!(opts.h, Some(100.0));
        assert_eq!(opts.t, Some(50.0));
        assert_eq!(opts.r, Some(0.0));
        assert_eq!(opts.bh, Some(30.0));
        assert_eq!(opts.bt, Some(70.0));
        assert_eq!(opts.br, Some(0.0));
        assert_eq!(opts.d, None);
    }

    #[test]
    fn decodes_escaped_characters() {
        // \x22 is a double quote, \x3A a colon.
        let opts = AdjustmentOptions::from_wto(r"\x22d\x22\x3A48").expect("valid options");
        assert_eq!(opts.d, Some(48.0));
    }

    #[test]
    fn non_numeric_values_are_ignored() {
        let opts = AdjustmentOptions::from_wto(r#""h":"lots","t":80,"x":1"#).unwrap();
        assert_eq!(opts.h, None);
        assert_eq!(opts.t, Some(80.0));
    }

    #[test]
    fn empty_fragment_is_empty_options() {
        assert_eq!(AdjustmentOptions::from_wto("").unwrap(), AdjustmentOptions::default());
    }

    #[test]
    fn malformed_fragment_is_an_error() {
        let err = AdjustmentOptions::from_wto(r#""h":100}{"#).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidAdjustmentOptions(_)));
    }

    #[test]
    fn lenient_parse_drops_malformed_input() {
        assert_eq!(AdjustmentOptions::from_wto_lenient(Some(r#""h":100}}"#)), None);
        assert_eq!(AdjustmentOptions::from_wto_lenient(None), None);
        assert!(AdjustmentOptions::from_wto_lenient(Some(r#""h":100"#)).is_some());
    }
}
