use std::net::IpAddr;

use serde::Serialize;

/// How the firmware asked for the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    KeyValue,
}

impl OutputFormat {
    /// `json` selects JSON; anything else, including nothing, the key-value format.
    pub fn from_query(format: Option<&str>) -> Self {
        match format {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::KeyValue,
        }
    }
}

/// What the controller receives. Field order is the wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdjustmentResult {
    pub scale: i32,
    pub rd: i32,
    pub tz: u8,
    pub sunrise: u16,
    pub sunset: u16,
    pub eip: u32,
}

impl AdjustmentResult {
    pub fn to_query_string(&self) -> String {
        format!(
            "&scale={}&rd={}&tz={}&sunrise={}&sunset={}&eip={}",
            self.scale, self.rd, self.tz, self.sunrise, self.sunset, self.eip
        )
    }

    pub fn to_json(&self) -> String {
        // Plain integers only, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::KeyValue => self.to_query_string(),
        }
    }
}

/// First address of an `X-Forwarded-For` chain.
pub fn first_forwarded(header: &str) -> &str {
    header.split(',').next().unwrap_or_default().trim()
}

/// Pack an IPv4 address big-endian into a `u32`. Unparsable or non-IPv4 addresses give 0.
pub fn encode_ip(addr: &str) -> u32 {
    match addr.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => u32::from(v4),
        Ok(IpAddr::V6(v6)) => v6.to_ipv4_mapped().map_or(0, u32::from),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AdjustmentResult {
        AdjustmentResult {
            scale: 87,
            rd: -1,
            tz: 28,
            sunrise: 332,
            sunset: 1233,
            eip: 3232235777,
        }
    }

    #[test]
    fn key_value_format_has_fixed_order() {
        assert_eq!(
            result().to_query_string(),
            "&scale=87&rd=-1&tz=28&sunrise=332&sunset=1233&eip=3232235777"
        );
    }

    #[test]
    fn json_format_has_same_keys() {
        let value: serde_json::Value = serde_json::from_str(&result().to_json()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "scale": 87, "rd": -1, "tz": 28,
                "sunrise": 332, "sunset": 1233, "eip": 3232235777u32
            })
        );
    }

    #[test]
    fn format_flag() {
        assert_eq!(OutputFormat::from_query(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_query(Some("JSON")), OutputFormat::KeyValue);
        assert_eq!(OutputFormat::from_query(None), OutputFormat::KeyValue);
        assert!(result().render(OutputFormat::Json).starts_with('{'));
        assert!(result().render(OutputFormat::KeyValue).starts_with("&scale="));
    }

    #[test]
    fn packs_ipv4() {
        assert_eq!(encode_ip("192.168.1.1"), 3232235777);
        assert_eq!(encode_ip("0.0.0.0"), 0);
        assert_eq!(encode_ip("255.255.255.255"), u32::MAX);
        assert_eq!(encode_ip("::ffff:192.168.1.1"), 3232235777);
    }

    #[test]
    fn non_ipv4_is_zero() {
        assert_eq!(encode_ip("::1"), 0);
        assert_eq!(encode_ip("not-an-ip"), 0);
        assert_eq!(encode_ip(""), 0);
    }

    #[test]
    fn forwarded_chain_uses_first_hop() {
        assert_eq!(first_forwarded("203.0.113.7, 10.0.0.1, 10.0.0.2"), "203.0.113.7");
        assert_eq!(first_forwarded("203.0.113.7"), "203.0.113.7");
    }
}
