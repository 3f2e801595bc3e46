//! Clock tools: the current hour in UTC or in a caller-supplied zone

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::rpc::wrap_tool_content;
use crate::mcp::{Arguments, McpServer, RegistryError, ToolDescriptor, ToolFailure, ToolOutput};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourResponse {
    pub hour: u32,
    pub am_pm: String,
    pub message: String,
    pub current_time: String,
}

/// A caller-supplied zone: an IANA name, which follows daylight saving, or a
/// fixed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    pub fn localize(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Named(tz) => now.with_timezone(tz).fixed_offset(),
            Zone::Fixed(offset) => now.with_timezone(offset),
        }
    }
}

/// Accepts IANA names such as `Europe/Madrid`, the `Z`/`GMT` aliases and fixed
/// offsets such as `+02:00`, `-0530` or `+09`.
pub fn parse_timezone(value: &str) -> Result<Zone, ToolFailure> {
    let value = value.trim();
    if let Ok(tz) = value.parse::<Tz>() {
        return Ok(Zone::Named(tz));
    }
    parse_offset(value).map(Zone::Fixed)
}

fn parse_offset(value: &str) -> Result<FixedOffset, ToolFailure> {
    let invalid = || ToolFailure::new(format!("failed to load location for tz={value}"));

    if matches!(value.to_ascii_uppercase().as_str(), "UTC" | "Z" | "GMT") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, digits) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let digits = digits.replace(':', "");
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub fn hour_info(now: DateTime<Utc>, timezone: Option<&str>) -> Result<HourResponse, ToolFailure> {
    let local = match timezone {
        Some(tz) => parse_timezone(tz)?.localize(now),
        None => now.fixed_offset(),
    };
    let current_time = local.to_rfc3339_opts(SecondsFormat::Secs, true);

    let hour24 = local.hour();
    let hour = match hour24 % 12 {
        0 => 12,
        hour => hour,
    };
    let am_pm = if hour24 >= 12 { "PM" } else { "AM" };

    let message = match timezone {
        Some(tz) => format!("Current timestamp in {tz} is {current_time}"),
        None => format!("Current timestamp is {current_time}"),
    };

    Ok(HourResponse {
        hour,
        am_pm: am_pm.to_string(),
        message,
        current_time,
    })
}

fn timezone_argument(arguments: &Arguments) -> Result<Option<&str>, ToolFailure> {
    match arguments.get("timezone") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(tz)) if tz.trim().is_empty() => Ok(None),
        Some(Value::String(tz)) => Ok(Some(tz.as_str())),
        Some(_) => Err(ToolFailure::new("timezone must be a string")),
    }
}

fn hour_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "hour": { "type": "integer", "description": "Current hour in 12-hour format" },
            "amPm": { "type": "string", "description": "AM or PM indicator" },
            "message": { "type": "string", "description": "Message containing the current timestamp" },
            "currentTime": { "type": "string", "description": "Current time in ISO format" }
        },
        "required": ["hour", "amPm", "message", "currentTime"]
    })
}

/// Registers `get_hour` and `get_time`, and installs the clock as the fallback
/// handler for callers that send no method.
pub fn register(server: &mut McpServer, clock: Arc<dyn Clock>) -> Result<(), RegistryError> {
    let hour_clock = Arc::clone(&clock);
    server.register_tool(
        ToolDescriptor::new("get_hour", "Get the current timestamp in UTC", move |_, _| {
            ToolOutput::scalar(hour_info(hour_clock.now(), None)?)
        })
        .with_input_schema(json!({ "type": "object", "properties": {}, "required": [] }))
        .with_output_schema(hour_output_schema()),
    )?;

    let time_clock = Arc::clone(&clock);
    server.register_tool(
        ToolDescriptor::new(
            "get_time",
            "Get the current timestamp in the specified timezone",
            move |_, arguments| {
                let timezone = timezone_argument(arguments)?;
                ToolOutput::scalar(hour_info(time_clock.now(), timezone)?)
            },
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "Optional timezone: an IANA name like Europe/Madrid or a fixed offset like +02:00 (defaults to UTC)"
                }
            },
            "required": []
        }))
        .with_output_schema(hour_output_schema()),
    )?;

    // Legacy callers read `result.structuredContent` without going through tools/call.
    server.set_default_handler(move |_, arguments| {
        let timezone = timezone_argument(arguments)?;
        let info = hour_info(clock.now(), timezone)?;
        let value = serde_json::to_value(info)
            .map_err(|err| ToolFailure::new(format!("failed to encode hour info: {err}")))?;
        wrap_tool_content(value)
            .map(ToolOutput::Scalar)
            .map_err(|err| ToolFailure::new(format!("failed to encode hour info: {err}")))
    });

    Ok(())
}
