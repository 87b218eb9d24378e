//! Helpers available in every template.
//!
//! | Helper | Parameters | Output |
//! |--------|------------|--------|
//! | `date`, `dateLong`, `dateMedium`, `dateShort` | value | formatted date |
//! | `time`, `timeLong`, `timeMedium`, `timeShort` | value, meridiem | formatted time |
//! | `timeZone` | value, meridiem, style | time with zone name |
//! | `dateTime`, `dateTimeLong`, `dateTimeMedium`, `dateTimeShort` | value, meridiem | date and time |
//! | `dateTimeZone` | value, meridiem, style | date and time with zone name |
//! | `relTime` | value, min, max | `6 months ago`, `in 3 days` |
//! | `number` | | 1-based loop index |
//! | `link` | url, text | `[text](url)` |
//! | `button` | url, text | `<a class="button">` element |
//! | `list` | items | `- a` lines |
//!
//! Date values may be RFC 3339 strings, `YYYY-MM-DD` strings or integer
//! milliseconds since the Unix epoch. A missing value means "now".

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use minijinja::value::ValueKind;
use minijinja::Value;

use super::{HelperDescriptor, HelperError, HelperSet};
use crate::context::HelperContext;
use crate::datetime::{FormatOptions, Meridiem, RelativeOptions, Style, ZoneNameStyle};
use crate::markup::{Element, HelperOutput};

const DATE_PARAMS: &[&str] = &["value"];
const TIME_PARAMS: &[&str] = &["value", "meridiem"];
const ZONE_PARAMS: &[&str] = &["value", "meridiem", "style"];

/// Attributes `button` always sets; named values cannot replace them.
const BUTTON_FIXED: &[&str] = &["href", "class", "target", "text"];

/// Returns the built-in helper set.
pub fn default_helpers() -> HelperSet {
    let mut helpers = HelperSet::new();

    let formats: &[(&str, &[&str], Style)] = &[
        ("date", DATE_PARAMS, Style::Date),
        ("dateLong", DATE_PARAMS, Style::DateLong),
        ("dateMedium", DATE_PARAMS, Style::DateMedium),
        ("dateShort", DATE_PARAMS, Style::DateShort),
        ("time", TIME_PARAMS, Style::TimeMedium),
        ("timeZone", ZONE_PARAMS, Style::TimeWithZone),
        ("timeLong", TIME_PARAMS, Style::TimeLong),
        ("timeMedium", TIME_PARAMS, Style::TimeMedium),
        ("timeShort", TIME_PARAMS, Style::TimeShort),
        ("dateTime", TIME_PARAMS, Style::DateTimeLong),
        ("dateTimeZone", ZONE_PARAMS, Style::DateTimeWithZone),
        ("dateTimeLong", TIME_PARAMS, Style::DateTimeLong),
        ("dateTimeMedium", TIME_PARAMS, Style::DateTimeMedium),
        ("dateTimeShort", TIME_PARAMS, Style::DateTimeShort),
    ];
    for &(name, params, style) in formats {
        helpers.insert(name, date_helper(params, style));
    }

    helpers.insert("relTime", HelperDescriptor::builtin(&["value", "min", "max"], rel_time));
    helpers.insert("number", HelperDescriptor::builtin(&[], number));
    helpers.insert("link", HelperDescriptor::builtin(&["url", "text"], link));
    helpers.insert("button", HelperDescriptor::builtin(&["url", "text"], button));
    helpers.insert("list", HelperDescriptor::builtin(&["items"], list));

    helpers
}

fn date_helper(params: &'static [&'static str], style: Style) -> HelperDescriptor {
    HelperDescriptor::builtin(params, move |args, ctx| {
        let value = date_value("value", arg(args, 0), ctx)?;

        let mut options = FormatOptions::new(style);
        if let Some(name) = string_arg("meridiem", arg(args, 1))? {
            options = options.meridiem(Meridiem::from_name(name).ok_or_else(|| {
                HelperError::invalid_argument("meridiem", format!("unknown style `{name}`"))
            })?);
        }
        if let Some(name) = string_arg("style", arg(args, 2))? {
            options = options.zone_name(ZoneNameStyle::from_name(name).ok_or_else(|| {
                HelperError::invalid_argument("style", format!("unknown time zone name `{name}`"))
            })?);
        }

        Ok(ctx.options.formatter.format(value, &options).into())
    })
}

fn rel_time(args: &[Value], ctx: &HelperContext<'_>) -> Result<HelperOutput, HelperError> {
    let value = date_value("value", arg(args, 0), ctx)?;
    let options = RelativeOptions {
        min: optional_date("min", arg(args, 1))?,
        max: optional_date("max", arg(args, 2))?,
    };
    let now = ctx.options.clock.now();
    Ok(ctx.options.formatter.relative(value, now, &options).into())
}

fn number(_args: &[Value], ctx: &HelperContext<'_>) -> Result<HelperOutput, HelperError> {
    Ok(match ctx.data.index {
        Some(index) => Value::from(index + 1).into(),
        None => HelperOutput::empty(),
    })
}

fn link(args: &[Value], _ctx: &HelperContext<'_>) -> Result<HelperOutput, HelperError> {
    Ok(HelperOutput::safe(format!(
        "[{}]({})",
        arg(args, 1),
        arg(args, 0)
    )))
}

fn button(args: &[Value], ctx: &HelperContext<'_>) -> Result<HelperOutput, HelperError> {
    let mut el = Element::new("a")
        .attr("href", arg(args, 0).to_string())
        .attr("class", "button")
        .attr("target", "_blank")
        .text(arg(args, 1).to_string());

    let forwarded = ctx
        .extra
        .iter()
        .filter(|(name, value)| value.is_true() && !BUTTON_FIXED.contains(&name.as_str()));
    for (name, value) in forwarded {
        el = el.attr(name.clone(), value.to_string());
    }
    Ok(el.into())
}

fn list(args: &[Value], _ctx: &HelperContext<'_>) -> Result<HelperOutput, HelperError> {
    let items = arg(args, 0);
    if items.is_undefined() || items.is_none() {
        return Ok(HelperOutput::empty());
    }
    if !matches!(items.kind(), ValueKind::Seq | ValueKind::Iterable) {
        return Err(HelperError::invalid_argument(
            "items",
            format!("expected a sequence, got {}", items.kind()),
        ));
    }

    let iter = items
        .try_iter()
        .map_err(|e| HelperError::invalid_argument("items", e.to_string()))?;
    let lines: Vec<String> = iter.map(|item| format!("- {item}")).collect();
    Ok(lines.join("\n").into())
}

fn arg(args: &[Value], index: usize) -> &Value {
    static UNDEFINED: Value = Value::UNDEFINED;
    args.get(index).unwrap_or(&UNDEFINED)
}

fn string_arg<'a>(name: &str, value: &'a Value) -> Result<Option<&'a str>, HelperError> {
    if value.is_undefined() || value.is_none() {
        return Ok(None);
    }
    value
        .as_str()
        .map(Some)
        .ok_or_else(|| HelperError::invalid_argument(name, "expected a string"))
}

/// Reads a date argument, defaulting to the injected clock's "now".
fn date_value(
    name: &str,
    value: &Value,
    ctx: &HelperContext<'_>,
) -> Result<DateTime<Utc>, HelperError> {
    Ok(optional_date(name, value)?.unwrap_or_else(|| ctx.options.clock.now()))
}

fn optional_date(name: &str, value: &Value) -> Result<Option<DateTime<Utc>>, HelperError> {
    if value.is_undefined() || value.is_none() {
        return Ok(None);
    }
    if let Some(text) = value.as_str() {
        return parse_date(text)
            .map(Some)
            .ok_or_else(|| HelperError::invalid_argument(name, format!("unparseable date `{text}`")));
    }
    if value.kind() == ValueKind::Number {
        if let Some(millis) = value.as_i64() {
            return Utc
                .timestamp_millis_opt(millis)
                .single()
                .map(Some)
                .ok_or_else(|| HelperError::invalid_argument(name, "timestamp out of range"));
        }
    }
    Err(HelperError::invalid_argument(
        name,
        format!("expected a date, got {}", value.kind()),
    ))
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::context::AmbientOptions;
    use crate::datetime::{ChronoFormatter, FixedClock, TimeZoneSpec};
    use crate::markup::transform;

    fn options() -> AmbientOptions {
        AmbientOptions::new()
            .with_clock(Arc::new(FixedClock::parse("2025-01-01T12:00:00Z").unwrap()))
            .with_formatter(Arc::new(ChronoFormatter::new(TimeZoneSpec::new(
                -300,
                "EST",
                "Eastern Standard Time",
                "ET",
                "Eastern Time",
            ))))
    }

    fn call(name: &str, args: &[Value]) -> Result<String, HelperError> {
        let options = options();
        let ctx = HelperContext::new(&options);
        call_with(name, args, &ctx)
    }

    fn call_with(name: &str, args: &[Value], ctx: &HelperContext<'_>) -> Result<String, HelperError> {
        let helpers = default_helpers();
        let helper = helpers.get(name).unwrap();
        helper.invoke(args, ctx).map(|out| transform(out).to_string())
    }

    #[test]
    fn all_helpers_registered() {
        let helpers = default_helpers();
        for name in [
            "date",
            "dateLong",
            "dateMedium",
            "dateShort",
            "time",
            "timeZone",
            "timeLong",
            "timeMedium",
            "timeShort",
            "dateTime",
            "dateTimeZone",
            "dateTimeLong",
            "dateTimeMedium",
            "dateTimeShort",
            "relTime",
            "number",
            "link",
            "button",
            "list",
        ] {
            assert!(helpers.contains(name), "missing {name}");
        }
        assert_eq!(helpers.len(), 19);
    }

    #[test]
    fn declared_params() {
        let helpers = default_helpers();
        assert_eq!(helpers.get("timeZone").unwrap().params(), &["value", "meridiem", "style"]);
        assert_eq!(helpers.get("link").unwrap().params(), &["url", "text"]);
        assert!(helpers.get("number").unwrap().params().is_empty());
    }

    #[test]
    fn dates_default_to_now() {
        assert_eq!(call("date", &[]).unwrap(), "2025-01-01");
        assert_eq!(call("dateLong", &[]).unwrap(), "January 1, 2025");
        assert_eq!(call("dateTime", &[]).unwrap(), "January 1, 2025 at 7:00am");
        assert_eq!(call("timeZone", &[]).unwrap(), "7:00am EST");
    }

    #[test]
    fn date_value_forms() {
        assert_eq!(
            call("dateShort", &[Value::from("2024-03-05T10:00:00Z")]).unwrap(),
            "3/5/2024"
        );
        // midnight UTC is the previous evening in EST
        assert_eq!(call("dateShort", &[Value::from("2024-03-05")]).unwrap(), "3/4/2024");
        assert_eq!(
            call("date", &[Value::from(1_735_732_800_000_i64)]).unwrap(),
            "2025-01-01"
        );
    }

    #[test]
    fn meridiem_and_zone_style() {
        assert_eq!(
            call("timeMedium", &[Value::UNDEFINED, Value::from("caps")]).unwrap(),
            "7:00AM"
        );
        assert_eq!(
            call(
                "dateTimeZone",
                &[Value::UNDEFINED, Value::UNDEFINED, Value::from("long")]
            )
            .unwrap(),
            "January 1, 2025 at 7:00am Eastern Standard Time"
        );
    }

    #[test]
    fn bad_date_values_fail() {
        let err = call("date", &[Value::from("yesterday-ish")]).unwrap_err();
        assert!(matches!(err, HelperError::InvalidArgument { ref name, .. } if name == "value"));

        let err = call("date", &[Value::from(vec![1, 2])]).unwrap_err();
        assert!(matches!(err, HelperError::InvalidArgument { .. }));

        let err = call("time", &[Value::UNDEFINED, Value::from("loud")]).unwrap_err();
        assert!(matches!(err, HelperError::InvalidArgument { ref name, .. } if name == "meridiem"));
    }

    #[test]
    fn rel_time_uses_clock() {
        assert_eq!(
            call("relTime", &[Value::from("2024-07-01T12:00:00Z")]).unwrap(),
            "6 months ago"
        );
        assert_eq!(
            call("relTime", &[Value::from("2025-01-04T12:00:00Z")]).unwrap(),
            "in 3 days"
        );
    }

    #[test]
    fn rel_time_bounds() {
        let out = call(
            "relTime",
            &[
                Value::from("2024-07-01T12:00:00Z"),
                Value::from("2024-12-01"),
            ],
        )
        .unwrap();
        assert_eq!(out, "July 1, 2024");
    }

    #[test]
    fn number_reads_loop_index() {
        let options = options();
        assert_eq!(call("number", &[]).unwrap(), "");

        let ctx = HelperContext::new(&options).with_index(0);
        assert_eq!(call_with("number", &[], &ctx).unwrap(), "1");

        // explicit arguments are ignored
        let ctx = HelperContext::new(&options).with_index(4);
        assert_eq!(call_with("number", &[Value::from(100)], &ctx).unwrap(), "5");
    }

    #[test]
    fn link_is_safe() {
        let helpers = default_helpers();
        let options = options();
        let out = helpers
            .get("link")
            .unwrap()
            .invoke(
                &[Value::from("http://example.com"), Value::from("Tom & Jerry")],
                &HelperContext::new(&options),
            )
            .unwrap();
        let value = transform(out);
        assert!(value.is_safe());
        assert_eq!(value.to_string(), "[Tom & Jerry](http://example.com)");
    }

    #[test]
    fn button_element() {
        assert_eq!(
            call("button", &[Value::from("http://example.com"), Value::from("Go")]).unwrap(),
            r#"<a href="http://example.com" class="button" target="_blank">Go</a>"#
        );
    }

    #[test]
    fn button_forwards_extra() {
        let options = options();
        let mut ctx = HelperContext::new(&options);
        ctx.extra = BTreeMap::from([("rel".to_string(), Value::from("noopener"))]);
        assert_eq!(
            call_with("button", &[Value::from("/x"), Value::from("Go")], &ctx).unwrap(),
            r#"<a href="/x" class="button" target="_blank" rel="noopener">Go</a>"#
        );
    }

    #[test]
    fn button_skips_falsy_extra() {
        let options = options();
        let mut ctx = HelperContext::new(&options);
        ctx.extra = BTreeMap::from([
            ("rel".to_string(), Value::from(())),
            ("hidden".to_string(), Value::from(false)),
            ("n".to_string(), Value::from(0)),
            ("title".to_string(), Value::from("")),
            ("id".to_string(), Value::from("cta")),
        ]);
        assert_eq!(
            call_with("button", &[Value::from("/x"), Value::from("Go")], &ctx).unwrap(),
            r#"<a href="/x" class="button" target="_blank" id="cta">Go</a>"#
        );
    }

    #[test]
    fn button_keeps_fixed_attributes() {
        let options = options();
        let mut ctx = HelperContext::new(&options);
        ctx.extra = BTreeMap::from([
            ("href".to_string(), Value::from("/y")),
            ("class".to_string(), Value::from("evil")),
            ("target".to_string(), Value::from("_self")),
            ("text".to_string(), Value::from("Other")),
        ]);
        assert_eq!(
            call_with("button", &[Value::from("/x"), Value::from("Go")], &ctx).unwrap(),
            r#"<a href="/x" class="button" target="_blank">Go</a>"#
        );
    }

    #[test]
    fn list_items() {
        assert_eq!(
            call("list", &[Value::from(vec!["one", "two", "three"])]).unwrap(),
            "- one\n- two\n- three"
        );
        assert_eq!(call("list", &[Value::from(Vec::<String>::new())]).unwrap(), "");
        assert_eq!(call("list", &[]).unwrap(), "");
        assert!(call("list", &[Value::from("abc")]).is_err());
    }

    #[test]
    fn parse_date_forms() {
        assert!(parse_date("2025-01-01T00:00:00+02:00").is_some());
        assert_eq!(
            parse_date("2025-01-01").unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert!(parse_date("01/01/2025").is_none());
    }
}
