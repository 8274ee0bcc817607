//! XML encoding of run records
//!
//! ```text
//! <run id=".." url=".." started=".." state="completed">
//!   <properties>
//!     <property key="http.status" type="int" value="200"/>
//!     <property key="dns.addresses" type="list"><item value=".."/></property>
//!     <property key="http.headers" type="map"><entry key=".." value=".."/></property>
//!   </properties>
//!   <steps>
//!     <step name="http" kind="action" outcome="failed" started=".." duration_ns="..">
//!       <error code="fault" message=".."/>
//!       <properties>..</properties>
//!     </step>
//!   </steps>
//! </run>
//! ```
//!
//! All data lives in attributes so whitespace is preserved exactly.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use url::Url;
use uuid::Uuid;

use super::CodecError;
use crate::property::{PropertyKey, PropertyStore, Value};
use crate::record::{RunRecord, StepResult};
use crate::types::{Outcome, RunState, StepError, StepKind, StepTiming};

type Result<T> = std::result::Result<T, CodecError>;

// ============================================================================
// Writing
// ============================================================================

pub(super) fn write(record: &RunRecord) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut run = BytesStart::new("run");
    run.push_attribute(("id", record.id.to_string().as_str()));
    if let Some(url) = &record.url {
        run.push_attribute(("url", url.as_str()));
    }
    run.push_attribute(("started", format_time(&record.started).as_str()));
    run.push_attribute(("state", record.state.to_string().as_str()));
    if let Some(reason) = &record.decline_reason {
        run.push_attribute(("decline_reason", reason.as_str()));
    }
    writer.write_event(Event::Start(run))?;

    if let Some(properties) = &record.properties {
        write_properties(&mut writer, properties)?;
    }

    writer.write_event(Event::Start(BytesStart::new("steps")))?;
    for step in &record.steps {
        write_step(&mut writer, step)?;
    }
    writer.write_event(Event::End(BytesEnd::new("steps")))?;

    writer.write_event(Event::End(BytesEnd::new("run")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_step<W: Write>(writer: &mut Writer<W>, step: &StepResult) -> Result<()> {
    let mut el = BytesStart::new("step");
    el.push_attribute(("name", step.name()));
    el.push_attribute(("kind", step.kind().to_string().as_str()));
    el.push_attribute(("outcome", step.outcome().to_string().as_str()));
    el.push_attribute(("started", format_time(&step.started()).as_str()));
    el.push_attribute(("duration_ns", format_duration(step.duration())?.as_str()));
    writer.write_event(Event::Start(el))?;

    if let Some(error) = step.error() {
        let mut err = BytesStart::new("error");
        err.push_attribute(("code", error.code.as_str()));
        err.push_attribute(("message", error.message.as_str()));
        writer.write_event(Event::Empty(err))?;
    }
    write_properties(writer, step.properties())?;

    writer.write_event(Event::End(BytesEnd::new("step")))?;
    Ok(())
}

fn write_properties<W: Write>(writer: &mut Writer<W>, store: &PropertyStore) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("properties")))?;
    for (key, value) in store.persistent() {
        write_property(writer, key, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("properties")))?;
    Ok(())
}

fn write_property<W: Write>(
    writer: &mut Writer<W>,
    key: &PropertyKey,
    value: &Value,
) -> Result<()> {
    let mut el = BytesStart::new("property");
    el.push_attribute(("key", key.as_str()));
    el.push_attribute(("type", value.tag()));

    match value {
        Value::List(items) => {
            writer.write_event(Event::Start(el))?;
            for item in items {
                let mut e = BytesStart::new("item");
                e.push_attribute(("value", item.as_str()));
                writer.write_event(Event::Empty(e))?;
            }
            writer.write_event(Event::End(BytesEnd::new("property")))?;
        }
        Value::Map(entries) => {
            writer.write_event(Event::Start(el))?;
            for (k, v) in entries {
                let mut e = BytesStart::new("entry");
                e.push_attribute(("key", k.as_str()));
                e.push_attribute(("value", v.as_str()));
                writer.write_event(Event::Empty(e))?;
            }
            writer.write_event(Event::End(BytesEnd::new("property")))?;
        }
        scalar => {
            el.push_attribute(("value", scalar_text(scalar)?.as_str()));
            writer.write_event(Event::Empty(el))?;
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => v.clone(),
        Value::Bytes(v) => STANDARD.encode(v),
        Value::Timestamp(v) => format_time(v),
        Value::Duration(v) => format_duration(*v)?,
        Value::List(_) | Value::Map(_) => unreachable!("collections are written as child elements"),
    })
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn format_duration(duration: Duration) -> Result<String> {
    let nanos = u64::try_from(duration.as_nanos())
        .map_err(|_| CodecError::invalid("duration", "does not fit in 64-bit nanoseconds"))?;
    Ok(nanos.to_string())
}

// ============================================================================
// Reading
// ============================================================================

enum Node<'a> {
    Open { element: BytesStart<'a>, empty: bool },
    Close(String),
}

struct Events<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Events<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(bytes),
        }
    }

    /// Next element boundary; declarations, comments and text are skipped
    fn next(&mut self) -> Result<Node<'a>> {
        loop {
            match self.reader.read_event()? {
                Event::Start(element) => return Ok(Node::Open { element, empty: false }),
                Event::Empty(element) => return Ok(Node::Open { element, empty: true }),
                Event::End(end) => return Ok(Node::Close(name_of(end.name().as_ref()))),
                Event::Eof => return Err(CodecError::UnexpectedEof),
                _ => continue,
            }
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<()> {
        match self.next()? {
            Node::Close(n) if n == name => Ok(()),
            Node::Close(n) => Err(CodecError::UnexpectedElement(format!("/{}", n))),
            Node::Open { element, .. } => Err(unexpected(&element)),
        }
    }
}

fn name_of(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn unexpected(element: &BytesStart<'_>) -> CodecError {
    CodecError::UnexpectedElement(name_of(element.name().as_ref()))
}

fn attr(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match element.try_get_attribute(name)? {
        Some(a) => Ok(Some(a.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required(element: &BytesStart<'_>, tag: &'static str, name: &'static str) -> Result<String> {
    attr(element, name)?.ok_or(CodecError::MissingAttribute {
        element: tag,
        attribute: name,
    })
}

fn parse_time(field: &'static str, text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CodecError::invalid(field, e))
}

fn parse_duration(field: &'static str, text: &str) -> Result<Duration> {
    text.parse::<u64>()
        .map(Duration::from_nanos)
        .map_err(|e| CodecError::invalid(field, e))
}

pub(super) fn read(bytes: &[u8]) -> Result<RunRecord> {
    let mut events = Events::new(bytes);

    let (run, empty) = match events.next()? {
        Node::Open { element, empty } if element.name().as_ref() == b"run" => (element, empty),
        Node::Open { element, .. } => return Err(unexpected(&element)),
        Node::Close(n) => return Err(CodecError::UnexpectedElement(format!("/{}", n))),
    };

    let id = Uuid::parse_str(&required(&run, "run", "id")?)
        .map_err(|e| CodecError::invalid("id", e))?;
    let url = attr(&run, "url")?
        .map(|u| Url::parse(&u).map_err(|e| CodecError::invalid("url", e)))
        .transpose()?;
    let started = parse_time("started", &required(&run, "run", "started")?)?;
    let state: RunState = required(&run, "run", "state")?
        .parse()
        .map_err(|e| CodecError::invalid("state", e))?;
    let decline_reason = attr(&run, "decline_reason")?;

    let mut properties = None;
    let mut steps = Vec::new();

    if !empty {
        loop {
            match events.next()? {
                Node::Open { element, empty } => match element.name().as_ref() {
                    b"properties" => properties = Some(read_properties(&mut events, empty)?),
                    b"steps" => {
                        if !empty {
                            read_steps(&mut events, &mut steps)?;
                        }
                    }
                    _ => return Err(unexpected(&element)),
                },
                Node::Close(n) if n == "run" => break,
                Node::Close(n) => return Err(CodecError::UnexpectedElement(format!("/{}", n))),
            }
        }
    }

    Ok(RunRecord {
        id,
        url,
        started,
        state,
        steps,
        properties,
        decline_reason,
    })
}

fn read_steps(events: &mut Events<'_>, steps: &mut Vec<StepResult>) -> Result<()> {
    loop {
        match events.next()? {
            Node::Open { element, empty } if element.name().as_ref() == b"step" => {
                steps.push(read_step(events, &element, empty)?);
            }
            Node::Open { element, .. } => return Err(unexpected(&element)),
            Node::Close(n) if n == "steps" => return Ok(()),
            Node::Close(n) => return Err(CodecError::UnexpectedElement(format!("/{}", n))),
        }
    }
}

fn read_step(events: &mut Events<'_>, element: &BytesStart<'_>, empty: bool) -> Result<StepResult> {
    let name = required(element, "step", "name")?;
    let kind: StepKind = required(element, "step", "kind")?
        .parse()
        .map_err(|e| CodecError::invalid("kind", e))?;
    let outcome: Outcome = required(element, "step", "outcome")?
        .parse()
        .map_err(|e| CodecError::invalid("outcome", e))?;
    let started = parse_time("started", &required(element, "step", "started")?)?;
    let duration = parse_duration("duration_ns", &required(element, "step", "duration_ns")?)?;

    let mut error = None;
    let mut properties = PropertyStore::new();

    if !empty {
        loop {
            match events.next()? {
                Node::Open { element, empty } => match element.name().as_ref() {
                    b"error" => {
                        error = Some(StepError::new(
                            required(&element, "error", "code")?,
                            required(&element, "error", "message")?,
                        ));
                        if !empty {
                            events.expect_close("error")?;
                        }
                    }
                    b"properties" => properties = read_properties(events, empty)?,
                    _ => return Err(unexpected(&element)),
                },
                Node::Close(n) if n == "step" => break,
                Node::Close(n) => return Err(CodecError::UnexpectedElement(format!("/{}", n))),
            }
        }
    }

    Ok(StepResult::new(
        name,
        kind,
        StepTiming::new(started, duration),
        outcome,
        error,
        properties,
    ))
}

fn read_properties(events: &mut Events<'_>, empty: bool) -> Result<PropertyStore> {
    let mut store = PropertyStore::new();
    if empty {
        return Ok(store);
    }

    loop {
        match events.next()? {
            Node::Open { element, empty } if element.name().as_ref() == b"property" => {
                let key = PropertyKey::new(required(&element, "property", "key")?)?;
                let value = read_value(events, &element, empty)?;
                store.set(key, value);
            }
            Node::Open { element, .. } => return Err(unexpected(&element)),
            Node::Close(n) if n == "properties" => return Ok(store),
            Node::Close(n) => return Err(CodecError::UnexpectedElement(format!("/{}", n))),
        }
    }
}

fn read_value(events: &mut Events<'_>, element: &BytesStart<'_>, empty: bool) -> Result<Value> {
    let tag = required(element, "property", "type")?;

    match tag.as_str() {
        "list" => {
            let mut items = Vec::new();
            if !empty {
                loop {
                    match events.next()? {
                        Node::Open { element, empty } if element.name().as_ref() == b"item" => {
                            items.push(required(&element, "item", "value")?);
                            if !empty {
                                events.expect_close("item")?;
                            }
                        }
                        Node::Open { element, .. } => return Err(unexpected(&element)),
                        Node::Close(n) if n == "property" => break,
                        Node::Close(n) => {
                            return Err(CodecError::UnexpectedElement(format!("/{}", n)))
                        }
                    }
                }
            }
            Ok(Value::List(items))
        }
        "map" => {
            let mut entries = BTreeMap::new();
            if !empty {
                loop {
                    match events.next()? {
                        Node::Open { element, empty } if element.name().as_ref() == b"entry" => {
                            entries.insert(
                                required(&element, "entry", "key")?,
                                required(&element, "entry", "value")?,
                            );
                            if !empty {
                                events.expect_close("entry")?;
                            }
                        }
                        Node::Open { element, .. } => return Err(unexpected(&element)),
                        Node::Close(n) if n == "property" => break,
                        Node::Close(n) => {
                            return Err(CodecError::UnexpectedElement(format!("/{}", n)))
                        }
                    }
                }
            }
            Ok(Value::Map(entries))
        }
        scalar => {
            let text = required(element, "property", "value")?;
            let value = parse_scalar(scalar, &text)?;
            if !empty {
                events.expect_close("property")?;
            }
            Ok(value)
        }
    }
}

fn parse_scalar(tag: &str, text: &str) -> Result<Value> {
    let value = match tag {
        "bool" => Value::Bool(text.parse().map_err(|e| CodecError::invalid("bool", e))?),
        "int" => Value::Int(text.parse().map_err(|e| CodecError::invalid("int", e))?),
        "float" => Value::Float(text.parse().map_err(|e| CodecError::invalid("float", e))?),
        "text" => Value::Text(text.to_string()),
        "bytes" => Value::Bytes(STANDARD.decode(text)?),
        "timestamp" => Value::Timestamp(parse_time("timestamp", text)?),
        "duration" => Value::Duration(parse_duration("duration", text)?),
        other => {
            return Err(CodecError::invalid(
                "type",
                format!("unknown property type '{}'", other),
            ))
        }
    };
    Ok(value)
}
