//! WebDAV request bodies and multi-status parsing.

use std::io::Cursor;

use calsync_core::time::format_ical_datetime;
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event as XmlEvent};

use crate::error::{CalDavError, CalDavResult};
use crate::store::CalendarInfo;

pub const DAV_NS: &str = "DAV:";
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";
/// CalendarServer namespace, home of `getctag`.
pub const CS_NS: &str = "http://calendarserver.org/ns/";

/// One `<response>` of a calendar-query REPORT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub href: String,
    pub etag: Option<String>,
    pub calendar_data: String,
}

/// Accumulates a request body; write errors surface as [`CalDavError`].
struct XmlBody {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlBody {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn write(&mut self, event: XmlEvent<'_>) -> CalDavResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| CalDavError::configuration(format!("failed to build XML body: {}", e)))
    }

    fn start(&mut self, element: BytesStart<'_>) -> CalDavResult<()> {
        self.write(XmlEvent::Start(element))
    }

    fn end(&mut self, name: &str) -> CalDavResult<()> {
        self.write(XmlEvent::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> CalDavResult<()> {
        self.write(XmlEvent::Empty(BytesStart::new(name)))
    }

    fn finish(self) -> CalDavResult<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| CalDavError::configuration("XML body is not UTF-8").with_source(e))
    }
}

/// `PROPFIND` body for calendar discovery.
pub fn propfind_calendars_body() -> CalDavResult<String> {
    let mut body = XmlBody::new();

    let mut propfind = BytesStart::new("d:propfind");
    propfind.push_attribute(("xmlns:d", DAV_NS));
    propfind.push_attribute(("xmlns:c", CALDAV_NS));
    propfind.push_attribute(("xmlns:cs", CS_NS));
    body.start(propfind)?;
    body.start(BytesStart::new("d:prop"))?;
    body.empty("d:displayname")?;
    body.empty("cs:getctag")?;
    body.empty("d:resourcetype")?;
    body.empty("c:supported-calendar-component-set")?;
    body.end("d:prop")?;
    body.end("d:propfind")?;

    body.finish()
}

/// `REPORT` body selecting VEVENTs that overlap `[start, end]`.
pub fn calendar_query_body(start: DateTime<Utc>, end: DateTime<Utc>) -> CalDavResult<String> {
    let mut body = XmlBody::new();

    let mut query = BytesStart::new("c:calendar-query");
    query.push_attribute(("xmlns:d", DAV_NS));
    query.push_attribute(("xmlns:c", CALDAV_NS));
    body.start(query)?;

    body.start(BytesStart::new("d:prop"))?;
    body.empty("d:getetag")?;
    body.empty("c:calendar-data")?;
    body.end("d:prop")?;

    body.start(BytesStart::new("c:filter"))?;
    let mut vcalendar = BytesStart::new("c:comp-filter");
    vcalendar.push_attribute(("name", "VCALENDAR"));
    body.start(vcalendar)?;
    let mut vevent = BytesStart::new("c:comp-filter");
    vevent.push_attribute(("name", "VEVENT"));
    body.start(vevent)?;

    let mut time_range = BytesStart::new("c:time-range");
    time_range.push_attribute(("start", format_ical_datetime(start).as_str()));
    time_range.push_attribute(("end", format_ical_datetime(end).as_str()));
    body.write(XmlEvent::Empty(time_range))?;

    body.end("c:comp-filter")?;
    body.end("c:comp-filter")?;
    body.end("c:filter")?;
    body.end("c:calendar-query")?;

    body.finish()
}

/// Extracts the calendars from a `PROPFIND` multi-status response.
///
/// Only resources whose resource type contains the CalDAV `calendar`
/// marker are returned.
pub fn parse_propfind_response(xml: &str) -> Vec<CalendarInfo> {
    let mut calendars = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut display_name: Option<String> = None;
    let mut ctag: Option<String> = None;
    let mut components: Vec<String> = Vec::new();
    let mut is_calendar = false;
    let mut in_resource_type = false;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(XmlEvent::Start(ref e)) | Ok(XmlEvent::Empty(ref e)) => {
                let is_empty = matches!(event, Ok(XmlEvent::Empty(_)));
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        display_name = None;
                        ctag = None;
                        components.clear();
                        is_calendar = false;
                        in_resource_type = false;
                    }
                    "resourcetype" => in_resource_type = !is_empty,
                    "calendar" if in_resource_type => is_calendar = true,
                    "comp" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                components.push(String::from_utf8_lossy(&attr.value).to_string());
                            }
                        }
                    }
                    local @ ("href" | "displayname" | "getctag") if !is_empty => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(XmlEvent::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        if is_calendar {
                            if let Some(href) = href.take() {
                                let id = href_id(&href);
                                let name = display_name
                                    .take()
                                    .filter(|n| !n.is_empty())
                                    .unwrap_or_else(|| id.clone());
                                let mut info = CalendarInfo::new(id, name, href);
                                info.ctag = ctag.take();
                                info.components = std::mem::take(&mut components);
                                calendars.push(info);
                            }
                        }
                    }
                    "resourcetype" => in_resource_type = false,
                    _ => {}
                }
                current_element = None;
            }
            Ok(XmlEvent::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match element.as_str() {
                        "href" => href = Some(text),
                        "displayname" => display_name = Some(text),
                        "getctag" => ctag = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    calendars
}

/// Extracts `(href, etag, calendar-data)` entries from a `REPORT` response.
///
/// Entries without calendar data (for example a 404 propstat) are skipped.
pub fn parse_report_response(xml: &str) -> Vec<ReportEntry> {
    let mut entries = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut etag: Option<String> = None;
    let mut data: Option<String> = None;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        etag = None;
                        data = None;
                    }
                    local @ ("href" | "getetag" | "calendar-data") => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(XmlEvent::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response" {
                    if let (Some(href), Some(calendar_data)) = (href.take(), data.take()) {
                        entries.push(ReportEntry {
                            href,
                            etag: etag.take(),
                            calendar_data,
                        });
                    }
                }
                current_element = None;
            }
            Ok(XmlEvent::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    assign_report_field(element, text, &mut href, &mut etag, &mut data);
                }
            }
            Ok(XmlEvent::CData(e)) => {
                if let Some(ref element) = current_element {
                    let text = String::from_utf8_lossy(&e).to_string();
                    assign_report_field(element, text, &mut href, &mut etag, &mut data);
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

fn assign_report_field(
    element: &str,
    text: String,
    href: &mut Option<String>,
    etag: &mut Option<String>,
    data: &mut Option<String>,
) {
    match element {
        "href" => *href = Some(text),
        "getetag" => *etag = Some(text),
        "calendar-data" => *data = Some(text),
        _ => {}
    }
}

/// Last path segment of an href, percent-decoded. `.ics` is kept.
pub fn href_id(href: &str) -> String {
    let tail = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href);
    urlencoding::decode(tail)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| tail.to_string())
}

/// Local part of a possibly prefixed element name.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
