//! GPX (and KML placemarks) import
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::debug;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use regex::Regex;
use std::{collections::VecDeque, io::BufRead, path::Path, str::FromStr};

use super::ImportOptions;

use crate::{
    error::ParsingError,
    model::{Location, SensorReading},
    reader::BufferedReader,
};

lazy_static! {
    /// Splits a timestamp into date-time, fraction and zone
    static ref TIME_PATTERN: Regex =
        Regex::new(r"^(\d+-\d+-\d+T\d+:\d+:\d+)(\.\d+)?(Z|([+-]\d{2}):?(\d{2})?)?$").unwrap();
}

/// Parses a GPX timestamp. Zoned forms are interpreted with their
/// offset, zone-less forms in the local time zone.
pub(crate) fn parse_time(content: &str) -> Option<DateTime<Utc>> {
    let caps = TIME_PATTERN.captures(content.trim())?;
    let datetime = caps.get(1)?.as_str();
    let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    match caps.get(3) {
        Some(zone) => {
            let offset = if zone.as_str() == "Z" {
                "+0000".to_string()
            } else {
                let hours = caps.get(4)?.as_str();
                let minutes = caps.get(5).map(|m| m.as_str()).unwrap_or("00");
                format!("{}{}", hours, minutes)
            };
            let normalized = format!("{}{}{}", datetime, fraction, offset);
            DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%z")
                .ok()
                .map(|t| t.with_timezone(&Utc))
        },
        None => {
            let normalized = format!("{}{}", datetime, fraction);
            let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
        },
    }
}

/// Point reconstructed from the document
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// `<trkpt>`, `<rtept>` or KML LineString vertex.
    /// `new_segment` is set on the first point of each segment.
    TrackPoint {
        location: Location,
        sensors: SensorReading,
        new_segment: bool,
    },
    /// `<wpt>` or KML Point placemark
    WayPoint {
        location: Location,
        sensors: SensorReading,
        name: String,
    },
}

/// Owned start tag
#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn from_start(e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                let value = attr
                    .unescape_value()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                (key, value)
            })
            .collect();
        Self { name, attributes }
    }
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
enum Token {
    Start(Element),
    End,
    Text(String),
    Eof,
}

/// Point fields, as they are collected
#[derive(Debug, Default)]
struct PointFields {
    location: Option<Location>,
    sensors: SensorReading,
    name: String,
    hdop: Option<f64>,
}

fn parse_field<T: FromStr>(field: &str, content: &str) -> Option<T> {
    match content.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("invalid <{}> value \"{}\"", field, content);
            None
        },
    }
}

/// Parses a KML "lon,lat[,ele]" tuple
fn parse_coordinates(tuple: &str) -> Option<Location> {
    let mut items = tuple.split(',');
    let longitude = items.next()?.trim().parse::<f64>().ok()?;
    let latitude = items.next()?.trim().parse::<f64>().ok()?;
    let mut location = Location::new(latitude, longitude);
    if let Some(Ok(elevation)) = items.next().map(|ele| ele.trim().parse::<f64>()) {
        location.elevation = Some(elevation);
    }
    Some(location)
}

/// [GpxImporter] streams [ImportEvent]s out of a GPX document.
/// Every `<trkseg>` and `<rte>` opens a new segment. Unknown elements
/// are skipped along with their content, and malformed field values
/// are dropped (the point is kept). Only a document that cannot be
/// tokenized interrupts the import.
pub struct GpxImporter<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    options: ImportOptions,
    pending: VecDeque<ImportEvent>,
    new_segment: bool,
    done: bool,
    /// Elements currently open
    depth: usize,
    /// Root element encountered
    rooted: bool,
}

impl GpxImporter<BufferedReader> {
    /// Opens the GPX (or KML) file located at `path`.
    /// ".gz" files are decompressed on the fly.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ImportOptions) -> Result<Self, ParsingError> {
        let reader = BufferedReader::from_path(path.as_ref())?;
        Ok(Self::new(reader, options))
    }
}

impl<R: BufRead> GpxImporter<R> {
    pub fn new(r: R, options: ImportOptions) -> Self {
        let mut reader = Reader::from_reader(r);
        reader.trim_text(true);
        reader.expand_empty_elements(true);
        Self {
            reader,
            options,
            buf: Vec::with_capacity(1024),
            pending: VecDeque::new(),
            new_segment: true,
            done: false,
            depth: 0,
            rooted: false,
        }
    }

    /// Next token of interest. Reaching the end of the document
    /// while elements are still open is a structural failure.
    fn next_token(&mut self) -> Result<Token, ParsingError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| ParsingError::Xml { position, source })?;
            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    self.rooted = true;
                    return Ok(Token::Start(Element::from_start(&e)));
                },
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(Token::End);
                },
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).to_string());
                    return Ok(Token::Text(text));
                },
                Event::CData(c) => {
                    return Ok(Token::Text(String::from_utf8_lossy(&c).to_string()));
                },
                Event::Eof => {
                    if self.depth > 0 {
                        debug!("document ends with {} open element(s)", self.depth);
                        return Err(ParsingError::UnexpectedEof);
                    }
                    if !self.rooted {
                        return Err(ParsingError::MissingRoot);
                    }
                    return Ok(Token::Eof);
                },
                _ => continue,
            }
        }
    }

    /// Consumes the content of the element just opened, up to its end tag
    fn skip(&mut self) -> Result<(), ParsingError> {
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(_) => depth += 1,
                Token::End => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                },
                Token::Text(_) => {},
                Token::Eof => return Err(ParsingError::UnexpectedEof),
            }
        }
    }

    /// Collects the text content of the element just opened.
    /// Nested elements are skipped.
    fn read_text(&mut self) -> Result<String, ParsingError> {
        let mut content = String::new();
        loop {
            match self.next_token()? {
                Token::Start(_) => self.skip()?,
                Token::End => return Ok(content),
                Token::Text(text) => content.push_str(&text),
                Token::Eof => return Err(ParsingError::UnexpectedEof),
            }
        }
    }

    /// Parses the point element just opened (`trkpt`, `rtept`, `wpt`).
    /// Returns None when it does not carry a valid location.
    fn parse_point(&mut self, element: &Element) -> Result<Option<PointFields>, ParsingError> {
        let latitude = element
            .attribute("lat")
            .and_then(|lat| parse_field::<f64>("lat", lat));
        let longitude = element
            .attribute("lon")
            .and_then(|lon| parse_field::<f64>("lon", lon));

        let mut fields = PointFields::default();
        let mut location = Location::default();
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(child) => match child.name.as_str() {
                    // transparent container
                    "extensions" => depth += 1,
                    "ele" | "time" | "accuracy" | "speed" | "baro" | "compass"
                    | "compass_accuracy" | "compassAccuracy" | "hdop" | "name" | "sat" => {
                        let content = self.read_text()?;
                        Self::apply(&mut location, &mut fields, &child.name, &content);
                    },
                    _ => self.skip()?,
                },
                Token::End => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                },
                Token::Text(_) => {},
                Token::Eof => return Err(ParsingError::UnexpectedEof),
            }
        }

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            debug!("<{}> without valid location: dropped", element.name);
            return Ok(None);
        };
        location.latitude = latitude;
        location.longitude = longitude;
        if location.accuracy.is_none() {
            if let (Some(hdop), Some(factor)) = (fields.hdop, self.options.hdop_factor) {
                location.accuracy = Some(hdop * factor);
            }
        }
        fields.location = Some(location);
        Ok(Some(fields))
    }

    fn apply(location: &mut Location, fields: &mut PointFields, name: &str, content: &str) {
        match name {
            "ele" => location.elevation = parse_field(name, content),
            "time" => {
                location.time = parse_time(content);
                if location.time.is_none() {
                    debug!("invalid <time> value \"{}\"", content);
                }
            },
            "accuracy" => location.accuracy = parse_field(name, content),
            "speed" => location.speed = parse_field(name, content),
            "sat" => location.satellites = parse_field(name, content),
            "hdop" => fields.hdop = parse_field(name, content),
            "baro" => fields.sensors.pressure = parse_field(name, content),
            "compass" => fields.sensors.compass_heading = parse_field(name, content),
            "compass_accuracy" | "compassAccuracy" => {
                fields.sensors.compass_accuracy = parse_field(name, content)
            },
            "name" => fields.name = content.trim().to_string(),
            _ => {},
        }
    }

    /// Parses the KML Placemark just opened
    fn parse_placemark(&mut self) -> Result<(), ParsingError> {
        let mut name = String::new();
        let mut geometry = "";
        let mut shapes = Vec::<(&'static str, String)>::new();
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(child) => match child.name.as_str() {
                    "name" if depth == 0 => name = self.read_text()?.trim().to_string(),
                    "MultiGeometry" => depth += 1,
                    "Point" => {
                        geometry = "Point";
                        depth += 1;
                    },
                    "LineString" => {
                        geometry = "LineString";
                        depth += 1;
                    },
                    "coordinates" if !geometry.is_empty() => {
                        let content = self.read_text()?;
                        shapes.push((geometry, content));
                    },
                    _ => self.skip()?,
                },
                Token::End => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    geometry = "";
                },
                Token::Text(_) => {},
                Token::Eof => return Err(ParsingError::UnexpectedEof),
            }
        }

        for (geometry, content) in shapes {
            let mut locations = content.split_whitespace().filter_map(|tuple| {
                let location = parse_coordinates(tuple);
                if location.is_none() {
                    debug!("invalid coordinates \"{}\"", tuple);
                }
                location
            });
            if geometry == "Point" {
                if let Some(location) = locations.next() {
                    self.pending.push_back(ImportEvent::WayPoint {
                        location,
                        sensors: SensorReading::default(),
                        name: name.clone(),
                    });
                }
            } else {
                for (index, location) in locations.enumerate() {
                    self.pending.push_back(ImportEvent::TrackPoint {
                        location,
                        sensors: SensorReading::default(),
                        new_segment: index == 0,
                    });
                }
            }
        }
        Ok(())
    }

    /// Reads the document until at least one event is available
    fn fill(&mut self) -> Result<(), ParsingError> {
        while self.pending.is_empty() {
            let element = match self.next_token()? {
                Token::Start(element) => element,
                Token::Eof => {
                    self.done = true;
                    return Ok(());
                },
                _ => continue,
            };
            match element.name.as_str() {
                "trkseg" | "rte" => self.new_segment = true,
                "trkpt" | "rtept" => {
                    if let Some(fields) = self.parse_point(&element)? {
                        if let Some(location) = fields.location {
                            self.pending.push_back(ImportEvent::TrackPoint {
                                location,
                                sensors: fields.sensors,
                                new_segment: self.new_segment,
                            });
                            self.new_segment = false;
                        }
                    }
                },
                "wpt" => {
                    if let Some(fields) = self.parse_point(&element)? {
                        if let Some(location) = fields.location {
                            self.pending.push_back(ImportEvent::WayPoint {
                                location,
                                sensors: fields.sensors,
                                name: fields.name,
                            });
                        }
                    }
                },
                "Placemark" => self.parse_placemark()?,
                // metadata is not imported
                "metadata" => self.skip()?,
                _ => {},
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for GpxImporter<R> {
    type Item = Result<ImportEvent, ParsingError>;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(Ok(event));
        }
        if self.done {
            return None;
        }
        match self.fill() {
            Ok(_) => self.pending.pop_front().map(Ok),
            Err(e) => {
                self.done = true;
                self.pending.clear();
                Some(Err(e))
            },
        }
    }
}
