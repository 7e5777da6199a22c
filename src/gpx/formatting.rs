//! GPX formatting
use std::io::Write;

use super::{cdata, fmt_float, fmt_time, AccuracyMode, CompassMode, GpxOptions};
use super::{GPX_OPENING, XML_HEADER};

use crate::{
    error::FormattingError,
    job::{CancelToken, Progress, ProgressSender},
    model::{Track, TrackPoint, WayPoint},
};

/// Meter unit label
const METERS: &str = "m";

/// Streams one [Track] into a GPX 1.1 document.
/// The writer does not retry nor cleanup: a failure leaves
/// a partial document behind, that the caller should dispose of.
#[derive(Debug, Clone)]
pub struct GpxWriter {
    options: GpxOptions,
    progress: ProgressSender,
    cancel: CancelToken,
}

impl GpxWriter {
    pub fn new(options: GpxOptions) -> Self {
        Self {
            options,
            progress: ProgressSender::none(),
            cancel: CancelToken::new(),
        }
    }

    /// Reports one [Progress::Advanced] per written point
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    /// Interrupts production, between two points, once cancelled
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Formats [Track] into [Write]able interface.
    /// `points` should be sorted by timestamp.
    /// Invalid [GpxOptions] are rejected before anything is written.
    pub fn format<W: Write, I: IntoIterator<Item = TrackPoint>>(
        &self,
        w: &mut W,
        track: &Track,
        points: I,
        way_points: &[WayPoint],
    ) -> Result<(), FormattingError> {
        self.options.validate()?;
        writeln!(w, "{}", XML_HEADER)?;
        writeln!(w, "{}", GPX_OPENING)?;
        self.format_metadata(w, track)?;
        self.format_track(w, track, points)?;
        for wpt in way_points {
            self.checkpoint()?;
            self.format_way_point(w, wpt)?;
            self.progress.send(Progress::Advanced(1));
        }
        write!(w, "</gpx>")?;
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), FormattingError> {
        if self.cancel.is_cancelled() {
            Err(FormattingError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn format_metadata<W: Write>(&self, w: &mut W, track: &Track) -> Result<(), FormattingError> {
        writeln!(w, "\t<metadata>")?;
        if track.has_name() {
            writeln!(w, "\t\t<name>{}</name>", cdata(&track.name))?;
        }
        for keyword in track.keywords() {
            writeln!(w, "\t\t<keywords>{}</keywords>", cdata(&keyword))?;
        }
        if !track.description.is_empty() {
            writeln!(w, "\t\t<desc>{}</desc>", cdata(&track.description))?;
        }
        writeln!(w, "\t</metadata>")?;
        Ok(())
    }

    fn format_track<W: Write, I: IntoIterator<Item = TrackPoint>>(
        &self,
        w: &mut W,
        track: &Track,
        points: I,
    ) -> Result<(), FormattingError> {
        writeln!(w, "\t<trk>")?;
        if track.has_name() {
            writeln!(w, "\t\t<name>{}</name>", cdata(&track.name))?;
        }
        if self.options.include_hdop_approximation {
            let comment = format!(
                "hdop values are approximated: location accuracy divided by {}",
                fmt_float(self.options.hdop_factor)
            );
            writeln!(w, "\t\t<cmt>{}</cmt>", cdata(&comment))?;
        }
        writeln!(w, "\t\t<trkseg>")?;
        for point in points {
            self.checkpoint()?;
            self.format_track_point(w, &point)?;
            self.progress.send(Progress::Advanced(1));
        }
        writeln!(w, "\t\t</trkseg>")?;
        writeln!(w, "\t</trk>")?;
        Ok(())
    }

    fn format_track_point<W: Write>(
        &self,
        w: &mut W,
        point: &TrackPoint,
    ) -> Result<(), FormattingError> {
        writeln!(
            w,
            "\t\t\t<trkpt lat=\"{}\" lon=\"{}\">",
            fmt_float(point.latitude),
            fmt_float(point.longitude)
        )?;
        if let Some(ele) = point.elevation {
            writeln!(w, "\t\t\t\t<ele>{}</ele>", fmt_float(ele))?;
        }
        writeln!(w, "\t\t\t\t<time>{}</time>", fmt_time(&point.timestamp))?;
        self.format_hdop(w, point.accuracy, "\t\t\t\t")?;

        if self.options.compass_mode == CompassMode::Comment {
            if let Some(heading) = point.compass_heading {
                let mut comment = format!("compass: {}", fmt_float(heading));
                if let Some(accuracy) = point.compass_accuracy {
                    comment.push_str(&format!("\n\t\t\t\t\tcompass accuracy: {}", accuracy));
                }
                writeln!(w, "\t\t\t\t<cmt>{}</cmt>", cdata(&comment))?;
            }
        }

        self.format_extensions(
            w,
            point.speed,
            point.compass_heading,
            point.compass_accuracy,
            point.pressure,
            "\t\t\t\t",
        )?;
        writeln!(w, "\t\t\t</trkpt>")?;
        Ok(())
    }

    fn format_way_point<W: Write>(&self, w: &mut W, wpt: &WayPoint) -> Result<(), FormattingError> {
        writeln!(
            w,
            "\t<wpt lat=\"{}\" lon=\"{}\">",
            fmt_float(wpt.latitude),
            fmt_float(wpt.longitude)
        )?;
        if let Some(ele) = wpt.elevation {
            writeln!(w, "\t\t<ele>{}</ele>", fmt_float(ele))?;
        }
        writeln!(w, "\t\t<time>{}</time>", fmt_time(&wpt.timestamp))?;

        let mut name = wpt.name.clone();
        if let (AccuracyMode::InName, Some(accuracy)) = (self.options.accuracy_mode, wpt.accuracy) {
            name.push_str(&format!(" ({}{})", fmt_float(accuracy), METERS));
        }
        writeln!(w, "\t\t<name>{}</name>", cdata(&name))?;

        let mut comment = Vec::<String>::with_capacity(2);
        if let (AccuracyMode::InComment, Some(accuracy)) =
            (self.options.accuracy_mode, wpt.accuracy)
        {
            comment.push(format!("accuracy: {}{}", fmt_float(accuracy), METERS));
        }
        if let (CompassMode::Comment, Some(heading)) =
            (self.options.compass_mode, wpt.compass_heading)
        {
            let mut text = format!("compass heading: {}deg", fmt_float(heading));
            if let Some(accuracy) = wpt.compass_accuracy {
                text.push_str(&format!("\n\t\t\tcompass accuracy: {}", accuracy));
            }
            comment.push(text);
        }
        if !comment.is_empty() {
            writeln!(w, "\t\t<cmt>{}</cmt>", cdata(&comment.join("\n\t\t\t")))?;
        }

        if let Some(link) = &wpt.link {
            writeln!(w, "\t\t<link href=\"{}\">", urlencoding::encode(link))?;
            writeln!(w, "\t\t\t<text>{}</text>", cdata(link))?;
            writeln!(w, "\t\t</link>")?;
        }
        if let Some(sat) = wpt.satellites {
            writeln!(w, "\t\t<sat>{}</sat>", sat)?;
        }
        self.format_hdop(w, wpt.accuracy, "\t\t")?;
        self.format_extensions(
            w,
            None,
            wpt.compass_heading,
            wpt.compass_accuracy,
            wpt.pressure,
            "\t\t",
        )?;
        writeln!(w, "\t</wpt>")?;
        Ok(())
    }

    fn format_hdop<W: Write>(
        &self,
        w: &mut W,
        accuracy: Option<f64>,
        indent: &str,
    ) -> Result<(), FormattingError> {
        if !self.options.include_hdop_approximation {
            return Ok(());
        }
        if let Some(accuracy) = accuracy {
            writeln!(
                w,
                "{}<hdop>{}</hdop>",
                indent,
                fmt_float(accuracy / self.options.hdop_factor)
            )?;
        }
        Ok(())
    }

    /// Writes the `<extensions>` block, when at least one field applies
    fn format_extensions<W: Write>(
        &self,
        w: &mut W,
        speed: Option<f64>,
        compass_heading: Option<f64>,
        compass_accuracy: Option<i32>,
        pressure: Option<f64>,
        indent: &str,
    ) -> Result<(), FormattingError> {
        let mut fields = Vec::<String>::with_capacity(4);
        if let Some(speed) = speed {
            fields.push(format!("<speed>{}</speed>", fmt_float(speed)));
        }
        if let (CompassMode::Extension, Some(heading)) = (self.options.compass_mode, compass_heading)
        {
            fields.push(format!("<compass>{}</compass>", fmt_float(heading)));
            if let Some(accuracy) = compass_accuracy {
                fields.push(format!("<compass_accuracy>{}</compass_accuracy>", accuracy));
            }
        }
        if let Some(pressure) = pressure {
            fields.push(format!("<baro>{:.1}</baro>", pressure));
        }
        if fields.is_empty() {
            return Ok(());
        }
        writeln!(w, "{}<extensions>", indent)?;
        for field in fields {
            writeln!(w, "{}\t{}", indent, field)?;
        }
        writeln!(w, "{}</extensions>", indent)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ValidationError;
    use crate::model::{PointId, TrackId};
    use chrono::{TimeZone, Utc};

    fn track() -> Track {
        Track::new(TrackId(1), Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
    }

    fn point(accuracy: Option<f64>) -> TrackPoint {
        TrackPoint {
            id: PointId(1),
            track: TrackId(1),
            latitude: 48.5,
            longitude: 2.25,
            elevation: None,
            accuracy,
            speed: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap(),
            compass_heading: None,
            compass_accuracy: None,
            pressure: None,
            new_segment: false,
        }
    }

    fn produce(options: GpxOptions, track: &Track, points: Vec<TrackPoint>) -> String {
        let mut buf = Vec::<u8>::new();
        GpxWriter::new(options)
            .format(&mut buf, track, points, &[])
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn hdop_approximation() {
        let options = GpxOptions::default().with_hdop(3.0);
        let content = produce(options, &track(), vec![point(Some(9.0))]);
        assert!(content.contains("<hdop>3.0</hdop>"));
        assert!(content.contains("<cmt><![CDATA[hdop values are approximated"));

        let content = produce(GpxOptions::default(), &track(), vec![point(Some(9.0))]);
        assert!(!content.contains("<hdop>"));
        assert!(!content.contains("<cmt>"));
    }

    #[test]
    fn no_empty_extensions() {
        let content = produce(GpxOptions::default(), &track(), vec![point(None)]);
        assert!(!content.contains("<extensions>"));

        let mut pt = point(None);
        pt.compass_heading = Some(90.0);
        pt.compass_accuracy = Some(2);
        let content = produce(GpxOptions::default(), &track(), vec![pt.clone()]);
        assert!(!content.contains("<extensions>"));
        assert!(!content.contains("compass"));

        let options = GpxOptions::default().with_compass_mode(CompassMode::Extension);
        let content = produce(options, &track(), vec![pt]);
        assert!(content.contains(
            "\t\t\t\t<extensions>\n\t\t\t\t\t<compass>90.0</compass>\n\t\t\t\t\t<compass_accuracy>2</compass_accuracy>\n\t\t\t\t</extensions>\n"
        ));
    }

    #[test]
    fn extensions_order() {
        let mut pt = point(None);
        pt.speed = Some(1.5);
        pt.pressure = Some(1013.27);
        pt.compass_heading = Some(12.0);
        let options = GpxOptions::default().with_compass_mode(CompassMode::Extension);
        let content = produce(options, &track(), vec![pt]);
        let speed = content.find("<speed>1.5</speed>").unwrap();
        let compass = content.find("<compass>12.0</compass>").unwrap();
        let baro = content.find("<baro>1013.3</baro>").unwrap();
        assert!(speed < compass && compass < baro);
    }

    #[test]
    fn metadata() {
        let mut track = track();
        track.name = "Evening <walk>".to_string();
        track.description = "along the river & back".to_string();
        track.tags = vec!["walk".to_string(), " river".to_string(), "walk".to_string()];
        let content = produce(GpxOptions::default(), &track, vec![]);
        assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<gpx"));
        assert!(content.contains("\t\t<name><![CDATA[Evening <walk>]]></name>"));
        assert_eq!(content.matches("<keywords>").count(), 2);
        assert!(content.contains("<keywords><![CDATA[river]]></keywords>"));
        assert!(content.contains("<desc><![CDATA[along the river & back]]></desc>"));
        assert!(content.ends_with("</gpx>"));

        let content = produce(GpxOptions::default(), &self::track(), vec![]);
        assert!(content.contains("\t<metadata>\n\t</metadata>\n"));
        assert!(content.contains("\t<trk>\n\t\t<trkseg>\n\t\t</trkseg>\n\t</trk>\n"));
    }

    #[test]
    fn way_point_fields() {
        let wpt = WayPoint {
            id: PointId(2),
            track: TrackId(1),
            latitude: 1.0,
            longitude: 2.0,
            elevation: Some(100.0),
            accuracy: Some(12.0),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 2).unwrap(),
            compass_heading: Some(45.0),
            compass_accuracy: Some(3),
            pressure: None,
            name: "photo".to_string(),
            link: Some("2024-05-01 photo.jpg".to_string()),
            uuid: None,
            satellites: Some(7),
        };
        let options = GpxOptions::default()
            .with_accuracy_mode(AccuracyMode::InComment)
            .with_compass_mode(CompassMode::Comment)
            .with_hdop(4.0);
        let mut buf = Vec::<u8>::new();
        GpxWriter::new(options)
            .format(&mut buf, &track(), Vec::<TrackPoint>::new(), &[wpt.clone()])
            .unwrap();
        let content = String::from_utf8(buf).unwrap();
        assert!(content.contains("\t<wpt lat=\"1.0\" lon=\"2.0\">\n\t\t<ele>100.0</ele>\n\t\t<time>2024-05-01T10:00:02Z</time>\n\t\t<name><![CDATA[photo]]></name>\n"));
        assert!(content.contains("<cmt><![CDATA[accuracy: 12.0m\n\t\t\tcompass heading: 45.0deg\n\t\t\tcompass accuracy: 3]]></cmt>"));
        assert!(content.contains("<link href=\"2024-05-01%20photo.jpg\">"));
        assert!(content.contains("<text><![CDATA[2024-05-01 photo.jpg]]></text>"));
        assert!(content.contains("<sat>7</sat>"));
        assert!(content.contains("\t\t<hdop>3.0</hdop>"));

        let options = GpxOptions::default().with_accuracy_mode(AccuracyMode::InName);
        let mut buf = Vec::<u8>::new();
        GpxWriter::new(options)
            .format(&mut buf, &track(), Vec::<TrackPoint>::new(), &[wpt])
            .unwrap();
        let content = String::from_utf8(buf).unwrap();
        assert!(content.contains("<name><![CDATA[photo (12.0m)]]></name>"));
        assert!(!content.contains("<cmt>"));
    }

    #[test]
    fn cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut buf = Vec::<u8>::new();
        let result = GpxWriter::new(GpxOptions::default())
            .with_cancel_token(cancel)
            .format(&mut buf, &track(), vec![point(None)], &[]);
        assert!(matches!(result, Err(FormattingError::Cancelled)));
    }

    #[test]
    fn invalid_hdop_factor() {
        for factor in [0.0, -2.0] {
            let mut buf = Vec::<u8>::new();
            let result = GpxWriter::new(GpxOptions::default().with_hdop(factor)).format(
                &mut buf,
                &track(),
                vec![point(Some(8.0))],
                &[],
            );
            assert!(matches!(
                result,
                Err(FormattingError::Options(ValidationError::InvalidHdopFactor(_)))
            ));
            assert!(buf.is_empty());
        }
    }
}
