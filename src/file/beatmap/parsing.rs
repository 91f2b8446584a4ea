use std::num::{ParseFloatError, ParseIntError};

use super::{
	BeatmapFile, ColoursSection, ComboColour, DifficultySection, Event, EventKind, HitObject, HitSound,
	InvalidSampleSetError, KeyValueSection, PathType, SampleSet, SpecialColour, TimingPoint,
};
use crate::point::Point;

pub(crate) const SECTION_GENERAL: &str = "[General]";
pub(crate) const SECTION_EDITOR: &str = "[Editor]";
pub(crate) const SECTION_METADATA: &str = "[Metadata]";
pub(crate) const SECTION_DIFFICULTY: &str = "[Difficulty]";
pub(crate) const SECTION_EVENTS: &str = "[Events]";
pub(crate) const SECTION_TIMING_POINTS: &str = "[TimingPoints]";
pub(crate) const SECTION_COLOURS: &str = "[Colours]";
pub(crate) const SECTION_HIT_OBJECTS: &str = "[HitObjects]";

#[derive(Debug, thiserror::Error)]
#[error("Could not split line with ':'")]
pub struct InvalidKeyValuePairError;

/// Parse a `field: value` pair (arbitrary spaces allowed).
pub(crate) fn parse_field_value_pair(line: &str) -> Result<(String, String), InvalidKeyValuePairError> {
	let (field, value) = line.split_once(':').ok_or(InvalidKeyValuePairError)?;

	Ok((field.trim().to_owned(), value.trim().to_owned()))
}

#[derive(Debug, thiserror::Error)]
#[error("Could not parse hit object (line: {line:?})")]
pub struct HitObjectParseError {
	pub line: String,
	#[source]
	pub kind: HitObjectParseErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum HitObjectParseErrorKind {
	#[error("Hit object is missing values (expected at least {expected} fields, got {got})")]
	MissingValues { expected: usize, got: usize },

	#[error("Invalid coordinate of hit object")]
	InvalidCoordinate(#[source] ParseFloatError),

	#[error("Invalid time of hit object")]
	InvalidTime(#[source] ParseFloatError),

	#[error("Invalid type of hit object")]
	InvalidObjectType(#[source] ParseIntError),

	#[error("Invalid hitsounds of hit object")]
	InvalidHitsounds(#[source] ParseIntError),

	#[error("Invalid coordinate of slider anchor")]
	InvalidAnchorCoordinate(#[source] ParseFloatError),

	#[error("Invalid repeat count of slider")]
	InvalidRepeat(#[source] ParseIntError),

	#[error("Invalid pixel length of slider")]
	InvalidPixelLength(#[source] ParseFloatError),

	#[error("Invalid end time of spinner")]
	InvalidSpinnerEndTime(#[source] ParseFloatError),

	#[error(transparent)]
	Extras(#[from] ExtrasParseErrorKind),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtrasParseErrorKind {
	#[error("Extras of hit object are missing values (expected at least {expected} fields, got {got})")]
	MissingValues { expected: usize, got: usize },

	#[error("Invalid end time of hold note")]
	InvalidHoldEndTime(#[source] ParseFloatError),

	#[error("Invalid sample set of hit object")]
	InvalidSampleSet(#[source] InvalidSampleSetError),

	#[error("Invalid addition set of hit object")]
	InvalidAdditionSet(#[source] InvalidSampleSetError),

	#[error("Invalid custom sample index of hit object")]
	InvalidCustomIndex(#[source] ParseIntError),

	#[error("Invalid sample volume of hit object")]
	InvalidVolume(#[source] ParseFloatError),
}

/// Parse a hit object line.
///
/// # Errors
///
/// Fails when the line does not conform to the hit object grammar; the error
/// names the offending sub-field and carries the raw line. No partially
/// decoded object ever escapes.
pub fn parse_hit_object(line: &str) -> Result<HitObject, HitObjectParseError> {
	hit_object_from_fields(line).map_err(|kind| HitObjectParseError {
		line: line.to_owned(),
		kind,
	})
}

fn hit_object_from_fields(line: &str) -> Result<HitObject, HitObjectParseErrorKind> {
	let values: Vec<&str> = line.split(',').collect();
	if values.len() < 5 {
		return Err(HitObjectParseErrorKind::MissingValues {
			expected: 5,
			got: values.len(),
		});
	}

	let mut hit_object = HitObject::default();

	let x: f64 = (values[0].parse()).map_err(HitObjectParseErrorKind::InvalidCoordinate)?;
	let y: f64 = (values[1].parse()).map_err(HitObjectParseErrorKind::InvalidCoordinate)?;
	hit_object.pos = Point::new(x, y);
	hit_object.time = (values[2].parse()).map_err(HitObjectParseErrorKind::InvalidTime)?;

	let object_type: u8 = (values[3].parse()).map_err(HitObjectParseErrorKind::InvalidObjectType)?;
	hit_object.set_object_type(object_type);

	let hitsounds: u8 = (values[4].parse()).map_err(HitObjectParseErrorKind::InvalidHitsounds)?;
	hit_object.hitsounds = HitSound::new(hitsounds);

	if hit_object.is_slider {
		if values.len() < 8 {
			return Err(HitObjectParseErrorKind::MissingValues {
				expected: 8,
				got: values.len(),
			});
		}

		let (path_type, curve_points) = parse_curve_data(values[5])?;
		hit_object.path_type = path_type;
		hit_object.curve_points = curve_points;

		hit_object.repeat = (values[6].parse()).map_err(HitObjectParseErrorKind::InvalidRepeat)?;
		hit_object.pixel_length = (values[7].parse()).map_err(HitObjectParseErrorKind::InvalidPixelLength)?;

		let edge_count = hit_object.repeat as usize + 1;

		// Entries beyond what the line supplies, and entries that fail to
		// parse, fall back to the object's own hitsounds.
		let own_hitsounds = hit_object.hitsounds;
		let supplied: Vec<&str> = values.get(8).map_or_else(Vec::new, |field| field.split('|').collect());
		hit_object.edge_hitsounds = (0..edge_count)
			.map(|i| supplied.get(i).and_then(|t| t.parse().ok()).unwrap_or(own_hitsounds))
			.collect();

		// Same sizing policy for the sample set pairs, with `Auto` as the
		// filler for missing and unparsable sub-tokens alike.
		let supplied: Vec<&str> = values.get(9).map_or_else(Vec::new, |field| field.split('|').collect());
		hit_object.edge_sample_sets = Vec::with_capacity(edge_count);
		hit_object.edge_addition_sets = Vec::with_capacity(edge_count);
		for i in 0..edge_count {
			let (sample_set, addition_set): (SampleSet, SampleSet) = supplied
				.get(i)
				.and_then(|t| t.split_once(':'))
				.map_or_else(Default::default, |(normal, addition)| {
					(normal.parse().unwrap_or_default(), addition.parse().unwrap_or_default())
				});

			hit_object.edge_sample_sets.push(sample_set);
			hit_object.edge_addition_sets.push(addition_set);
		}

		if let Some(extras) = values.get(10) {
			parse_extras_into(&mut hit_object, extras)?;
		}
	} else if hit_object.is_spinner {
		if values.len() < 6 {
			return Err(HitObjectParseErrorKind::MissingValues {
				expected: 6,
				got: values.len(),
			});
		}

		let end_time: f64 = (values[5].parse()).map_err(HitObjectParseErrorKind::InvalidSpinnerEndTime)?;
		hit_object.repeat = 1;
		hit_object.temporal_length = end_time - hit_object.time;

		if let Some(extras) = values.get(6) {
			parse_extras_into(&mut hit_object, extras)?;
		}
	} else {
		// Circles and hold notes carry no geometry fields of their own; a
		// hold note's end time arrives through its extras below.
		hit_object.repeat = 0;
		hit_object.temporal_length = 0.0;

		if let Some(extras) = values.get(5) {
			parse_extras_into(&mut hit_object, extras)?;
		}
	}

	Ok(hit_object)
}

fn parse_curve_data(field: &str) -> Result<(PathType, Vec<Point>), HitObjectParseErrorKind> {
	// The last valid letter wins, wherever it appears between the anchors.
	let path_type = (field.split('|').rev())
		.find_map(PathType::from_letter)
		.unwrap_or_default();

	let mut curve_points = Vec::new();
	for token in field.split('|') {
		let parts: Vec<&str> = token.split(':').collect();

		if let [x, y] = parts[..] {
			let x: f64 = x.parse().map_err(HitObjectParseErrorKind::InvalidAnchorCoordinate)?;
			let y: f64 = y.parse().map_err(HitObjectParseErrorKind::InvalidAnchorCoordinate)?;
			curve_points.push(Point::new(x, y));
		} else if PathType::from_letter(token).is_none() {
			tracing::debug!("skipping curve token {token:?}");
		}
	}

	Ok((path_type, curve_points))
}

/// Decode the colon-delimited extras tail into the object.
///
/// For hold notes the first token is the end time and every following field
/// shifts one position; decoding it re-forces the repeat count to 1.
///
/// # Errors
///
/// Fails when a required numeric sub-field does not parse; the error carries
/// the extras string that was being decoded.
pub fn parse_extras(hit_object: &mut HitObject, extras: &str) -> Result<(), HitObjectParseError> {
	parse_extras_into(hit_object, extras).map_err(|kind| HitObjectParseError {
		line: extras.to_owned(),
		kind: kind.into(),
	})
}

fn parse_extras_into(hit_object: &mut HitObject, extras: &str) -> Result<(), ExtrasParseErrorKind> {
	if extras.is_empty() {
		return Ok(());
	}

	let values: Vec<&str> = extras.split(':').collect();
	let expected = if hit_object.is_hold_note { 6 } else { 5 };
	if values.len() < expected {
		return Err(ExtrasParseErrorKind::MissingValues {
			expected,
			got: values.len(),
		});
	}

	let values = if hit_object.is_hold_note {
		let end_time: f64 = (values[0].parse()).map_err(ExtrasParseErrorKind::InvalidHoldEndTime)?;
		hit_object.repeat = 1;
		hit_object.set_end_time(end_time);

		&values[1..]
	} else {
		&values[..]
	};

	hit_object.hit_sample.sample_set = (values[0].parse()).map_err(ExtrasParseErrorKind::InvalidSampleSet)?;
	hit_object.hit_sample.addition_set = (values[1].parse()).map_err(ExtrasParseErrorKind::InvalidAdditionSet)?;
	hit_object.hit_sample.custom_index = (values[2].parse()).map_err(ExtrasParseErrorKind::InvalidCustomIndex)?;
	hit_object.hit_sample.volume = (values[3].parse()).map_err(ExtrasParseErrorKind::InvalidVolume)?;
	// The filename is the raw remainder, colons and all; it may be empty.
	hit_object.hit_sample.filename = values[4..].join(":");

	Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("Could not parse colour {value:?}")]
pub struct ColourParseError {
	pub value: String,
	#[source]
	pub kind: ColourParseErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum ColourParseErrorKind {
	#[error("Expected 3 comma-separated channels, got {0}")]
	WrongChannelCount(usize),

	#[error("Invalid red channel")]
	InvalidRed(#[source] ParseIntError),

	#[error("Invalid green channel")]
	InvalidGreen(#[source] ParseIntError),

	#[error("Invalid blue channel")]
	InvalidBlue(#[source] ParseIntError),
}

/// Parse the `r,g,b` value half of a colours-section line. Each channel must
/// be an integer in `[0, 255]`; the first failing channel wins.
///
/// # Errors
///
/// Fails on a wrong channel count or a channel that is not such an integer.
pub fn parse_combo_colour(value: &str) -> Result<ComboColour, ColourParseError> {
	combo_colour_from_channels(value).map_err(|kind| ColourParseError {
		value: value.to_owned(),
		kind,
	})
}

fn combo_colour_from_channels(value: &str) -> Result<ComboColour, ColourParseErrorKind> {
	let channels: Vec<&str> = value.split(',').map(str::trim).collect();

	if let [red, green, blue] = channels[..] {
		Ok(ComboColour {
			red: red.parse().map_err(ColourParseErrorKind::InvalidRed)?,
			green: green.parse().map_err(ColourParseErrorKind::InvalidGreen)?,
			blue: blue.parse().map_err(ColourParseErrorKind::InvalidBlue)?,
		})
	} else {
		Err(ColourParseErrorKind::WrongChannelCount(channels.len()))
	}
}

#[derive(Debug, thiserror::Error)]
#[error("Could not parse event (line: {line:?})")]
pub struct EventParseError {
	pub line: String,
	#[source]
	pub kind: EventParseErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum EventParseErrorKind {
	#[error("Loop is missing its start time")]
	MissingStartTime,

	#[error("Invalid start time of loop")]
	InvalidStartTime(#[source] ParseIntError),

	#[error("Loop is missing its loop count")]
	MissingLoopCount,

	#[error("Invalid loop count of loop")]
	InvalidLoopCount(#[source] ParseIntError),

	#[error("Trigger loop is missing its trigger")]
	MissingTrigger,

	#[error("Trigger loop is missing its end time")]
	MissingEndTime,

	#[error("Invalid end time of trigger loop")]
	InvalidEndTime(#[source] ParseIntError),
}

/// Parse one events-section line.
///
/// Leading indentation (spaces or underscores) marks command nesting; it is
/// stripped and counted before the line splits, and is never part of a
/// variant's own fields. Lines with an unknown identifier are kept verbatim.
///
/// # Errors
///
/// Fails when a loop variant's numeric fields are missing or malformed.
pub fn parse_event(line: &str) -> Result<Event, EventParseError> {
	event_from_line(line).map_err(|kind| EventParseError {
		line: line.to_owned(),
		kind,
	})
}

fn event_from_line(line: &str) -> Result<Event, EventParseErrorKind> {
	let body = line.trim_start_matches([' ', '_']);
	let indent = line.len() - body.len();
	let values: Vec<&str> = body.split(',').collect();

	let kind = match values[0].trim() {
		"L" => {
			let start_time = (values.get(1).ok_or(EventParseErrorKind::MissingStartTime)?.parse())
				.map_err(EventParseErrorKind::InvalidStartTime)?;
			let loop_count = (values.get(2).ok_or(EventParseErrorKind::MissingLoopCount)?.parse())
				.map_err(EventParseErrorKind::InvalidLoopCount)?;

			EventKind::StandardLoop { start_time, loop_count }
		}
		"T" => {
			let trigger = (*values.get(1).ok_or(EventParseErrorKind::MissingTrigger)?).to_owned();
			let start_time = (values.get(2).ok_or(EventParseErrorKind::MissingStartTime)?.parse())
				.map_err(EventParseErrorKind::InvalidStartTime)?;
			let end_time = (values.get(3).ok_or(EventParseErrorKind::MissingEndTime)?.parse())
				.map_err(EventParseErrorKind::InvalidEndTime)?;

			EventKind::TriggerLoop {
				trigger,
				start_time,
				end_time,
			}
		}
		"F" | "M" | "MX" | "MY" | "S" | "V" | "R" | "C" | "P" => EventKind::Command {
			identifier: values[0].to_owned(),
			params: values[1..].iter().map(|v| (*v).to_owned()).collect(),
		},
		_ => {
			tracing::debug!("keeping event line verbatim: {line:?}");
			return Ok(Event {
				indent: 0,
				kind: EventKind::Raw(line.to_owned()),
			});
		}
	};

	Ok(Event { indent, kind })
}

#[derive(Debug, thiserror::Error)]
pub enum TimingPointParseError {
	#[error("Expected at least 2 values, got {0}")]
	LessThan2Values(usize),

	#[error("Expected at most 8 values, got {0}")]
	MoreThan8Values(usize),

	#[error("Invalid float")]
	InvalidFloat(
		#[from]
		#[source]
		ParseFloatError,
	),

	#[error("Invalid int")]
	InvalidInt(
		#[from]
		#[source]
		ParseIntError,
	),

	#[error(transparent)]
	InvalidSampleSet(#[from] InvalidSampleSetError),
}

/// Parse a timing point line. Everything past the beat length is optional
/// and keeps its editor default when absent.
///
/// # Errors
///
/// Fails on a wrong field count or a malformed numeric field.
pub fn parse_timing_point(line: &str) -> Result<TimingPoint, TimingPointParseError> {
	let values: Vec<&str> = line.split(',').collect();

	if values.len() < 2 {
		return Err(TimingPointParseError::LessThan2Values(values.len()));
	}
	if values.len() > 8 {
		return Err(TimingPointParseError::MoreThan8Values(values.len()));
	}

	let mut timing_point = TimingPoint {
		time: values[0].parse()?,
		beat_length: values[1].parse()?,
		..TimingPoint::default()
	};

	if let Some(meter) = values.get(2) {
		timing_point.meter = meter.parse()?;
	}
	if let Some(sample_set) = values.get(3) {
		timing_point.sample_set = sample_set.parse()?;
	}
	if let Some(sample_index) = values.get(4) {
		timing_point.sample_index = sample_index.parse()?;
	}
	if let Some(volume) = values.get(5) {
		timing_point.volume = volume.parse()?;
	}
	if let Some(uninherited) = values.get(6) {
		timing_point.uninherited = uninherited.parse::<u8>()? != 0;
	}
	if let Some(effects) = values.get(7) {
		timing_point.effects = effects.parse()?;
	}

	Ok(timing_point)
}

#[derive(Debug, thiserror::Error)]
#[error("Couldn't parse section {section} at line {line:?}")]
pub struct SectionParseError {
	pub section: &'static str,
	pub line: String,
	#[source]
	pub kind: SectionParseErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum SectionParseErrorKind {
	#[error("Invalid key-value pair")]
	InvalidKeyValuePair(
		#[from]
		#[source]
		InvalidKeyValuePairError,
	),

	#[error("Couldn't parse value of field {field:?}")]
	InvalidFieldValue {
		field: &'static str,
		#[source]
		source: ParseFloatError,
	},

	#[error("Could not parse timing point")]
	TimingPointParse(
		#[from]
		#[source]
		TimingPointParseError,
	),

	#[error(transparent)]
	HitObjectParse(#[from] HitObjectParseError),

	#[error(transparent)]
	ColourParse(#[from] ColourParseError),

	#[error(transparent)]
	EventParse(#[from] EventParseError),
}

fn section_err<T: Into<SectionParseErrorKind>>(
	section: &'static str,
	line: &str,
) -> impl FnOnce(T) -> SectionParseError {
	let line = line.to_owned();

	move |kind| SectionParseError {
		section,
		line,
		kind: kind.into(),
	}
}

fn field_err(
	section: &'static str,
	field: &'static str,
	line: &str,
) -> impl FnOnce(ParseFloatError) -> SectionParseError {
	let line = line.to_owned();

	move |source| SectionParseError {
		section,
		line,
		kind: SectionParseErrorKind::InvalidFieldValue { field, source },
	}
}

/// Yields the next body line of the current section, or `None` at the next
/// section header (handed back through `section_header`) or at end of input.
fn next_section_line<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Option<&'a str> {
	match lines.next() {
		Some(line) if line.starts_with('[') && line.trim_end().ends_with(']') => {
			*section_header = Some(line.trim_end().to_owned());
			None
		}
		Some(line) => Some(line),
		None => {
			*section_header = None;
			None
		}
	}
}

fn parse_key_value_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section: &'static str,
	section_header: &mut Option<String>,
) -> Result<KeyValueSection, SectionParseError> {
	let mut entries = Vec::new();

	while let Some(line) = next_section_line(lines, section_header) {
		let (key, value) = parse_field_value_pair(line).map_err(section_err(section, line))?;
		entries.push((key, value));
	}

	Ok(KeyValueSection { entries })
}

fn parse_difficulty_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Result<DifficultySection, SectionParseError> {
	let mut section = DifficultySection::default();

	while let Some(line) = next_section_line(lines, section_header) {
		let (field, value) = parse_field_value_pair(line).map_err(section_err(SECTION_DIFFICULTY, line))?;

		match field.as_str() {
			"HPDrainRate" => {
				section.hp_drain_rate = (value.parse()).map_err(field_err(SECTION_DIFFICULTY, "HPDrainRate", line))?;
			}
			"CircleSize" => {
				section.circle_size = (value.parse()).map_err(field_err(SECTION_DIFFICULTY, "CircleSize", line))?;
			}
			"OverallDifficulty" => {
				section.overall_difficulty =
					(value.parse()).map_err(field_err(SECTION_DIFFICULTY, "OverallDifficulty", line))?;
			}
			"ApproachRate" => {
				section.approach_rate = (value.parse()).map_err(field_err(SECTION_DIFFICULTY, "ApproachRate", line))?;
			}
			"SliderMultiplier" => {
				section.slider_multiplier =
					(value.parse()).map_err(field_err(SECTION_DIFFICULTY, "SliderMultiplier", line))?;
			}
			"SliderTickRate" => {
				section.slider_tick_rate =
					(value.parse()).map_err(field_err(SECTION_DIFFICULTY, "SliderTickRate", line))?;
			}
			key => tracing::warn!("[Difficulty] section: unknown field {key:?}"),
		}
	}

	Ok(section)
}

fn parse_timing_points_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Result<Vec<TimingPoint>, SectionParseError> {
	let mut timing_points = Vec::new();

	while let Some(line) = next_section_line(lines, section_header) {
		let timing_point = parse_timing_point(line).map_err(section_err(SECTION_TIMING_POINTS, line))?;
		timing_points.push(timing_point);
	}

	Ok(timing_points)
}

fn parse_colours_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Result<ColoursSection, SectionParseError> {
	let mut section = ColoursSection::default();

	while let Some(line) = next_section_line(lines, section_header) {
		let (key, value) = parse_field_value_pair(line).map_err(section_err(SECTION_COLOURS, line))?;
		let colour = parse_combo_colour(&value).map_err(section_err(SECTION_COLOURS, line))?;

		if key.starts_with("Combo") {
			// NOTE: the written index of the combo colour is not honored,
			// declaration order is.
			section.combo_colours.push(colour);
		} else {
			section.special_colours.push(SpecialColour { name: key, colour });
		}
	}

	Ok(section)
}

fn parse_events_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Result<Vec<Event>, SectionParseError> {
	let mut events = Vec::new();

	while let Some(line) = next_section_line(lines, section_header) {
		let event = parse_event(line).map_err(section_err(SECTION_EVENTS, line))?;
		events.push(event);
	}

	Ok(events)
}

fn parse_hit_objects_section<'a>(
	lines: &mut impl Iterator<Item = &'a str>,
	section_header: &mut Option<String>,
) -> Result<Vec<HitObject>, SectionParseError> {
	let mut hit_objects = Vec::new();

	while let Some(line) = next_section_line(lines, section_header) {
		let hit_object = parse_hit_object(line).map_err(section_err(SECTION_HIT_OBJECTS, line))?;
		hit_objects.push(hit_object);
	}

	Ok(hit_objects)
}

fn skip_section<'a>(lines: &mut impl Iterator<Item = &'a str>, section_header: &mut Option<String>) {
	while next_section_line(lines, section_header).is_some() {}
}

#[derive(Debug, thiserror::Error)]
pub enum BeatmapParseError {
	#[error("File is empty")]
	FileIsEmpty,

	#[error("First line doesn't match \"osu file format v<version>\"")]
	InvalidOsuFileFormat,

	#[error(transparent)]
	SectionParse(#[from] SectionParseError),
}

/// Parses a whole `.osu` text blob into a [`BeatmapFile`].
pub(crate) fn parse_beatmap_file(blob: &str) -> Result<BeatmapFile, BeatmapParseError> {
	let mut beatmap = BeatmapFile::default();

	// Comments and blank lines are not meaningful anywhere in the format.
	let mut lines = blob.lines().filter(|line| {
		let l = line.trim();
		!l.is_empty() && !l.starts_with("//")
	});

	let header = lines.next().ok_or(BeatmapParseError::FileIsEmpty)?;

	// A ZERO WIDTH NO-BREAK SPACE (BOM) sometimes precedes the header.
	let format_version = header
		.trim_start_matches('\u{feff}')
		.trim_end()
		.strip_prefix("osu file format v")
		.ok_or(BeatmapParseError::InvalidOsuFileFormat)?;
	beatmap.format_version = (format_version.parse()).map_err(|_| BeatmapParseError::InvalidOsuFileFormat)?;

	let mut section_header: Option<String> = lines.next().map(|line| line.trim_end().to_owned());
	while let Some(section) = section_header.take() {
		match section.as_str() {
			SECTION_GENERAL => {
				beatmap.general = parse_key_value_section(&mut lines, SECTION_GENERAL, &mut section_header)?;
			}
			SECTION_EDITOR => {
				beatmap.editor = parse_key_value_section(&mut lines, SECTION_EDITOR, &mut section_header)?;
			}
			SECTION_METADATA => {
				beatmap.metadata = parse_key_value_section(&mut lines, SECTION_METADATA, &mut section_header)?;
			}
			SECTION_DIFFICULTY => {
				beatmap.difficulty = parse_difficulty_section(&mut lines, &mut section_header)?;
			}
			SECTION_EVENTS => {
				beatmap.events = parse_events_section(&mut lines, &mut section_header)?;
			}
			SECTION_TIMING_POINTS => {
				beatmap.timing_points = parse_timing_points_section(&mut lines, &mut section_header)?;
			}
			SECTION_COLOURS => {
				beatmap.colours = parse_colours_section(&mut lines, &mut section_header)?;
			}
			SECTION_HIT_OBJECTS => {
				beatmap.hit_objects = parse_hit_objects_section(&mut lines, &mut section_header)?;
			}
			unknown => {
				tracing::warn!("skipping unknown section {unknown:?}");
				skip_section(&mut lines, &mut section_header);
			}
		}
	}

	Ok(beatmap)
}

#[cfg(test)]
mod tests {
	use test_case::test_case;

	use super::*;
	use crate::file::beatmap::{HitSample, SampleSet};

	#[test]
	fn minimal_circle() {
		let ho = parse_hit_object("256,192,1000,1,0,0:0:0:0:").unwrap();

		assert!(ho.is_circle);
		assert!(!ho.is_slider && !ho.is_spinner && !ho.is_hold_note);
		assert_eq!(ho.pos, Point::new(256.0, 192.0));
		assert_eq!(ho.time, 1000.0);
		assert_eq!(ho.hitsounds, HitSound::NONE);
		assert_eq!(ho.repeat, 0);
		assert_eq!(ho.end_time(), 1000.0);
		assert_eq!(ho.hit_sample, HitSample::default());
	}

	#[test]
	fn default_extras_are_idempotent() {
		// A missing extras field and an explicitly all-default one decode to
		// the same object.
		let implicit = parse_hit_object("256,192,1000,1,0").unwrap();
		let explicit = parse_hit_object("256,192,1000,1,0,0:0:0:0:").unwrap();

		assert_eq!(implicit, explicit);
		assert_eq!(implicit.hit_sample.sample_set, SampleSet::Auto);
		assert_eq!(implicit.hit_sample.addition_set, SampleSet::Auto);
		assert_eq!(implicit.hit_sample.custom_index, 0);
		assert_eq!(implicit.hit_sample.volume, 0.0);
		assert_eq!(implicit.hit_sample.filename, "");
	}

	#[test]
	fn slider_with_edges() {
		let ho = parse_hit_object("100,100,500,2,0,B|150:150|200:100,2,150.0,0|8|0,1:0|0:0|1:0,0:0:0:0:").unwrap();

		assert!(ho.is_slider);
		assert_eq!(ho.path_type, PathType::Bezier);
		// Two anchors besides the head.
		assert_eq!(ho.curve_points, vec![Point::new(150.0, 150.0), Point::new(200.0, 100.0)]);
		assert_eq!(ho.repeat, 2);
		assert_eq!(ho.pixel_length, 150.0);
		assert_eq!(
			ho.edge_hitsounds,
			vec![HitSound::NONE, HitSound::CLAP, HitSound::NONE]
		);
		assert_eq!(
			ho.edge_sample_sets,
			vec![SampleSet::Normal, SampleSet::Auto, SampleSet::Normal]
		);
		assert_eq!(
			ho.edge_addition_sets,
			vec![SampleSet::Auto, SampleSet::Auto, SampleSet::Auto]
		);
	}

	#[test]
	fn spinner() {
		let ho = parse_hit_object("256,192,1000,12,0,3000,0:0:0:0:").unwrap();

		assert!(ho.is_spinner);
		assert!(ho.new_combo);
		assert_eq!(ho.repeat, 1);
		assert_eq!(ho.end_time(), 3000.0);
	}

	#[test]
	fn hold_note() {
		let ho = parse_hit_object("128,192,1000,128,0,2000:0:0:0:0:").unwrap();

		assert!(ho.is_hold_note);
		assert_eq!(ho.repeat, 1);
		assert_eq!(ho.end_time(), 2000.0);
		assert_eq!(ho.temporal_length, 1000.0);
		assert_eq!(ho.hit_sample, HitSample::default());
	}

	#[test]
	fn hold_note_filename_keeps_its_colons() {
		let ho = parse_hit_object("128,192,1000,128,0,2000:1:2:3:40:a:b.wav").unwrap();

		assert_eq!(ho.hit_sample.sample_set, SampleSet::Normal);
		assert_eq!(ho.hit_sample.addition_set, SampleSet::Soft);
		assert_eq!(ho.hit_sample.custom_index, 3);
		assert_eq!(ho.hit_sample.volume, 40.0);
		assert_eq!(ho.hit_sample.filename, "a:b.wav");
	}

	#[test]
	fn short_edge_arrays_pad_with_the_objects_own_hitsounds() {
		// Repeat 3 wants 4 entries; only 2 are supplied.
		let ho = parse_hit_object("0,0,0,2,4,L|100:0,3,300,2|8,0:0,0:0:0:0:").unwrap();

		assert_eq!(
			ho.edge_hitsounds,
			vec![HitSound::WHISTLE, HitSound::CLAP, HitSound::FINISH, HitSound::FINISH]
		);
		assert_eq!(ho.edge_sample_sets.len(), 4);
		assert_eq!(ho.edge_sample_sets[1], SampleSet::Auto);
		assert_eq!(ho.edge_addition_sets.len(), 4);
	}

	#[test]
	fn absent_edge_arrays_are_built_at_full_size() {
		let ho = parse_hit_object("0,0,0,2,4,L|100:0,1,100").unwrap();

		assert_eq!(ho.edge_hitsounds, vec![HitSound::FINISH, HitSound::FINISH]);
		assert_eq!(ho.edge_sample_sets, vec![SampleSet::Auto, SampleSet::Auto]);
		assert_eq!(ho.edge_addition_sets, vec![SampleSet::Auto, SampleSet::Auto]);
	}

	#[test]
	fn unparsable_edge_set_tokens_fall_back_to_auto() {
		let ho = parse_hit_object("0,0,0,2,0,L|100:0,1,100,0|0,junk|9:9,0:0:0:0:").unwrap();

		assert_eq!(ho.edge_sample_sets, vec![SampleSet::Auto, SampleSet::Auto]);
		assert_eq!(ho.edge_addition_sets, vec![SampleSet::Auto, SampleSet::Auto]);
	}

	#[test_case("0:0|100:100|B|200:0", PathType::Bezier ; "letter after anchors wins")]
	#[test_case("P|0:0|B|100:100|L|200:0", PathType::Linear ; "last of several letters wins")]
	#[test_case("0:0|100:100", PathType::Catmull ; "no letter defaults to catmull")]
	#[test_case("C|0:0", PathType::Catmull ; "explicit catmull")]
	fn path_type_resolution(curve_data: &str, expected: PathType) {
		let line = format!("0,0,0,2,0,{curve_data},1,100");
		let ho = parse_hit_object(&line).unwrap();

		assert_eq!(ho.path_type, expected);
	}

	#[test]
	fn curve_tokens_without_one_colon_are_skipped() {
		let ho = parse_hit_object("0,0,0,2,0,B|1:2:3|100:100,1,100").unwrap();

		assert_eq!(ho.curve_points, vec![Point::new(100.0, 100.0)]);
	}

	#[test]
	fn spinner_zeroes_combo_skip_bits() {
		// Type 0b0111_1000: spinner with all three skip bits set.
		let ho = parse_hit_object("256,192,1000,120,0,3000,0:0:0:0:").unwrap();

		assert!(ho.is_spinner);
		assert_eq!(ho.combo_skip, 0);

		// The same skip bits on a circle survive.
		let ho = parse_hit_object("256,192,1000,117,0").unwrap();
		assert!(ho.is_circle);
		assert_eq!(ho.combo_skip, 0b111);
	}

	#[test]
	fn too_few_fields_is_a_missing_values_error() {
		let err = parse_hit_object("256,192,1000,1").unwrap_err();

		assert_eq!(err.line, "256,192,1000,1");
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::MissingValues { expected: 5, got: 4 }
		));

		let err = parse_hit_object("0,0,0,2,0,B|100:100").unwrap_err();
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::MissingValues { expected: 8, got: 6 }
		));

		let err = parse_hit_object("256,192,1000,12,0").unwrap_err();
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::MissingValues { expected: 6, got: 5 }
		));
	}

	#[test]
	fn bad_fields_name_the_offending_sub_value() {
		let err = parse_hit_object("abc,192,1000,1,0").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidCoordinate(_)));

		let err = parse_hit_object("256,192,xyz,1,0").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidTime(_)));

		let err = parse_hit_object("256,192,1000,nope,0").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidObjectType(_)));

		let err = parse_hit_object("256,192,1000,1,nope").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidHitsounds(_)));

		let err = parse_hit_object("0,0,0,2,0,L|100:0,nope,100").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidRepeat(_)));

		let err = parse_hit_object("0,0,0,2,0,L|100:0,1,nope").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidPixelLength(_)));

		let err = parse_hit_object("256,192,1000,12,0,nope").unwrap_err();
		assert!(matches!(err.kind, HitObjectParseErrorKind::InvalidSpinnerEndTime(_)));

		let err = parse_hit_object("256,192,1000,1,0,9:0:0:0:").unwrap_err();
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::Extras(ExtrasParseErrorKind::InvalidSampleSet(_))
		));

		let err = parse_hit_object("256,192,1000,1,0,0:0:0:loud:").unwrap_err();
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::Extras(ExtrasParseErrorKind::InvalidVolume(_))
		));

		let err = parse_hit_object("128,192,1000,128,0,never:0:0:0:0:").unwrap_err();
		assert!(matches!(
			err.kind,
			HitObjectParseErrorKind::Extras(ExtrasParseErrorKind::InvalidHoldEndTime(_))
		));
	}

	#[test]
	fn colour_channels_fail_in_order() {
		assert_eq!(
			parse_combo_colour("255,192,0").unwrap(),
			ComboColour::new(255, 192, 0)
		);

		let err = parse_combo_colour("256,nope,0").unwrap_err();
		assert!(matches!(err.kind, ColourParseErrorKind::InvalidRed(_)));

		let err = parse_combo_colour("255,nope,bad").unwrap_err();
		assert!(matches!(err.kind, ColourParseErrorKind::InvalidGreen(_)));

		let err = parse_combo_colour("255,192,999").unwrap_err();
		assert!(matches!(err.kind, ColourParseErrorKind::InvalidBlue(_)));

		let err = parse_combo_colour("255,192").unwrap_err();
		assert!(matches!(err.kind, ColourParseErrorKind::WrongChannelCount(2)));
	}

	#[test]
	fn standard_loop_decodes_its_two_integers() {
		let event = parse_event(" L,1500,8").unwrap();

		assert_eq!(event.indent, 1);
		assert_eq!(
			event.kind,
			EventKind::StandardLoop {
				start_time: 1500,
				loop_count: 8
			}
		);

		// Underscore nesting markers count the same.
		let event = parse_event("__L,0,2").unwrap();
		assert_eq!(event.indent, 2);
	}

	#[test]
	fn standard_loop_failures_are_distinct() {
		let err = parse_event(" L,nope,8").unwrap_err();
		assert!(matches!(err.kind, EventParseErrorKind::InvalidStartTime(_)));

		let err = parse_event(" L,1500").unwrap_err();
		assert!(matches!(err.kind, EventParseErrorKind::MissingLoopCount));

		let err = parse_event(" L,1500,many").unwrap_err();
		assert!(matches!(err.kind, EventParseErrorKind::InvalidLoopCount(_)));
	}

	#[test]
	fn trigger_loop_and_generic_commands_decode() {
		let event = parse_event(" T,HitSoundClap,0,3000").unwrap();
		assert_eq!(
			event.kind,
			EventKind::TriggerLoop {
				trigger: "HitSoundClap".to_owned(),
				start_time: 0,
				end_time: 3000
			}
		);

		let event = parse_event("  F,0,1500,2000,1,0").unwrap();
		assert_eq!(event.indent, 2);
		assert_eq!(
			event.kind,
			EventKind::Command {
				identifier: "F".to_owned(),
				params: vec!["0".into(), "1500".into(), "2000".into(), "1".into(), "0".into()],
			}
		);

		// Unknown identifiers round-trip verbatim.
		let event = parse_event("0,0,\"bg.jpg\",0,0").unwrap();
		assert_eq!(event.kind, EventKind::Raw("0,0,\"bg.jpg\",0,0".to_owned()));
	}

	#[test]
	fn timing_point_defaults_fill_missing_fields() {
		let tp = parse_timing_point("1000,500").unwrap();
		assert_eq!(tp.time, 1000.0);
		assert_eq!(tp.beat_length, 500.0);
		assert_eq!(tp.meter, 4);
		assert!(tp.uninherited);

		let tp = parse_timing_point("24,-50,4,2,1,60,0,1").unwrap();
		assert!(!tp.uninherited);
		assert_eq!(tp.sample_set, SampleSet::Soft);
		assert_eq!(tp.volume, 60);
		assert_eq!(tp.effects, 1);

		assert!(matches!(
			parse_timing_point("1000"),
			Err(TimingPointParseError::LessThan2Values(1))
		));
		assert!(matches!(
			parse_timing_point("1,2,3,0,5,6,7,8,9"),
			Err(TimingPointParseError::MoreThan8Values(9))
		));
	}

	#[test]
	fn full_file_parses_section_by_section() {
		let blob = "\
osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0

[Metadata]
Title:Some Song
Artist:Someone

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:7
ApproachRate:9
SliderMultiplier:1.6
SliderTickRate:1

[Events]
//Background and Video events
0,0,\"bg.jpg\",0,0
 L,1500,8

[TimingPoints]
0,500,4,1,0,100,1,0
400,-50,4,1,0,100,0,0

[Colours]
Combo1 : 255,192,0
SliderBorder : 120,120,120

[HitObjects]
256,192,1000,1,0,0:0:0:0:
100,100,500,2,0,B|150:150|200:100,2,150.0,0|8|0,1:0|0:0|1:0,0:0:0:0:
";

		let beatmap = BeatmapFile::parse_str(blob).unwrap();

		assert_eq!(beatmap.format_version, 14);
		assert_eq!(beatmap.general.get("AudioFilename"), Some("audio.mp3"));
		assert_eq!(beatmap.metadata.get("Title"), Some("Some Song"));
		assert_eq!(beatmap.difficulty.slider_multiplier, 1.6);
		assert_eq!(beatmap.events.len(), 2);
		assert_eq!(beatmap.timing_points.len(), 2);
		assert_eq!(beatmap.colours.combo_colours, vec![ComboColour::new(255, 192, 0)]);
		assert_eq!(beatmap.colours.special_colours.len(), 1);
		assert_eq!(beatmap.colours.special_colours[0].name, "SliderBorder");
		assert_eq!(beatmap.hit_objects.len(), 2);
		assert!(beatmap.hit_objects[1].is_slider);
	}

	#[test]
	fn unknown_sections_are_skipped_not_fatal() {
		let blob = "\
osu file format v14

[Mystery]
whatever: 1

[General]
Mode: 3
";

		let beatmap = BeatmapFile::parse_str(blob).unwrap();

		assert_eq!(beatmap.general.get("Mode"), Some("3"));
	}

	#[test]
	fn failed_decode_propagates_with_the_raw_line() {
		let blob = "\
osu file format v14

[HitObjects]
256,192,1000,1
";

		let err = BeatmapFile::parse_str(blob).unwrap_err();
		let BeatmapParseError::SectionParse(section_err) = err else {
			panic!("expected a section error");
		};

		assert_eq!(section_err.section, SECTION_HIT_OBJECTS);
		assert_eq!(section_err.line, "256,192,1000,1");
	}
}
