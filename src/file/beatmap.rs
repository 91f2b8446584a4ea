use std::fmt;
use std::io::{self, Write};
use std::num::ParseIntError;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Bound};
use std::str::FromStr;

pub mod parsing;
pub mod serializing;

use crate::point::Point;
use crate::timing::{is_close, Timing, DOUBLE_EPSILON};
use crate::{Timestamped, TimestampedSlice};
use parsing::parse_beatmap_file;
pub use parsing::{
	BeatmapParseError, ColourParseError, ColourParseErrorKind, EventParseError, EventParseErrorKind,
	ExtrasParseErrorKind, HitObjectParseError, HitObjectParseErrorKind, InvalidKeyValuePairError, SectionParseError,
	SectionParseErrorKind, TimingPointParseError,
};
use serializing::write_beatmap_file;

pub type Timestamp = f64;

/// Width of the playfield in osu! pixels; mania column maths divide it evenly.
pub const PLAYFIELD_WIDTH: f64 = 512.0;
/// Y coordinate forced onto mania objects, the vertical centre of the playfield.
pub const PLAYFIELD_CENTRE_Y: f64 = 192.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameMode {
	#[default]
	Standard,
	Taiko,
	Catch,
	Mania,
}

impl GameMode {
	#[must_use]
	pub const fn from_wire(mode: u8) -> Self {
		match mode {
			1 => Self::Taiko,
			2 => Self::Catch,
			3 => Self::Mania,
			_ => Self::Standard,
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown sample set {0:?}")]
pub struct InvalidSampleSetError(pub String);

/// A bank of samples for normal, whistle, finish and clap hitsounds.
/// `Auto` defers to the governing timing point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(u8)]
pub enum SampleSet {
	#[default]
	Auto = 0,
	Normal = 1,
	Soft = 2,
	Drum = 3,
}

impl FromStr for SampleSet {
	type Err = InvalidSampleSetError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"0" => Ok(Self::Auto),
			"1" => Ok(Self::Normal),
			"2" => Ok(Self::Soft),
			"3" => Ok(Self::Drum),
			s => Err(InvalidSampleSetError(s.to_owned())),
		}
	}
}

/// The four hitsound flags of an object or slider edge, packed into the low
/// four bits exactly as they appear on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct HitSound(u8);

impl HitSound {
	pub const NONE: Self = Self(0b0000);
	pub const NORMAL: Self = Self(0b0001);
	pub const WHISTLE: Self = Self(0b0010);
	pub const FINISH: Self = Self(0b0100);
	pub const CLAP: Self = Self(0b1000);

	/// Bits above the clap flag carry no meaning and are discarded.
	#[must_use]
	pub const fn new(bits: u8) -> Self {
		Self(bits & 0b1111)
	}

	#[must_use]
	pub const fn bits(self) -> u8 {
		self.0
	}

	#[must_use]
	pub const fn has(self, flag: Self) -> bool {
		self.0 & flag.0 > 0
	}

	#[must_use]
	pub const fn has_normal(self) -> bool {
		self.has(Self::NORMAL)
	}

	#[must_use]
	pub const fn has_whistle(self) -> bool {
		self.has(Self::WHISTLE)
	}

	#[must_use]
	pub const fn has_finish(self) -> bool {
		self.has(Self::FINISH)
	}

	#[must_use]
	pub const fn has_clap(self) -> bool {
		self.has(Self::CLAP)
	}
}

impl fmt::Display for HitSound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for HitSound {
	type Err = ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new(u8::from_str(s)?))
	}
}

impl BitAnd for HitSound {
	type Output = Self;

	fn bitand(self, rhs: Self) -> Self::Output {
		Self(self.0 & rhs.0)
	}
}

impl BitAndAssign for HitSound {
	fn bitand_assign(&mut self, rhs: Self) {
		self.0 &= rhs.0;
	}
}

impl BitOr for HitSound {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}

impl BitOrAssign for HitSound {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}

/// Curve type a slider path is built from.
///
/// A slider's curve data may spell the letter anywhere between its anchor
/// tokens; the last valid letter wins and `Catmull` is the fallback when no
/// letter is present at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathType {
	Linear,
	Bezier,
	PerfectCurve,
	#[default]
	Catmull,
}

impl PathType {
	#[must_use]
	pub fn from_letter(token: &str) -> Option<Self> {
		match token {
			"L" => Some(Self::Linear),
			"B" => Some(Self::Bezier),
			"P" => Some(Self::PerfectCurve),
			"C" => Some(Self::Catmull),
			_ => None,
		}
	}

	#[must_use]
	pub const fn letter(self) -> char {
		match self {
			Self::Linear => 'L',
			Self::Bezier => 'B',
			Self::PerfectCurve => 'P',
			Self::Catmull => 'C',
		}
	}
}

/// The colon-delimited extras tail shared by every hit object kind.
#[derive(Clone, Debug, PartialEq)]
pub struct HitSample {
	/// Sample set of the normal sound.
	pub sample_set: SampleSet,
	/// Sample set of the whistle, finish and clap sounds.
	pub addition_set: SampleSet,
	/// Index of the custom sample. `0` defers to the timing point's index.
	pub custom_index: u32,
	/// Volume of the sample. `0` defers to the timing point's volume.
	pub volume: f64,
	/// Custom filename of the addition sound, empty when unset.
	pub filename: String,
}

impl Default for HitSample {
	fn default() -> Self {
		Self {
			sample_set: SampleSet::Auto,
			addition_set: SampleSet::Auto,
			custom_index: 0,
			volume: 0.0,
			filename: String::new(),
		}
	}
}

impl HitSample {
	#[must_use]
	pub fn to_osu_string(&self) -> String {
		format!(
			"{}:{}:{}:{}:{}",
			self.sample_set as u8,
			self.addition_set as u8,
			self.custom_index,
			self.volume.round() as i64,
			self.filename,
		)
	}
}

/// An additive combo colour, each channel in `[0, 255]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComboColour {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
}

impl ComboColour {
	#[must_use]
	pub const fn new(red: u8, green: u8, blue: u8) -> Self {
		Self { red, green, blue }
	}

	/// The stock palette applied to maps that define no combo colours.
	#[must_use]
	pub const fn default_palette() -> [Self; 4] {
		[
			Self::new(255, 192, 0),
			Self::new(0, 202, 0),
			Self::new(18, 124, 255),
			Self::new(242, 24, 57),
		]
	}

	#[must_use]
	pub fn to_osu_string(&self) -> String {
		let Self { red, green, blue } = self;
		format!("{red},{green},{blue}")
	}
}

/// A named colour from the colours section (slider track override, slider
/// border and friends). The name is the section key and takes part in
/// identity: two special colours are equal iff name and colour both match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpecialColour {
	pub name: String,
	pub colour: ComboColour,
}

/// Timing and control points
#[derive(Clone, Debug, PartialEq)]
pub struct TimingPoint {
	/// Start time of the timing section, in milliseconds from the beginning of the beatmap's audio.
	pub time: Timestamp,
	/// For uninherited timing points, the duration of a beat in milliseconds.
	/// For inherited timing points, a negative inverse slider velocity multiplier as a percentage;
	/// `-50` makes sliders twice as fast as the base `slider_multiplier`.
	pub beat_length: f64,
	/// Amount of beats in a measure. Inherited timing points ignore this property.
	pub meter: i32,
	/// Default sample set for hit objects under this point.
	pub sample_set: SampleSet,
	/// Custom sample index for hit objects. `0` indicates the default hitsounds.
	pub sample_index: u32,
	/// Volume percentage for hit objects.
	pub volume: u8,
	/// Whether the timing point is uninherited (a "redline" defining absolute BPM).
	pub uninherited: bool,
	/// Bit flags that give the timing point extra effects.
	pub effects: u32,
}

impl Default for TimingPoint {
	fn default() -> Self {
		Self {
			time: 0.0,
			beat_length: 500.0,
			meter: 4,
			sample_set: SampleSet::Auto,
			sample_index: 0,
			volume: 100,
			uninherited: true,
			effects: 0,
		}
	}
}

impl Timestamped for TimingPoint {
	fn timestamp(&self) -> Timestamp {
		self.time
	}
}

/// One sub-event on the editor timeline, one per traversed slider edge
/// (a circle owns exactly one, a spinner or hold note two).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineObject {
	pub time: Timestamp,
	/// 0 for the head, `repeat` for the tail.
	pub edge_index: u32,
	pub hitsounds: HitSound,
}

/// A storyboard-style directive from the events section.
///
/// Commands nest by indentation; the depth is carried here because it is part
/// of the line, never part of any variant's own grammar.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
	pub indent: usize,
	pub kind: EventKind,
}

/// Event/command line variants, keyed by the leading identifier token.
///
/// `StandardLoop` cannot share the generic command codec: its second data
/// field is a repeat count, not a second timestamp.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
	/// `L,<startTime>,<loopCount>` — repeats the nested commands `loop_count` times.
	StandardLoop { start_time: i32, loop_count: u32 },
	/// `T,<triggerType>,<startTime>,<endTime>` — plays the nested commands while the trigger fires.
	TriggerLoop {
		trigger: String,
		start_time: i32,
		end_time: i32,
	},
	/// Any other command directive, kept as identifier plus raw parameters.
	Command { identifier: String, params: Vec<String> },
	/// Top-level events (backgrounds, breaks, videos…), kept verbatim.
	Raw(String),
}

/// Hit object
///
/// The type flags are stored independently even though real files only ever
/// set one of them; this keeps `set_object_type(get_object_type())` the
/// identity over the whole byte (modulo the spinner combo-skip rule) so that
/// unusual files survive a round trip.
#[derive(Clone, Debug, PartialEq)]
pub struct HitObject {
	pub pos: Point,
	/// Time when the object is to be hit, in milliseconds from the beginning of the beatmap's audio.
	pub time: Timestamp,
	pub is_circle: bool,
	pub is_slider: bool,
	pub is_spinner: bool,
	pub is_hold_note: bool,
	pub new_combo: bool,
	/// How many combo colours to skip when this object starts a new combo.
	/// Always zero on spinners, regardless of the decoded bits.
	pub combo_skip: u8,
	pub hitsounds: HitSound,
	pub path_type: PathType,
	/// Slider anchors, excluding the head (which lives in `pos`).
	pub curve_points: Vec<Point>,
	/// 0 for circles, 1 for spinners and hold notes, the span count for sliders.
	pub repeat: u32,
	/// Visual length of one slider span in osu! pixels.
	pub pixel_length: f64,
	/// Per-edge hitsounds, sized `repeat + 1` when present.
	pub edge_hitsounds: Vec<HitSound>,
	/// Per-edge normal sample sets, sized `repeat + 1` when present.
	pub edge_sample_sets: Vec<SampleSet>,
	/// Per-edge addition sample sets, sized `repeat + 1` when present.
	pub edge_addition_sets: Vec<SampleSet>,
	pub hit_sample: HitSample,
	/// Duration of one span in milliseconds; `end_time` derives from this.
	pub temporal_length: f64,
	/// Timing points active along the slider body, owned by the object.
	pub body_hitsounds: Vec<TimingPoint>,
	/// Per-edge timeline sub-events, owned by the object.
	pub timeline_objects: Vec<TimelineObject>,
}

impl Default for HitObject {
	fn default() -> Self {
		Self {
			pos: Point::default(),
			time: 0.0,
			is_circle: true,
			is_slider: false,
			is_spinner: false,
			is_hold_note: false,
			new_combo: false,
			combo_skip: 0,
			hitsounds: HitSound::NONE,
			path_type: PathType::default(),
			curve_points: Vec::new(),
			repeat: 0,
			pixel_length: 0.0,
			edge_hitsounds: Vec::new(),
			edge_sample_sets: Vec::new(),
			edge_addition_sets: Vec::new(),
			hit_sample: HitSample::default(),
			temporal_length: 0.0,
			body_hitsounds: Vec::new(),
			timeline_objects: Vec::new(),
		}
	}
}

impl Timestamped for HitObject {
	fn timestamp(&self) -> Timestamp {
		self.time
	}
}

impl HitObject {
	/// Bit of the type byte marking a hit circle.
	pub const TYPE_CIRCLE_BIT: u8 = 0;
	/// Bit of the type byte marking a slider.
	pub const TYPE_SLIDER_BIT: u8 = 1;
	/// Bit of the type byte marking the start of a new combo.
	pub const TYPE_NEW_COMBO_BIT: u8 = 2;
	/// Bit of the type byte marking a spinner.
	pub const TYPE_SPINNER_BIT: u8 = 3;
	/// Lowest of the three combo-skip bits of the type byte.
	pub const TYPE_COMBO_SKIP_BIT: u8 = 4;
	/// Bit of the type byte marking an osu!mania hold note.
	pub const TYPE_HOLD_NOTE_BIT: u8 = 7;

	/// Packs the type flags back into the wire byte.
	#[must_use]
	pub fn get_object_type(&self) -> u8 {
		u8::from(self.is_circle) << Self::TYPE_CIRCLE_BIT
			| u8::from(self.is_slider) << Self::TYPE_SLIDER_BIT
			| u8::from(self.new_combo) << Self::TYPE_NEW_COMBO_BIT
			| u8::from(self.is_spinner) << Self::TYPE_SPINNER_BIT
			| (self.combo_skip & 0b111) << Self::TYPE_COMBO_SKIP_BIT
			| u8::from(self.is_hold_note) << Self::TYPE_HOLD_NOTE_BIT
	}

	/// Unpacks the wire byte into the type flags. Combo skip is zeroed when
	/// the spinner bit is set.
	pub fn set_object_type(&mut self, value: u8) {
		self.is_circle = value & 1 << Self::TYPE_CIRCLE_BIT > 0;
		self.is_slider = value & 1 << Self::TYPE_SLIDER_BIT > 0;
		self.new_combo = value & 1 << Self::TYPE_NEW_COMBO_BIT > 0;
		self.is_spinner = value & 1 << Self::TYPE_SPINNER_BIT > 0;
		self.is_hold_note = value & 1 << Self::TYPE_HOLD_NOTE_BIT > 0;
		self.combo_skip = if self.is_spinner {
			0
		} else {
			(value >> Self::TYPE_COMBO_SKIP_BIT) & 0b111
		};
	}

	/// End time of the object: `floor(time + temporal_length * repeat + ε)`
	/// for span-carrying objects, the start time otherwise. The epsilon bias
	/// counters binary rounding when the product lands on an exact
	/// millisecond boundary.
	#[must_use]
	pub fn end_time(&self) -> Timestamp {
		if self.repeat == 0 {
			self.time
		} else {
			(self.time + self.temporal_length * f64::from(self.repeat) + DOUBLE_EPSILON).floor()
		}
	}

	/// Stores `end_time` by converting it back into a temporal length.
	/// Objects without spans have no end time of their own.
	pub fn set_end_time(&mut self, end_time: Timestamp) {
		if self.repeat != 0 {
			self.temporal_length = (end_time - self.time) / f64::from(self.repeat);
		}
	}

	/// Whether encoding this slider needs the optional edge/extras tail.
	///
	/// Compact lines omit the tail entirely; it is emitted as soon as any
	/// edge hitsound differs from the object's own hitsounds, any edge set
	/// differs from `Auto`, or the extras tail itself is non-default.
	#[must_use]
	pub fn has_non_default_slider_extras(&self) -> bool {
		self.edge_hitsounds.iter().any(|hs| *hs != self.hitsounds)
			|| self.edge_sample_sets.iter().any(|set| *set != SampleSet::Auto)
			|| self.edge_addition_sets.iter().any(|set| *set != SampleSet::Auto)
			|| self.hit_sample.sample_set != SampleSet::Auto
			|| self.hit_sample.addition_set != SampleSet::Auto
			|| self.hit_sample.custom_index != 0
			|| !is_close(self.hit_sample.volume, 0.0)
			|| !self.hit_sample.filename.is_empty()
	}

	/// Shifts the object in time, dragging the timeline along and dropping
	/// body hitsounds that no longer fall strictly inside the body.
	pub fn move_time(&mut self, delta: f64) {
		self.time += delta;

		for timeline_object in &mut self.timeline_objects {
			timeline_object.time += delta;
		}

		let (start, end) = (self.time, self.end_time());
		self.body_hitsounds.retain(|tp| tp.time > start && tp.time < end);
	}

	/// Changes the duration of one span by `delta` milliseconds.
	///
	/// Sliders also need their pixel length scaled so the slider ball still
	/// arrives at the end on time: the length delta follows from the
	/// governing BPM, the raw greenline velocity and the map's base
	/// multiplier.
	pub fn change_temporal_time(&mut self, timing: &Timing, delta: f64) {
		if self.repeat == 0 {
			return;
		}

		if self.is_slider {
			let mpb = timing.mpb_at(self.time);
			let velocity = timing.slider_velocity_at(self.time);
			self.pixel_length += -10000.0 * timing.slider_multiplier * delta / (mpb * velocity);
		}

		self.temporal_length += delta;

		let end_time = self.end_time();
		if let Some(last) = self.timeline_objects.last_mut() {
			last.time = end_time;
		}
		self.body_hitsounds.retain(|tp| tp.time < end_time);
	}

	/// Moves the end time by `delta`, spreading the change over every span.
	pub fn move_end_time(&mut self, timing: &Timing, delta: f64) {
		if self.repeat == 0 {
			return;
		}

		self.change_temporal_time(timing, delta / f64::from(self.repeat));
	}

	/// Translates the object, anchors included.
	pub fn translate(&mut self, delta: Point) {
		self.pos += delta;

		if self.is_slider {
			for anchor in &mut self.curve_points {
				*anchor += delta;
			}
		}
	}

	/// Snaps the start time to the nearer of the two divisor grids.
	/// Returns whether the object actually moved.
	pub fn resnap_self(&mut self, timing: &Timing, snap1: u32, snap2: u32) -> bool {
		let new_time = timing.resnap(self.time, snap1, snap2, true);
		let delta = new_time - self.time;
		self.move_time(delta);

		delta.abs() > DOUBLE_EPSILON
	}

	/// Snaps the end of the object.
	///
	/// A tempo change inside the slider body makes span arithmetic against a
	/// single redline meaningless, so the absolute end time is snapped
	/// instead. The redline scan deliberately looks 20 ms past the end time
	/// to also catch a redline placed "at" the slider end.
	pub fn resnap_end(&mut self, timing: &Timing, snap1: u32, snap2: u32) -> bool {
		if !self.is_slider || timing.has_redline_between(self.time, self.end_time() + 20.0) {
			self.resnap_end_time(timing, snap1, snap2)
		} else {
			self.resnap_end_classic(timing, snap1, snap2)
		}
	}

	/// Snaps the absolute end time against the grid of its governing redline.
	pub fn resnap_end_time(&mut self, timing: &Timing, snap1: u32, snap2: u32) -> bool {
		let end_time = self.end_time();
		let new_end_time = timing.resnap(end_time, snap1, snap2, true);
		let delta = new_end_time - end_time;
		self.move_end_time(timing, delta);

		delta.abs() > DOUBLE_EPSILON
	}

	/// Snaps the temporal length to an exact multiple of the governing
	/// redline's beat length divided by the snap divisor, for whichever
	/// divisor lands nearer.
	pub fn resnap_end_classic(&mut self, timing: &Timing, snap1: u32, snap2: u32) -> bool {
		let mpb = timing.mpb_at(self.time);
		let length1 = Timing::nearest_multiple(self.temporal_length, mpb / f64::from(snap1));
		let length2 = Timing::nearest_multiple(self.temporal_length, mpb / f64::from(snap2));

		let new_length = if (length1 - self.temporal_length).abs() <= (length2 - self.temporal_length).abs() {
			length1
		} else {
			length2
		};

		let delta = new_length - self.temporal_length;
		self.change_temporal_time(timing, delta);

		delta.abs() > DOUBLE_EPSILON
	}

	/// Snaps the position to the centre of the nearest mania column and the
	/// vertical centre of the playfield. Returns whether the position moved.
	pub fn resnap_position(&mut self, mode: GameMode, circle_size: f64) -> bool {
		if mode != GameMode::Mania {
			return false;
		}

		let columns = circle_size.round().max(1.0);
		let column_width = PLAYFIELD_WIDTH / columns;
		let column = (self.pos.x / column_width).floor().clamp(0.0, columns - 1.0);
		let new_pos = Point::new(column * column_width + column_width / 2.0, PLAYFIELD_CENTRE_Y);

		let moved = self.pos.distance_squared(new_pos) > DOUBLE_EPSILON * DOUBLE_EPSILON;
		self.pos = new_pos;

		moved
	}

	/// Rebuilds the per-edge timeline: one sub-event per traversed edge,
	/// carrying that edge's hitsounds, the last one clamped to the end time.
	pub fn update_timeline_objects(&mut self) {
		self.timeline_objects = (0..=self.repeat)
			.map(|edge_index| TimelineObject {
				time: if edge_index == self.repeat {
					self.end_time()
				} else {
					self.time + f64::from(edge_index) * self.temporal_length
				},
				edge_index,
				hitsounds: self
					.edge_hitsounds
					.get(edge_index as usize)
					.copied()
					.unwrap_or(self.hitsounds),
			})
			.collect();
	}

	/// Clones the timing points active strictly inside the body.
	pub fn collect_body_hitsounds(&mut self, timing: &Timing) {
		let range = (Bound::Excluded(self.time), Bound::Excluded(self.end_time()));
		self.body_hitsounds = timing.timing_points.between(range).to_vec();
	}
}

/// An informational section kept as ordered raw key/value pairs so that
/// write-back preserves keys this library does not interpret.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyValueSection {
	pub entries: Vec<(String, String)>,
}

impl KeyValueSection {
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, value)| value.as_str())
	}

	#[must_use]
	pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
		self.get(key).and_then(|value| value.parse().ok())
	}
}

/// Difficulty settings
#[derive(Clone, Debug, PartialEq)]
pub struct DifficultySection {
	/// HP setting (0–10)
	pub hp_drain_rate: f64,
	/// CS setting (0–10); doubles as the column count in osu!mania.
	pub circle_size: f64,
	/// OD setting (0–10)
	pub overall_difficulty: f64,
	/// AR setting (0–10)
	pub approach_rate: f64,
	/// Base slider velocity in hundreds of osu! pixels per beat
	pub slider_multiplier: f64,
	/// Amount of slider ticks per beat
	pub slider_tick_rate: f64,
}

impl Default for DifficultySection {
	fn default() -> Self {
		Self {
			hp_drain_rate: 5.0,
			circle_size: 5.0,
			overall_difficulty: 5.0,
			approach_rate: 5.0,
			slider_multiplier: 1.4,
			slider_tick_rate: 1.0,
		}
	}
}

/// Combo and skin colours
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColoursSection {
	/// Additive combo colours, in declaration order.
	pub combo_colours: Vec<ComboColour>,
	/// Named colours (slider track override, slider border…).
	pub special_colours: Vec<SpecialColour>,
}

/// An `.osu` beatmap, read from a text blob and written back section by
/// section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatmapFile {
	/// The version from the `osu file format v<version>` header line.
	pub format_version: u32,
	pub general: KeyValueSection,
	pub editor: KeyValueSection,
	pub metadata: KeyValueSection,
	pub difficulty: DifficultySection,
	pub events: Vec<Event>,
	pub timing_points: Vec<TimingPoint>,
	pub colours: ColoursSection,
	pub hit_objects: Vec<HitObject>,
}

impl BeatmapFile {
	/// Parses a beatmap from the raw text of an `.osu` file.
	///
	/// # Errors
	///
	/// Returns an error when the header is missing or any section line fails
	/// to decode; the error carries the offending line.
	pub fn parse_str(blob: &str) -> Result<Self, BeatmapParseError> {
		parse_beatmap_file(blob)
	}

	/// Writes the beatmap back in `.osu` format.
	///
	/// # Errors
	///
	/// Returns an error when the underlying writer fails.
	pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		write_beatmap_file(self, writer)
	}

	/// The beatmap rendered as an `.osu` text blob.
	#[must_use]
	pub fn to_osu_string(&self) -> String {
		let mut buf = Vec::new();
		// Writing into a Vec cannot fail.
		let _ = self.serialize(&mut buf);
		String::from_utf8_lossy(&buf).into_owned()
	}

	#[must_use]
	pub fn mode(&self) -> GameMode {
		GameMode::from_wire(self.general.get_parsed::<u8>("Mode").unwrap_or(0))
	}

	/// Builds the timing model governing this map.
	#[must_use]
	pub fn timing(&self) -> Timing {
		Timing::new(self.timing_points.clone(), self.difficulty.slider_multiplier)
	}
}
