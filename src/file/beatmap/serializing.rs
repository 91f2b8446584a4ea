use std::io::{self, Write};

use super::parsing::{SECTION_COLOURS, SECTION_EDITOR, SECTION_EVENTS, SECTION_GENERAL, SECTION_HIT_OBJECTS,
	SECTION_METADATA, SECTION_TIMING_POINTS};
use super::{
	BeatmapFile, ColoursSection, DifficultySection, Event, EventKind, HitObject, HitSound, KeyValueSection,
	TimingPoint,
};

/// Rounded-integer formatting used for positions, times, end times and pixel
/// lengths. `format!` is locale-invariant by construction.
fn fmt_round(value: f64) -> String {
	format!("{}", value.round() as i64)
}

fn curve_data_string(hit_object: &HitObject) -> String {
	let mut curve = hit_object.path_type.letter().to_string();

	for anchor in &hit_object.curve_points {
		curve.push_str(&format!("|{}:{}", fmt_round(anchor.x), fmt_round(anchor.y)));
	}

	curve
}

/// Encode a hit object back into its line form.
///
/// Sliders only carry the edge-hitsound/sample-set/extras tail when any of it
/// is non-default, so an already-compact line stays compact; every other kind
/// always spells its extras out.
#[must_use]
pub fn hit_object_line(hit_object: &HitObject) -> String {
	let mut line = format!(
		"{},{},{},{},{}",
		fmt_round(hit_object.pos.x),
		fmt_round(hit_object.pos.y),
		fmt_round(hit_object.time),
		hit_object.get_object_type(),
		hit_object.hitsounds,
	);

	if hit_object.is_slider {
		line.push(',');
		line.push_str(&curve_data_string(hit_object));
		line.push_str(&format!(",{},{}", hit_object.repeat, fmt_round(hit_object.pixel_length)));

		if hit_object.has_non_default_slider_extras() {
			// Decode always sizes these to repeat + 1; anything else is
			// invalid internal state, not a malformed file.
			debug_assert_eq!(hit_object.edge_hitsounds.len(), hit_object.repeat as usize + 1);
			debug_assert_eq!(hit_object.edge_sample_sets.len(), hit_object.edge_hitsounds.len());
			debug_assert_eq!(hit_object.edge_addition_sets.len(), hit_object.edge_hitsounds.len());

			let edge_hitsounds: Vec<_> = hit_object.edge_hitsounds.iter().map(HitSound::to_string).collect();
			let edge_sets: Vec<_> = (hit_object.edge_sample_sets.iter())
				.zip(&hit_object.edge_addition_sets)
				.map(|(normal, addition)| format!("{}:{}", *normal as u8, *addition as u8))
				.collect();

			line.push_str(&format!(
				",{},{},{}",
				edge_hitsounds.join("|"),
				edge_sets.join("|"),
				hit_object.hit_sample.to_osu_string(),
			));
		}
	} else if hit_object.is_spinner {
		line.push_str(&format!(
			",{},{}",
			fmt_round(hit_object.end_time()),
			hit_object.hit_sample.to_osu_string(),
		));
	} else if hit_object.is_hold_note {
		line.push_str(&format!(
			",{}:{}",
			fmt_round(hit_object.end_time()),
			hit_object.hit_sample.to_osu_string(),
		));
	} else {
		line.push_str(&format!(",{}", hit_object.hit_sample.to_osu_string()));
	}

	line
}

/// Encode an events-section line, nesting indent re-emitted as spaces.
#[must_use]
pub fn event_line(event: &Event) -> String {
	let indent = " ".repeat(event.indent);

	match &event.kind {
		EventKind::StandardLoop { start_time, loop_count } => format!("{indent}L,{start_time},{loop_count}"),
		EventKind::TriggerLoop {
			trigger,
			start_time,
			end_time,
		} => format!("{indent}T,{trigger},{start_time},{end_time}"),
		EventKind::Command { identifier, params } => {
			if params.is_empty() {
				format!("{indent}{identifier}")
			} else {
				format!("{indent}{identifier},{}", params.join(","))
			}
		}
		EventKind::Raw(line) => line.clone(),
	}
}

#[must_use]
pub fn timing_point_line(timing_point: &TimingPoint) -> String {
	let TimingPoint {
		time,
		beat_length,
		meter,
		sample_set,
		sample_index,
		volume,
		uninherited,
		effects,
	} = timing_point;

	format!(
		"{time},{beat_length},{meter},{},{sample_index},{volume},{},{effects}",
		*sample_set as u8,
		u8::from(*uninherited),
	)
}

fn write_key_value_section<W: Write>(header: &str, section: &KeyValueSection, writer: &mut W) -> io::Result<()> {
	if section.entries.is_empty() {
		return Ok(());
	}

	writeln!(writer, "{header}\r")?;
	for (key, value) in &section.entries {
		writeln!(writer, "{key}: {value}\r")?;
	}
	writeln!(writer, "\r")
}

fn write_difficulty_section<W: Write>(section: &DifficultySection, writer: &mut W) -> io::Result<()> {
	writeln!(writer, "[Difficulty]\r")?;
	writeln!(writer, "HPDrainRate: {}\r", section.hp_drain_rate)?;
	writeln!(writer, "CircleSize: {}\r", section.circle_size)?;
	writeln!(writer, "OverallDifficulty: {}\r", section.overall_difficulty)?;
	writeln!(writer, "ApproachRate: {}\r", section.approach_rate)?;
	writeln!(writer, "SliderMultiplier: {}\r", section.slider_multiplier)?;
	writeln!(writer, "SliderTickRate: {}\r", section.slider_tick_rate)?;
	writeln!(writer, "\r")
}

fn write_colours_section<W: Write>(section: &ColoursSection, writer: &mut W) -> io::Result<()> {
	if section.combo_colours.is_empty() && section.special_colours.is_empty() {
		return Ok(());
	}

	writeln!(writer, "{SECTION_COLOURS}\r")?;
	for (i, combo_colour) in section.combo_colours.iter().enumerate() {
		writeln!(writer, "Combo{}: {}\r", i + 1, combo_colour.to_osu_string())?;
	}
	for special_colour in &section.special_colours {
		writeln!(writer, "{}: {}\r", special_colour.name, special_colour.colour.to_osu_string())?;
	}
	writeln!(writer, "\r")
}

/// Write a beatmap back as `.osu` text.
pub(crate) fn write_beatmap_file<W: Write>(beatmap: &BeatmapFile, writer: &mut W) -> io::Result<()> {
	write!(writer, "osu file format v{}\r\n\r\n", beatmap.format_version)?;

	write_key_value_section(SECTION_GENERAL, &beatmap.general, writer)?;
	write_key_value_section(SECTION_EDITOR, &beatmap.editor, writer)?;
	write_key_value_section(SECTION_METADATA, &beatmap.metadata, writer)?;
	write_difficulty_section(&beatmap.difficulty, writer)?;

	if !beatmap.events.is_empty() {
		writeln!(writer, "{SECTION_EVENTS}\r")?;
		for event in &beatmap.events {
			writeln!(writer, "{}\r", event_line(event))?;
		}
		writeln!(writer, "\r")?;
	}

	if !beatmap.timing_points.is_empty() {
		writeln!(writer, "{SECTION_TIMING_POINTS}\r")?;
		for timing_point in &beatmap.timing_points {
			writeln!(writer, "{}\r", timing_point_line(timing_point))?;
		}
		writeln!(writer, "\r")?;
	}

	write_colours_section(&beatmap.colours, writer)?;

	if !beatmap.hit_objects.is_empty() {
		writeln!(writer, "{SECTION_HIT_OBJECTS}\r")?;
		for hit_object in &beatmap.hit_objects {
			writeln!(writer, "{}\r", hit_object_line(hit_object))?;
		}
	}

	Ok(())
}
