use log::warn;
use serde::Serialize;

/// Note classification tags as they appear in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteType {
    Tap,
    Slide,
    Hold,
    Touch,
    TouchHold,
}

/// A single expanded note. One chunk of fumen content can expand into
/// several of these (simultaneous notes, slide chains).
#[derive(Debug, Clone)]
pub struct SimaiNote {
    pub note_type: NoteType,
    pub start_position: i32,
    pub touch_area: char,
    pub hold_time: f64,
    pub slide_start_time: f64,
    pub slide_time: f64,
    pub is_break: bool,
    pub is_ex: bool,
    pub is_hanabi: bool,
    pub is_slide_break: bool,
    pub is_slide_no_head: bool,
    pub is_force_star: bool,
    pub is_fake_rotate: bool,
    pub note_content: String,
}

impl Default for SimaiNote {
    fn default() -> Self {
        Self {
            note_type: NoteType::Tap,
            start_position: 0,
            touch_area: ' ',
            hold_time: 0.0,
            slide_start_time: 0.0,
            slide_time: 0.0,
            is_break: false,
            is_ex: false,
            is_hanabi: false,
            is_slide_break: false,
            is_slide_no_head: false,
            is_force_star: false,
            is_fake_rotate: false,
            note_content: String::new(),
        }
    }
}

impl SimaiNote {
    fn new(note_type: NoteType, content: &str) -> Self {
        Self {
            note_type,
            note_content: content.to_string(),
            ..Self::default()
        }
    }
}

/// Characters that turn a button note into a slide shape.
const SLIDE_MARKS: &[char] = &['-', '^', 'v', 'V', '<', '>', 'p', 'q', 's', 'z', 'w'];

/// Expand one chunk of fumen content into its simultaneous notes.
///
/// `time` is the chunk's timestamp and `bpm` the tempo in effect there;
/// both feed slide wait and duration computation. Unparseable pieces are
/// logged and dropped rather than failing the chunk.
pub fn expand_group(content: &str, time: f64, bpm: f64) -> Vec<SimaiNote> {
    // Pseudo-each shorthand: two bare digits ("15") tap both positions.
    if content.len() == 2 && content.bytes().all(|b| b.is_ascii_digit()) {
        return content
            .chars()
            .filter_map(|c| parse_single(&c.to_string(), time, bpm))
            .collect();
    }

    let mut notes = Vec::new();
    for part in content.split('/') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if part.contains('*') {
            expand_slide_chain(part, time, bpm, &mut notes);
        } else if let Some(note) = parse_single(part, time, bpm) {
            notes.push(note);
        }
    }
    notes
}

/// `1-4[4:1]*-5[4:1]`: several slide shapes leaving one shared head. The
/// chained shapes reuse the head position and render without a head of
/// their own.
fn expand_slide_chain(part: &str, time: f64, bpm: f64, notes: &mut Vec<SimaiNote>) {
    let mut pieces = part.split('*');
    let first = pieces.next().unwrap_or(part);
    let Some(head) = parse_single(first, time, bpm) else {
        return;
    };
    let head_position = head.start_position;
    notes.push(head);
    for piece in pieces {
        if piece.is_empty() {
            continue;
        }
        let chained = format!("{head_position}{piece}");
        if let Some(mut note) = parse_single(&chained, time, bpm) {
            note.is_slide_no_head = true;
            note.note_content = piece.to_string();
            notes.push(note);
        }
    }
}

fn parse_single(content: &str, time: f64, bpm: f64) -> Option<SimaiNote> {
    let first = content.chars().next()?;
    if ('A'..='E').contains(&first) {
        parse_touch(content, bpm)
    } else if content.chars().skip(1).any(|c| SLIDE_MARKS.contains(&c)) {
        parse_slide(content, time, bpm)
    } else if content.contains('h') {
        parse_hold(content, bpm)
    } else {
        parse_tap(content)
    }
}

fn parse_tap(content: &str) -> Option<SimaiNote> {
    let mut note = SimaiNote::new(NoteType::Tap, content);
    note.start_position = leading_position(content)?;
    note.is_break = content.contains('b');
    note.is_ex = content.contains('x');
    // `$` renders the tap as a star; `$$` additionally spins it.
    let stars = content.matches('$').count();
    note.is_force_star = stars >= 1;
    note.is_fake_rotate = stars >= 2;
    Some(note)
}

fn parse_hold(content: &str, bpm: f64) -> Option<SimaiNote> {
    let mut note = SimaiNote::new(NoteType::Hold, content);
    note.start_position = leading_position(content)?;
    note.is_break = content.contains('b');
    note.is_ex = content.contains('x');
    // A hold without a duration bracket is press-and-release.
    if let Some(spec) = bracket_spec(content) {
        note.hold_time = parse_duration(spec, bpm)?.length;
    }
    Some(note)
}

fn parse_touch(content: &str, bpm: f64) -> Option<SimaiNote> {
    let is_hold = content.contains('h');
    let kind = if is_hold { NoteType::TouchHold } else { NoteType::Touch };
    let mut note = SimaiNote::new(kind, content);
    note.touch_area = content.chars().next()?;
    // Center ("C") carries no sensor digit and lands on position 8.
    note.start_position = content
        .chars()
        .find(char::is_ascii_digit)
        .map(|c| c as i32 - '0' as i32)
        .unwrap_or(8);
    note.is_hanabi = content.contains('f');
    if is_hold && let Some(spec) = bracket_spec(content) {
        note.hold_time = parse_duration(spec, bpm)?.length;
    }
    Some(note)
}

fn parse_slide(content: &str, time: f64, bpm: f64) -> Option<SimaiNote> {
    let mut note = SimaiNote::new(NoteType::Slide, content);
    note.start_position = leading_position(content)?;

    let mark = content.find(SLIDE_MARKS)?;
    let head = &content[..mark];
    note.is_break = head.contains('b');
    note.is_ex = head.contains('x');
    note.is_force_star = head.contains('$');
    note.is_slide_no_head = head.contains('?') || head.contains('!');

    // The star waits one beat before the body starts unless the duration
    // bracket overrides it.
    let mut wait = if bpm > 0.0 { 60.0 / bpm } else { 0.0 };
    match bracket_spec(content) {
        Some(spec) => {
            let duration = parse_duration(spec, bpm)?;
            if let Some(w) = duration.wait {
                wait = w;
            }
            note.slide_time = duration.length;
        }
        None => warn!("slide '{content}' has no duration bracket"),
    }
    note.slide_start_time = time + wait;

    // A `b` after the closing bracket breaks the slide body, not the head.
    if let Some(close) = content.rfind(']')
        && content[close..].contains('b')
    {
        note.is_slide_break = true;
    }
    Some(note)
}

/// Button position from the first digit in the content.
fn leading_position(content: &str) -> Option<i32> {
    match content.chars().find(char::is_ascii_digit) {
        Some(digit) => Some(digit as i32 - '0' as i32),
        None => {
            warn!("note '{content}' has no button position, skipping");
            None
        }
    }
}

/// The `[...]` suffix of a note, if present.
fn bracket_spec(content: &str) -> Option<&str> {
    let open = content.find('[')?;
    let close = content[open..].find(']')? + open;
    Some(&content[open + 1..close])
}

struct DurationSpec {
    /// Star wait override in seconds, for bracket forms that carry one.
    wait: Option<f64>,
    /// Hold or slide body length in seconds.
    length: f64,
}

/// Duration brackets: `X:Y` (Y notes of an X-division at the current BPM),
/// `bpm#X:Y` (the same at an overridden tempo, which also rescales the star
/// wait), `#d` (absolute seconds), `w##d` (wait and length in seconds).
fn parse_duration(spec: &str, bpm: f64) -> Option<DurationSpec> {
    if let Some((wait, length)) = spec.split_once("##") {
        return Some(DurationSpec {
            wait: Some(parse_f64(wait, spec)?),
            length: parse_f64(length, spec)?,
        });
    }
    if let Some((tempo, rest)) = spec.split_once('#') {
        if tempo.is_empty() {
            return Some(DurationSpec {
                wait: None,
                length: parse_f64(rest, spec)?,
            });
        }
        let tempo = parse_f64(tempo, spec)?;
        if tempo <= 0.0 {
            warn!("non-positive tempo in duration '{spec}'");
            return None;
        }
        return Some(DurationSpec {
            wait: Some(60.0 / tempo),
            length: beat_length(rest, tempo, spec)?,
        });
    }
    Some(DurationSpec {
        wait: None,
        length: beat_length(spec, bpm, spec)?,
    })
}

/// `X:Y` measured against `bpm`.
fn beat_length(fraction: &str, bpm: f64, context: &str) -> Option<f64> {
    let Some((division, count)) = fraction.split_once(':') else {
        warn!("malformed duration '{context}'");
        return None;
    };
    let division = parse_f64(division, context)?;
    let count = parse_f64(count, context)?;
    if division <= 0.0 || bpm <= 0.0 {
        warn!("malformed duration '{context}'");
        return None;
    }
    Some(60.0 / bpm * 4.0 / division * count)
}

fn parse_f64(value: &str, context: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("unparseable number '{value}' in duration '{context}'");
            None
        }
    }
}
