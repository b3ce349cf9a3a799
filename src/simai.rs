use std::iter::Peekable;
use std::str::Chars;

use log::{debug, warn};

use crate::note::{self, SimaiNote};

/// One committed chunk of fumen text: a timestamp and every note on it.
#[derive(Debug, Clone)]
pub struct TimingPoint {
    pub time: f64,
    pub bpm: f64,
    pub raw_content: String,
    pub notes: Vec<SimaiNote>,
}

/// How far one beat separator advances the clock.
enum BeatStep {
    /// `{n}`: a measure split into n parts at the current BPM.
    Division(f64),
    /// `{#s}`: a fixed number of seconds.
    Absolute(f64),
}

/// Walk one difficulty's raw fumen text into time-ordered note groups.
///
/// `first_offset` is the chart's audio offset; the clock starts there.
/// The walk never fails: unrecognized fragments are logged and skipped,
/// and the output order is exactly commit order.
pub fn serialize_fumen(fumen: &str, first_offset: f64) -> Vec<TimingPoint> {
    let mut points: Vec<TimingPoint> = Vec::new();
    let mut chars = fumen.chars().peekable();
    let mut bpm = 0.0_f64;
    let mut step = BeatStep::Division(4.0);
    let mut time = first_offset;
    let mut content = String::new();
    let mut missing_bpm_warned = false;

    while let Some(ch) = chars.next() {
        match ch {
            '(' => {
                let spec = take_until(&mut chars, ')');
                match spec.trim().parse::<f64>() {
                    Ok(value) if value > 0.0 => bpm = value,
                    _ => warn!("ignoring malformed BPM mark '({spec})'"),
                }
            }
            '{' => {
                let spec = take_until(&mut chars, '}');
                let spec = spec.trim();
                if let Some(seconds) = spec.strip_prefix('#') {
                    match seconds.parse::<f64>() {
                        Ok(value) if value > 0.0 => step = BeatStep::Absolute(value),
                        _ => warn!("ignoring malformed divisor mark '{{{spec}}}'"),
                    }
                } else {
                    match spec.parse::<f64>() {
                        Ok(value) if value > 0.0 => step = BeatStep::Division(value),
                        _ => warn!("ignoring malformed divisor mark '{{{spec}}}'"),
                    }
                }
            }
            // Display-speed marks (`<HS*2>`) only affect the editor's
            // rendering; a `<` not opening one is a slide shape.
            '<' if chars.peek() == Some(&'H') => {
                take_until(&mut chars, '>');
            }
            '|' => {
                if chars.peek() == Some(&'|') {
                    take_until(&mut chars, '\n');
                } else {
                    warn!("stray '|' in fumen text");
                }
            }
            ',' => {
                commit(&mut points, &mut content, time, bpm);
                match step {
                    BeatStep::Division(divisor) if bpm > 0.0 => {
                        time += 60.0 / bpm * 4.0 / divisor;
                    }
                    BeatStep::Absolute(seconds) => time += seconds,
                    BeatStep::Division(_) => {
                        if !missing_bpm_warned {
                            warn!("beat separator before any BPM mark; time will not advance");
                            missing_bpm_warned = true;
                        }
                    }
                }
            }
            // Pseudo-simultaneous separator: commit and nudge the clock.
            '`' => {
                commit(&mut points, &mut content, time, bpm);
                if bpm > 0.0 {
                    time += 1.875 / bpm;
                }
            }
            c if c.is_whitespace() => {}
            c => content.push(c),
        }
    }
    commit(&mut points, &mut content, time, bpm);
    points
}

fn commit(points: &mut Vec<TimingPoint>, content: &mut String, time: f64, bpm: f64) {
    if content.is_empty() {
        return;
    }
    let raw = std::mem::take(content);
    if raw == "E" {
        debug!("end mark at {time:.3}s");
        return;
    }
    let notes = note::expand_group(&raw, time, bpm);
    if notes.is_empty() {
        warn!("no notes parsed from '{raw}' at {time:.3}s");
    }
    points.push(TimingPoint {
        time,
        bpm,
        raw_content: raw,
        notes,
    });
}

fn take_until(chars: &mut Peekable<Chars<'_>>, terminator: char) -> String {
    let mut out = String::new();
    for ch in chars {
        if ch == terminator {
            break;
        }
        out.push(ch);
    }
    out
}
