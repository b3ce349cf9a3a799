use serde::Serialize;

use crate::note::{NoteType, SimaiNote};
use crate::simai::TimingPoint;

/// One element of the output document: a timestamp and every note on it.
#[derive(Debug, Serialize)]
pub struct NoteGroup {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Notes")]
    pub notes: Vec<NoteEntry>,
}

/// Flat note record with the exact key set of the output format. Field
/// order here is serialization order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntry {
    pub hold_time: f64,
    pub is_break: bool,
    pub is_ex: bool,
    pub is_fake_rotate: bool,
    pub is_force_star: bool,
    pub is_hanabi: bool,
    pub is_slide_break: bool,
    pub is_slide_no_head: bool,
    pub note_content: String,
    pub note_type: NoteType,
    pub slide_start_time: f64,
    pub slide_time: f64,
    pub start_position: i32,
    pub touch_area: char,
}

impl From<&SimaiNote> for NoteEntry {
    fn from(note: &SimaiNote) -> Self {
        Self {
            hold_time: note.hold_time,
            is_break: note.is_break,
            is_ex: note.is_ex,
            is_fake_rotate: note.is_fake_rotate,
            is_force_star: note.is_force_star,
            is_hanabi: note.is_hanabi,
            is_slide_break: note.is_slide_break,
            is_slide_no_head: note.is_slide_no_head,
            note_content: note.note_content.clone(),
            note_type: note.note_type,
            slide_start_time: note.slide_start_time,
            slide_time: note.slide_time,
            start_position: note.start_position,
            touch_area: note.touch_area,
        }
    }
}

/// Flatten serialized timing points into the output document shape,
/// preserving their order.
pub fn build_document(points: &[TimingPoint]) -> Vec<NoteGroup> {
    points
        .iter()
        .map(|point| NoteGroup {
            time: point.time,
            notes: point.notes.iter().map(NoteEntry::from).collect(),
        })
        .collect()
}

/// Pretty-print the document. Serialization is deterministic, so an
/// unchanged chart yields byte-identical output across runs.
pub fn serialize_document(groups: &[NoteGroup]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note;
    use crate::simai;

    fn document_for(fumen: &str) -> Vec<NoteGroup> {
        build_document(&simai::serialize_fumen(fumen, 0.0))
    }

    #[test]
    fn document_mirrors_timing_points() {
        let document = document_for("(120){4}1,2h[4:1]/3,");
        assert_eq!(document.len(), 2);
        assert_eq!(document[0].notes.len(), 1);
        assert_eq!(document[1].notes.len(), 2);
        assert!((document[1].time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn json_shape_matches_the_output_format() {
        let json = serialize_document(&document_for("(120){4}1,")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let group = &value[0];
        assert!((group["Time"].as_f64().unwrap() - 0.0).abs() < 1e-9);
        let entry = &group["Notes"][0];
        assert_eq!(entry["noteType"], "Tap");
        assert_eq!(entry["startPosition"], 1);
        assert_eq!(entry["noteContent"], "1");
        assert_eq!(entry["touchArea"], " ");
        assert_eq!(entry["isBreak"], false);
        assert_eq!(entry["holdTime"], 0.0);
        assert_eq!(entry.as_object().unwrap().len(), 14);
    }

    #[test]
    fn note_type_tags_serialize_as_strings() {
        let json = serialize_document(&document_for("(120){4}Ch[4:1],1-5[4:1],")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["Notes"][0]["noteType"], "TouchHold");
        assert_eq!(value[1]["Notes"][0]["noteType"], "Slide");
    }

    #[test]
    fn reruns_are_byte_identical() {
        let fumen = "(174){8}1,2,3b,4x,";
        let first = serialize_document(&document_for(fumen)).unwrap();
        let second = serialize_document(&document_for(fumen)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entry_conversion_copies_every_field() {
        let notes = note::expand_group("1-5[8:3]b", 2.0, 120.0);
        let entry = NoteEntry::from(&notes[0]);
        assert!(entry.is_slide_break);
        assert!((entry.slide_start_time - 2.5).abs() < 1e-9);
        assert!((entry.slide_time - 0.75).abs() < 1e-9);
        assert_eq!(entry.note_content, "1-5[8:3]b");
    }
}
