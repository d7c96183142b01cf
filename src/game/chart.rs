use crate::error::{ChartError, Result};
use crate::game::annotation::Annotation;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Highest panel index on a doubles pad.
pub const MAX_PANEL: u8 = 9;

/// Highest panel index on a singles pad.
pub const MAX_SINGLES_PANEL: u8 = 4;

/// Note times past this many seconds are rejected at load.
pub const MAX_CHART_TIME: f64 = 86_400.0;

/// Splits a payload row into its leading typed fields and whatever follows.
fn split_row<T: DeserializeOwned>(
    mut row: Vec<Value>,
    arity: usize,
    what: &str,
) -> std::result::Result<(T, Vec<Value>), String> {
    if row.len() < arity {
        return Err(format!("{what} needs {arity} fields, got {}", row.len()));
    }
    let extra = row.split_off(arity);
    let head = serde_json::from_value(Value::Array(row)).map_err(|e| format!("{what}: {e}"))?;
    Ok((head, extra))
}

#[inline(always)]
fn annotation_value(a: Annotation) -> Value {
    Value::String(a.as_str().to_owned())
}

/// `[panel, time, limb, ...]`; trailing elements ride along untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct ArrowArt {
    pub panel: u8,
    pub time: f64,
    pub limb: Annotation,
    pub extra: Vec<Value>,
}

impl TryFrom<Vec<Value>> for ArrowArt {
    type Error = String;

    fn try_from(row: Vec<Value>) -> std::result::Result<Self, String> {
        let ((panel, time, limb), extra) = split_row::<(u8, f64, Annotation)>(row, 3, "arrow")?;
        Ok(Self { panel, time, limb, extra })
    }
}

impl From<ArrowArt> for Vec<Value> {
    fn from(a: ArrowArt) -> Self {
        let mut row = vec![Value::from(a.panel), Value::from(a.time), annotation_value(a.limb)];
        row.extend(a.extra);
        row
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct HoldArt {
    pub panel: u8,
    pub start: f64,
    pub end: f64,
    pub limb: Annotation,
    pub extra: Vec<Value>,
}

impl TryFrom<Vec<Value>> for HoldArt {
    type Error = String;

    fn try_from(row: Vec<Value>) -> std::result::Result<Self, String> {
        let ((panel, start, end, limb), extra) =
            split_row::<(u8, f64, f64, Annotation)>(row, 4, "hold")?;
        Ok(Self { panel, start, end, limb, extra })
    }
}

impl From<HoldArt> for Vec<Value> {
    fn from(h: HoldArt) -> Self {
        let mut row = vec![
            Value::from(h.panel),
            Value::from(h.start),
            Value::from(h.end),
            annotation_value(h.limb),
        ];
        row.extend(h.extra);
        row
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct HoldTick {
    pub start: f64,
    pub end: f64,
    pub count: u32,
    pub extra: Vec<Value>,
}

impl TryFrom<Vec<Value>> for HoldTick {
    type Error = String;

    fn try_from(row: Vec<Value>) -> std::result::Result<Self, String> {
        let ((start, end, count), extra) = split_row::<(f64, f64, u32)>(row, 3, "hold tick")?;
        Ok(Self { start, end, count, extra })
    }
}

impl From<HoldTick> for Vec<Value> {
    fn from(t: HoldTick) -> Self {
        let mut row = vec![Value::from(t.start), Value::from(t.end), Value::from(t.count)];
        row.extend(t.extra);
        row
    }
}

/// `[start, end, ...]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub extra: Vec<Value>,
}

impl TryFrom<Vec<Value>> for Segment {
    type Error = String;

    fn try_from(row: Vec<Value>) -> std::result::Result<Self, String> {
        let ((start, end), extra) = split_row::<(f64, f64)>(row, 2, "segment")?;
        Ok(Self { start, end, extra })
    }
}

impl From<Segment> for Vec<Value> {
    fn from(s: Segment) -> Self {
        let mut row = vec![Value::from(s.start), Value::from(s.end)];
        row.extend(s.extra);
        row
    }
}

/// Removes the first accepted spelling of a key from `map` and decodes it.
/// Returns the spelling that was found alongside the value.
fn take_key<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    names: &'static [&'static str],
) -> serde_json::Result<Option<(T, &'static str)>> {
    for &name in names {
        if let Some(v) = map.remove(name) {
            return Ok(Some((serde_json::from_value(v)?, name)));
        }
    }
    Ok(None)
}

const SEGMENT_INFO_KEYS: [&[&str]; 3] = [
    &["level", "Level"],
    &["rare_skills", "rare skills", "Rare skills"],
    &["similar_sections", "Closest sections", "closest_sections"],
];

/// Per-segment annotations shipped alongside the segment boundaries.
///
/// Keys are written back with the spelling they arrived in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct SegmentInfo {
    pub level: f64,
    pub rare_skills: Vec<String>,
    pub similar_sections: Vec<usize>,
    pub extra: Map<String, Value>,
    key_names: [&'static str; 3],
}

impl Default for SegmentInfo {
    fn default() -> Self {
        Self {
            level: 0.0,
            rare_skills: Vec::new(),
            similar_sections: Vec::new(),
            extra: Map::new(),
            key_names: SEGMENT_INFO_KEYS.map(|names| names[0]),
        }
    }
}

impl TryFrom<Map<String, Value>> for SegmentInfo {
    type Error = serde_json::Error;

    fn try_from(mut map: Map<String, Value>) -> serde_json::Result<Self> {
        let mut info = Self::default();
        if let Some((v, name)) = take_key(&mut map, SEGMENT_INFO_KEYS[0])? {
            info.level = v;
            info.key_names[0] = name;
        }
        if let Some((v, name)) = take_key(&mut map, SEGMENT_INFO_KEYS[1])? {
            info.rare_skills = v;
            info.key_names[1] = name;
        }
        if let Some((v, name)) = take_key(&mut map, SEGMENT_INFO_KEYS[2])? {
            info.similar_sections = v;
            info.key_names[2] = name;
        }
        info.extra = map;
        Ok(info)
    }
}

impl From<SegmentInfo> for Map<String, Value> {
    fn from(info: SegmentInfo) -> Self {
        let [level, rare, similar] = info.key_names;
        let mut map = info.extra;
        map.insert(level.to_owned(), Value::from(info.level));
        map.insert(rare.to_owned(), Value::from(info.rare_skills));
        map.insert(similar.to_owned(), Value::from(info.similar_sections));
        map
    }
}

/// Accepted spellings per modeled metadata key. The first entry is the
/// snake_case name, the second the name chart producers write.
const METADATA_KEYS: [&[&str]; 8] = [
    &["level", "METER", "Level"],
    &["bpm", "BPM"],
    &["title", "TITLE", "Title"],
    &["segments", "Segments"],
    &["segment_metadata", "Segment metadata"],
    &["enps_timeline", "eNPS timeline data"],
    &["hold_ticks", "Hold ticks"],
    &["manually_annotated", "Manual limb annotation"],
];

#[derive(Clone, Debug, PartialEq)]
pub struct ChartMetadata {
    pub level: u32,
    pub bpm: f64,
    pub title: String,
    pub segments: Vec<Segment>,
    pub segment_metadata: Vec<SegmentInfo>,
    pub enps_timeline: Vec<f64>,
    pub hold_ticks: Vec<HoldTick>,
    pub manually_annotated: bool,
    /// Keys this schema does not model, re-emitted verbatim on export.
    pub extra: Map<String, Value>,
    /// Spelling written on export for each entry of `METADATA_KEYS`.
    key_names: [&'static str; 8],
}

impl ChartMetadata {
    fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let mut names: [Option<&'static str>; 8] = [None; 8];
        macro_rules! take {
            ($slot:expr) => {
                match take_key(&mut map, METADATA_KEYS[$slot])? {
                    Some((v, name)) => {
                        names[$slot] = Some(name);
                        Some(v)
                    }
                    None => None,
                }
            };
        }

        let level: u32 = take!(0).ok_or(ChartError::MissingField("level"))?;
        let bpm: f64 = take!(1).unwrap_or(0.0);
        let title: String = take!(2).unwrap_or_default();
        let segments: Vec<Segment> = take!(3).unwrap_or_default();
        let segment_metadata: Vec<SegmentInfo> = take!(4).unwrap_or_default();
        let enps_timeline: Vec<f64> = take!(5).unwrap_or_default();
        let hold_ticks: Vec<HoldTick> = take!(6).unwrap_or_default();
        let manually_annotated: bool = take!(7).unwrap_or(false);

        // Keys the payload left out follow the naming style of its level key.
        let style = usize::from(names[0] != Some(METADATA_KEYS[0][0]));
        let mut key_names = [""; 8];
        for (slot, name) in key_names.iter_mut().enumerate() {
            *name = names[slot].unwrap_or(METADATA_KEYS[slot][style]);
        }

        Ok(Self {
            level,
            bpm,
            title,
            segments,
            segment_metadata,
            enps_timeline,
            hold_ticks,
            manually_annotated,
            extra: map,
            key_names,
        })
    }

    /// Key spelling used on export for `field`, one of the snake_case names.
    pub fn key_name(&self, field: &str) -> Option<&'static str> {
        METADATA_KEYS
            .iter()
            .position(|names| names[0] == field)
            .map(|slot| self.key_names[slot])
    }
}

impl Serialize for ChartMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let k = &self.key_names;
        let mut map = serializer.serialize_map(Some(k.len() + self.extra.len()))?;
        map.serialize_entry(k[0], &self.level)?;
        map.serialize_entry(k[1], &self.bpm)?;
        map.serialize_entry(k[2], &self.title)?;
        map.serialize_entry(k[3], &self.segments)?;
        map.serialize_entry(k[4], &self.segment_metadata)?;
        map.serialize_entry(k[5], &self.enps_timeline)?;
        map.serialize_entry(k[6], &self.hold_ticks)?;
        map.serialize_entry(k[7], &self.manually_annotated)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawPayload(Vec<ArrowArt>, Vec<HoldArt>, Map<String, Value>);

#[derive(Serialize)]
struct PayloadRef<'a>(&'a [ArrowArt], &'a [HoldArt], &'a ChartMetadata);

/// One loaded chart. Cloning is cheap and yields the same snapshot; edits go
/// through the `with_*` methods which hand back a new value with exactly one
/// element replaced, leaving every earlier snapshot untouched.
#[derive(Clone, Debug)]
pub struct ChartData {
    pub arrowarts: Arc<[ArrowArt]>,
    pub holdarts: Arc<[HoldArt]>,
    pub metadata: Arc<ChartMetadata>,
    pub segments: Arc<[Segment]>,
    pub segment_data: Arc<[SegmentInfo]>,
    pub manually_annotated: bool,
}

#[inline(always)]
fn valid_time(t: f64) -> bool {
    t.is_finite() && t.abs() <= MAX_CHART_TIME
}

impl ChartData {
    pub fn from_json(payload: &str) -> Result<Self> {
        let raw: RawPayload = serde_json::from_str(payload)?;
        Self::from_raw(raw)
    }

    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let raw: RawPayload = serde_json::from_slice(payload)?;
        Self::from_raw(raw)
    }

    fn from_raw(RawPayload(mut arrows, mut holds, raw_meta): RawPayload) -> Result<Self> {
        let metadata = ChartMetadata::from_map(raw_meta)?;

        for (index, a) in arrows.iter().enumerate() {
            if a.panel > MAX_PANEL {
                return Err(ChartError::InvalidPanel { index, panel: a.panel });
            }
            if !valid_time(a.time) {
                return Err(ChartError::InvalidTime { index });
            }
        }
        for (index, h) in holds.iter().enumerate() {
            if h.panel > MAX_PANEL {
                return Err(ChartError::InvalidPanel { index, panel: h.panel });
            }
            if !valid_time(h.start) || !valid_time(h.end) {
                return Err(ChartError::InvalidTime { index });
            }
        }

        if !arrows.is_sorted_by(|a, b| a.time <= b.time) {
            warn!("Arrow list out of time order; re-sorting {} arrows.", arrows.len());
            arrows.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        if !holds.is_sorted_by(|a, b| a.start <= b.start) {
            warn!("Hold list out of time order; re-sorting {} holds.", holds.len());
            holds.sort_by(|a, b| a.start.total_cmp(&b.start));
        }

        let segments: Arc<[Segment]> = Arc::from(metadata.segments.as_slice());
        let mut segment_data = metadata.segment_metadata.clone();
        if segment_data.len() != segments.len() {
            warn!(
                "Chart has {} segments but {} segment metadata entries; padding with defaults.",
                segments.len(),
                segment_data.len()
            );
            segment_data.resize_with(segments.len(), SegmentInfo::default);
        }

        debug!(
            "Loaded chart: {} arrows, {} holds, level {}",
            arrows.len(),
            holds.len(),
            metadata.level
        );

        Ok(Self {
            arrowarts: Arc::from(arrows),
            holdarts: Arc::from(holds),
            manually_annotated: metadata.manually_annotated,
            metadata: Arc::new(metadata),
            segments,
            segment_data: Arc::from(segment_data),
        })
    }

    #[inline(always)]
    pub fn level(&self) -> u32 {
        self.metadata.level
    }

    #[inline(always)]
    pub fn hold_ticks(&self) -> &[HoldTick] {
        &self.metadata.hold_ticks
    }

    pub fn last_arrow_time(&self) -> f64 {
        self.arrowarts.last().map_or(0.0, |a| a.time)
    }

    /// Latest hold end. Holds are ordered by start, so every end is checked.
    pub fn last_hold_end(&self) -> f64 {
        self.holdarts.iter().map(|h| h.end).fold(0.0, f64::max)
    }

    /// Times of arrows that were already marked missed when the chart arrived.
    pub fn seeded_miss_times(&self) -> Vec<f64> {
        self.arrowarts
            .iter()
            .filter(|a| a.limb.is_miss())
            .map(|a| a.time)
            .collect()
    }

    pub fn with_arrow_annotation(&self, index: usize, limb: Annotation) -> Option<Self> {
        let current = self.arrowarts.get(index)?;
        let mut arrows = self.arrowarts.to_vec();
        arrows[index] = ArrowArt {
            limb,
            ..current.clone()
        };
        Some(Self {
            arrowarts: Arc::from(arrows),
            manually_annotated: true,
            ..self.clone()
        })
    }

    pub fn with_hold_annotation(&self, index: usize, limb: Annotation) -> Option<Self> {
        let current = self.holdarts.get(index)?;
        let mut holds = self.holdarts.to_vec();
        holds[index] = HoldArt {
            limb,
            ..current.clone()
        };
        Some(Self {
            holdarts: Arc::from(holds),
            manually_annotated: true,
            ..self.clone()
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        let mut metadata = (*self.metadata).clone();
        metadata.manually_annotated = self.manually_annotated;
        let out = serde_json::to_string_pretty(&PayloadRef(
            &self.arrowarts,
            &self.holdarts,
            &metadata,
        ))?;
        Ok(out)
    }
}
