//! Keyframes: timestamped snapshots of crop position and playback state.

use serde::{Deserialize, Serialize};

use crate::geometry::CropRect;

/// Playback parameters read from the media service at sampling time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Media time in seconds.
    pub current_time: f64,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f64,
    /// Playback rate multiplier.
    pub playback_speed: f64,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            volume: 1.0,
            playback_speed: 1.0,
        }
    }
}

/// One recorded sample of the crop trajectory.
///
/// Serialized field names are part of the export format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Media time in seconds when the sample was taken.
    pub time_stamp: f64,
    /// `[left, top, width, height]` in displayed pixels.
    pub coordinates: [f64; 4],
    pub volume: f64,
    pub playback_speed: f64,
}

impl Keyframe {
    /// Combine a crop rectangle with a playback snapshot.
    pub fn capture(rect: &CropRect, playback: &PlaybackSnapshot) -> Self {
        Self {
            time_stamp: playback.current_time,
            coordinates: rect.coordinates(),
            volume: playback.volume,
            playback_speed: playback.playback_speed,
        }
    }

    /// The recorded rectangle.
    pub fn rect(&self) -> CropRect {
        let [left, top, width, height] = self.coordinates;
        CropRect::new(left, top, width, height)
    }
}

/// Append-only, order-preserving sequence of keyframes for one session.
///
/// Insertion order is recording order. Time stamps are normally
/// non-decreasing but a backwards seek is recorded as it happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyframe at the end of the track.
    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    /// Drop every keyframe. Only a new session does this.
    pub fn clear(&mut self) {
        self.keyframes.clear();
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyframe> {
        self.keyframes.iter()
    }

    /// Media time covered from the first to the last keyframe.
    pub fn span_secs(&self) -> f64 {
        match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (last.time_stamp - first.time_stamp).max(0.0),
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a KeyframeTrack {
    type Item = &'a Keyframe;
    type IntoIter = std::slice::Iter<'a, Keyframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.keyframes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframe_field_names() {
        let keyframe = Keyframe::capture(
            &CropRect::new(12.0, 0.0, 202.5, 360.0),
            &PlaybackSnapshot {
                current_time: 1.25,
                volume: 0.5,
                playback_speed: 2.0,
            },
        );
        let value = serde_json::to_value(keyframe).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "timeStamp": 1.25,
                "coordinates": [12.0, 0.0, 202.5, 360.0],
                "volume": 0.5,
                "playbackSpeed": 2.0
            })
        );
        assert_eq!(keyframe.rect(), CropRect::new(12.0, 0.0, 202.5, 360.0));
    }

    #[test]
    fn test_track_serializes_as_plain_array() {
        let mut track = KeyframeTrack::new();
        assert_eq!(serde_json::to_string(&track).unwrap(), "[]");

        track.push(Keyframe::capture(&CropRect::ZERO, &PlaybackSnapshot::default()));
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.starts_with("[{\"timeStamp\":0.0"));
    }

    #[test]
    fn test_track_keeps_insertion_order() {
        let mut track = KeyframeTrack::new();
        for t in [3.0, 1.0, 2.0] {
            track.push(Keyframe::capture(
                &CropRect::ZERO,
                &PlaybackSnapshot {
                    current_time: t,
                    ..PlaybackSnapshot::default()
                },
            ));
        }
        let times: Vec<f64> = track.iter().map(|k| k.time_stamp).collect();
        assert_eq!(times, vec![3.0, 1.0, 2.0]);
        assert_eq!(track.len(), 3);

        track.clear();
        assert!(track.is_empty());
        assert_eq!(track.span_secs(), 0.0);
    }
}
