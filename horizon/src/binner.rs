//! Reduction of directional observations to one obstruction angle
//! per azimuth bucket.

use crate::{HorizonError, Observation};

/// One azimuth bucket of a horizon profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonEntry {
    pub azimuth_deg: f64,

    pub elevation_angle_deg: f64,

    /// The highest obstruction in this bucket, or `None` when the
    /// bucket was empty and this entry is a floor placeholder.
    pub source: Option<Observation>,
}

impl HorizonEntry {
    fn obstructed(observation: Observation) -> Self {
        Self {
            azimuth_deg: observation.azimuth_deg,
            elevation_angle_deg: observation.elevation_angle_deg,
            source: Some(observation),
        }
    }

    fn floor(azimuth_deg: f64, min_elevation_angle_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_angle_deg: min_elevation_angle_deg,
            source: None,
        }
    }
}

/// Returns the number of buckets of `bucket_width_deg` whose start
/// lies in `[0, 360)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bucket_count(bucket_width_deg: f64) -> usize {
    let mut count = (360.0 / bucket_width_deg).ceil() as usize;
    while count > 0 && bucket_start(count - 1, bucket_width_deg) >= 360.0 {
        count -= 1;
    }
    while bucket_start(count, bucket_width_deg) < 360.0 {
        count += 1;
    }
    count
}

/// Reduces `observations` to a gap-free horizon profile.
///
/// Bucket `k` covers `[k * width, (k + 1) * width]`, inclusive at
/// both ends, so an observation lying exactly on a boundary competes
/// in both neighbouring buckets. Each bucket keeps its highest
/// observation; on ties the one seen first in `observations` wins.
/// Empty buckets get a floor entry at the bucket center with
/// `min_elevation_angle_deg`.
///
/// The result holds exactly [bucket_count] entries, ascending by azimuth.
/// When `bucket_width_deg` does not divide 360, the last bucket and its
/// floor azimuth extend past 360°.
pub fn bin(
    observations: &[Observation],
    min_elevation_angle_deg: f64,
    bucket_width_deg: f64,
) -> Result<Vec<HorizonEntry>, HorizonError> {
    if !(bucket_width_deg.is_finite() && bucket_width_deg > 0.0 && bucket_width_deg <= 360.0) {
        return Err(HorizonError::InvalidParameter {
            name: "bucket width",
            value: bucket_width_deg,
        });
    }
    if !min_elevation_angle_deg.is_finite() {
        return Err(HorizonError::InvalidParameter {
            name: "minimum elevation angle",
            value: min_elevation_angle_deg,
        });
    }

    let count = bucket_count(bucket_width_deg);
    let mut best: Vec<Option<&Observation>> = vec![None; count];

    for observation in observations {
        for idx in candidate_buckets(observation.azimuth_deg, bucket_width_deg, count) {
            let higher = best[idx].map_or(true, |current| {
                observation.elevation_angle_deg > current.elevation_angle_deg
            });
            if higher {
                best[idx] = Some(observation);
            }
        }
    }

    let mut entries: Vec<HorizonEntry> = best
        .into_iter()
        .enumerate()
        .map(|(idx, observation)| match observation {
            Some(observation) => HorizonEntry::obstructed(*observation),
            None => HorizonEntry::floor(
                bucket_start(idx, bucket_width_deg) + bucket_width_deg / 2.0,
                min_elevation_angle_deg,
            ),
        })
        .collect();

    entries.sort_by(|a, b| a.azimuth_deg.total_cmp(&b.azimuth_deg));
    Ok(entries)
}

#[allow(clippy::cast_precision_loss)]
fn bucket_start(idx: usize, bucket_width_deg: f64) -> f64 {
    idx as f64 * bucket_width_deg
}

/// Returns the indices of every bucket whose closed interval contains
/// `azimuth_deg`.
///
/// Only the bucket found by division and its two neighbours can
/// qualify; each is checked with the same closed-interval test a full
/// scan would use.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn candidate_buckets(
    azimuth_deg: f64,
    bucket_width_deg: f64,
    count: usize,
) -> impl Iterator<Item = usize> {
    let nearest = (azimuth_deg / bucket_width_deg).floor().max(0.0) as usize;
    (nearest.saturating_sub(1)..=nearest.saturating_add(1))
        .filter(move |&idx| idx < count)
        .filter(move |&idx| {
            let start = bucket_start(idx, bucket_width_deg);
            start <= azimuth_deg && azimuth_deg <= start + bucket_width_deg
        })
}
