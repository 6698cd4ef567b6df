use serde::{Deserialize, Serialize};

use crate::error::MalformedDatasetError;

/// Values per record in the raw coordinate buffer: two 3-D points.
pub const RECORD_STRIDE: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn from_slice(values: &[f64]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

/// Classification codes of both critical points, passed through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriticalType {
    pub lower: i32,
    pub upper: i32,
}

/// One critical-point pair of a persistence diagram.
///
/// `persistence` is derived from the y-values when the tuple is built and the
/// fields are private so the two can never drift apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PersistencePointTuple {
    lower: Vec3,
    upper: Vec3,
    display_lower: Vec3,
    display_upper: Vec3,
    critical_type: CriticalType,
    persistence: f64,
}

impl PersistencePointTuple {
    pub fn new(lower: Vec3, upper: Vec3, critical_type: CriticalType) -> Self {
        Self::with_display(lower, upper, lower, upper, critical_type)
    }

    pub fn with_display(
        lower: Vec3,
        upper: Vec3,
        display_lower: Vec3,
        display_upper: Vec3,
        critical_type: CriticalType,
    ) -> Self {
        Self {
            lower,
            upper,
            display_lower,
            display_upper,
            critical_type,
            persistence: upper.y - lower.y,
        }
    }

    pub fn lower(&self) -> Vec3 {
        self.lower
    }

    pub fn upper(&self) -> Vec3 {
        self.upper
    }

    /// Display coordinates of the lower point; equal to `lower` unless the
    /// loader supplied separate ones.
    pub fn display_lower(&self) -> Vec3 {
        self.display_lower
    }

    pub fn display_upper(&self) -> Vec3 {
        self.display_upper
    }

    pub fn critical_type(&self) -> CriticalType {
        self.critical_type
    }

    pub fn persistence(&self) -> f64 {
        self.persistence
    }
}

/// Closed interval `[min, max]`.
///
/// Equality is exact on all three fields; two bounds that differ in the last
/// bit are different filters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub width: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            width: max - min,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Orders the two ends so that `min <= max`.
    pub fn spanning(a: f64, b: f64) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// `[x_min, x_max, y_min, y_max, z_min, z_max]` of the full point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetBounds(pub [f64; 6]);

impl DatasetBounds {
    pub fn x(&self) -> Bounds {
        Bounds::new(self.0[0], self.0[1])
    }

    pub fn y(&self) -> Bounds {
        Bounds::new(self.0[2], self.0[3])
    }

    pub fn z(&self) -> Bounds {
        Bounds::new(self.0[4], self.0[5])
    }
}

/// What a [`DatasetLoader`](crate::loader::DatasetLoader) hands back before
/// ingestion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    /// Stride 6: `lower.xyz, upper.xyz` per record.
    pub coordinates: Vec<f64>,
    /// One code per point, lower then upper.
    pub critical_types: Vec<i32>,
    /// Stride 3 per point, or empty to reuse `coordinates`.
    #[serde(default)]
    pub display_coordinates: Vec<f64>,
    pub bounds: DatasetBounds,
}

/// An ingested dataset ready to be committed to a store.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedDataset {
    pub points: Vec<PersistencePointTuple>,
    pub bounds: DatasetBounds,
    pub persistence_bounds: Option<Bounds>,
}

impl TryFrom<RawDataset> for LoadedDataset {
    type Error = MalformedDatasetError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        let points = ingest(&raw)?;
        let persistence_bounds = persistence_bounds(&points);
        Ok(Self {
            points,
            bounds: raw.bounds,
            persistence_bounds,
        })
    }
}

/// Builds one tuple per 6-value record, in buffer order.
pub fn ingest(raw: &RawDataset) -> Result<Vec<PersistencePointTuple>, MalformedDatasetError> {
    let len = raw.coordinates.len();
    if len % RECORD_STRIDE != 0 {
        return Err(MalformedDatasetError {
            len,
            reason: "coordinate buffer must hold two 3-D points per record",
        });
    }

    let records = len / RECORD_STRIDE;
    if raw.critical_types.len() != records * 2 {
        return Err(MalformedDatasetError {
            len: raw.critical_types.len(),
            reason: "expected one critical type per point",
        });
    }

    let display = if raw.display_coordinates.is_empty() {
        &raw.coordinates
    } else if raw.display_coordinates.len() == len {
        &raw.display_coordinates
    } else {
        return Err(MalformedDatasetError {
            len: raw.display_coordinates.len(),
            reason: "display coordinates must hold three values per point",
        });
    };

    let points = raw
        .coordinates
        .chunks_exact(RECORD_STRIDE)
        .zip(display.chunks_exact(RECORD_STRIDE))
        .zip(raw.critical_types.chunks_exact(2))
        .map(|((record, shown), codes)| {
            PersistencePointTuple::with_display(
                Vec3::from_slice(&record[..3]),
                Vec3::from_slice(&record[3..]),
                Vec3::from_slice(&shown[..3]),
                Vec3::from_slice(&shown[3..]),
                CriticalType {
                    lower: codes[0],
                    upper: codes[1],
                },
            )
        })
        .collect();

    Ok(points)
}

/// Extent of the persistence values, seeded from the first point.
pub fn persistence_bounds(points: &[PersistencePointTuple]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;
    let seed = (first.persistence(), first.persistence());
    let (min, max) = rest.iter().fold(seed, |(min, max), point| {
        (min.min(point.persistence()), max.max(point.persistence()))
    });
    Some(Bounds::new(min, max))
}
