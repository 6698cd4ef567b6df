use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt as _;
use parking_lot::RwLock;

use crate::error::LoadError;
use crate::point::{DatasetBounds, RawDataset};

/// External collaborator that turns a resource reference into raw arrays.
///
/// The diagram never looks at the resource format itself.
pub trait DatasetLoader: Send + Sync {
    fn fetch<'a>(&'a self, source_ref: &'a str) -> BoxFuture<'a, Result<RawDataset, LoadError>>;
}

/// Reads a JSON document shaped like [`RawDataset`] from disk.
#[derive(Clone, Debug, Default)]
pub struct JsonFileLoader {
    root: Option<PathBuf>,
}

impl JsonFileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source_ref: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source_ref),
            None => PathBuf::from(source_ref),
        }
    }
}

impl DatasetLoader for JsonFileLoader {
    fn fetch<'a>(&'a self, source_ref: &'a str) -> BoxFuture<'a, Result<RawDataset, LoadError>> {
        async move {
            let path = self.resolve(source_ref);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(LoadError::Unreachable {
                        source_ref: source_ref.to_owned(),
                    })
                }
                Err(err) => return Err(err.into()),
            };
            Ok(serde_json::from_slice(&bytes)?)
        }
        .boxed()
    }
}

/// Serves datasets registered up front; used by the viewer's demo mode and
/// by tests.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    datasets: RwLock<HashMap<String, RawDataset>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source_ref: impl Into<String>, dataset: RawDataset) -> Self {
        self.insert(source_ref, dataset);
        self
    }

    pub fn insert(&self, source_ref: impl Into<String>, dataset: RawDataset) {
        self.datasets.write().insert(source_ref.into(), dataset);
    }
}

impl DatasetLoader for MemoryLoader {
    fn fetch<'a>(&'a self, source_ref: &'a str) -> BoxFuture<'a, Result<RawDataset, LoadError>> {
        let found = self.datasets.read().get(source_ref).cloned();
        async move {
            found.ok_or_else(|| LoadError::Unreachable {
                source_ref: source_ref.to_owned(),
            })
        }
        .boxed()
    }
}

/// A deterministic dataset of `records` pairs whose lower points sit on the
/// diagonal, for demos.
pub fn synthetic_dataset(records: usize) -> RawDataset {
    let mut coordinates = Vec::with_capacity(records * 6);
    let mut critical_types = Vec::with_capacity(records * 2);
    let mut bounds = [
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        0.0,
        0.0,
    ];

    for i in 0..records {
        let t = i as f64;
        let birth = 10.0 * t / records.max(1) as f64;
        let persistence = 3.0 * (t * 0.37).sin() + 2.0 * (t * 0.11).cos() + 2.0;
        let death = birth + persistence;
        coordinates.extend_from_slice(&[birth, birth, 0.0, birth, death, 0.0]);
        critical_types.extend_from_slice(&[0, if i % 3 == 0 { 3 } else { 1 }]);

        bounds[0] = bounds[0].min(birth);
        bounds[1] = bounds[1].max(birth);
        bounds[2] = bounds[2].min(birth.min(death));
        bounds[3] = bounds[3].max(birth.max(death));
    }

    if records == 0 {
        bounds = [0.0; 6];
    }

    RawDataset {
        coordinates,
        critical_types,
        display_coordinates: Vec::new(),
        bounds: DatasetBounds(bounds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::LoadedDataset;

    #[tokio::test]
    async fn memory_loader_reports_unknown_sources() {
        let loader = MemoryLoader::new().with("demo", synthetic_dataset(4));

        assert_eq!(loader.fetch("demo").await.unwrap().coordinates.len(), 24);
        assert!(matches!(
            loader.fetch("missing").await,
            Err(LoadError::Unreachable { source_ref }) if source_ref == "missing"
        ));
    }

    #[tokio::test]
    async fn json_loader_round_trips_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = synthetic_dataset(3);
        std::fs::write(
            dir.path().join("pairs.json"),
            serde_json::to_vec(&dataset).unwrap(),
        )
        .unwrap();

        let loader = JsonFileLoader::with_root(dir.path());
        assert_eq!(loader.fetch("pairs.json").await.unwrap(), dataset);
        assert!(matches!(
            loader.fetch("absent.json").await,
            Err(LoadError::Unreachable { .. })
        ));
    }

    #[tokio::test]
    async fn json_loader_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();

        let loader = JsonFileLoader::with_root(dir.path());
        assert!(matches!(
            loader.fetch("bad.json").await,
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn synthetic_dataset_is_well_formed() {
        let loaded = LoadedDataset::try_from(synthetic_dataset(250)).unwrap();
        assert_eq!(loaded.points.len(), 250);
        let y = loaded.bounds.y();
        assert!(loaded
            .points
            .iter()
            .all(|p| y.contains(p.lower().y) && y.contains(p.upper().y)));
    }
}
