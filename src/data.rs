use crate::types::{Column, Dataset, Record};
use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const VEHICLE_NUMBER_HEADER: &str = "Vehicle Number";

static DATASET_CACHE: DatasetCache = DatasetCache::new();

/// Loads the dataset at `path`, reusing the copy already parsed for this process
/// when the path is unchanged.
pub fn load_data(path: &Path) -> Result<Arc<Dataset>> {
    DATASET_CACHE.load(path)
}

/// Memo of the most recently loaded dataset, keyed by path.
pub struct DatasetCache {
    slot: Mutex<Option<CachedDataset>>,
}

struct CachedDataset {
    path: PathBuf,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    pub const fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>> {
        // Held across the read so concurrent sessions parse the file once.
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("Dataset cache lock poisoned"))?;

        if let Some(cached) = slot.as_ref() {
            if cached.path == path {
                debug!("Dataset cache hit for {:?}", path);
                return Ok(Arc::clone(&cached.dataset));
            }
            info!("Input path changed from {:?}, reloading", cached.path);
        }

        let dataset = Arc::new(read_dataset(path)?);
        *slot = Some(CachedDataset {
            path: path.to_path_buf(),
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    info!("Loading bike locations from {:?}", path);
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let dataset = parse_dataset(file)
        .with_context(|| format!("Failed to load CSV file: {:?}", path))?;
    info!("Loaded {} bike locations", dataset.len());
    Ok(dataset)
}

/// Parses bike location records from CSV. Columns beyond the required ones are ignored.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let required = std::iter::once(VEHICLE_NUMBER_HEADER)
        .chain(Column::ALL.iter().map(|c| c.header()));
    for name in required {
        if !headers.iter().any(|h| h == name) {
            return Err(anyhow!("Required column '{}' not found in CSV", name));
        }
    }

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<Record>().enumerate() {
        // Header is line 1
        let record = result.with_context(|| format!("Malformed CSV row at line {}", index + 2))?;
        records.push(record);
    }

    Ok(Dataset::new(records))
}
