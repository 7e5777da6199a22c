//! Data location definition and helper
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use tracklog::prelude::{MediaLayout, SystemClock, TrackStore};

use crate::{cli::Cli, Error};

/// Store snapshot, within the data folder
const STORE_FILENAME: &str = "store.json";

/// Media folders, within the data folder
const MEDIA_DIRECTORY: &str = "media";

/// Data folder, where the track store and the media files live
pub struct Workspace {
    /// Root Fullpath
    pub root: PathBuf,
}

impl Workspace {
    /// Builds the workspace either
    ///  1. from $TRACKLOG_DATA environment variable
    ///  2. from -d data CLI argument
    ///  3. or defaults to ./TRACKLOG
    pub fn new(cli: &Cli) -> Result<Self, Error> {
        let root = match std::env::var("TRACKLOG_DATA") {
            Ok(path) => Path::new(&path).to_path_buf(),
            _ => match cli.data_location() {
                Some(path) => path.to_path_buf(),
                None => Path::new("TRACKLOG").to_path_buf(),
            },
        };
        create_dir_all(root.join(MEDIA_DIRECTORY))?;
        debug!("data location is \"{}\"", root.display());
        Ok(Self { root })
    }
    fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILENAME)
    }
    /// Restores the track store, or creates a new one on first use
    pub fn open_store(&self) -> Result<TrackStore, Error> {
        let path = self.store_path();
        let store = if path.exists() {
            TrackStore::load(&path, SystemClock)?
        } else {
            info!("new track store");
            TrackStore::new(SystemClock)
        };
        Ok(store.with_media(MediaLayout::new(self.root.join(MEDIA_DIRECTORY))))
    }
    /// Dumps the track store
    pub fn save_store(&self, store: &TrackStore) -> Result<(), Error> {
        store.save(self.store_path())?;
        Ok(())
    }
}
