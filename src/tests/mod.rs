//! tracklog lib test modules

mod export;
mod media;
