//! Image uploads.
//!
//! [`RasterProcessor`] validates and re-encodes uploads; [`ImageService`]
//! stores the results as blobs and records them in the document.

mod processor;
mod service;

pub use processor::{
    ImageMetadata, ImageProcessor, ProcessOptions, ProcessedImage, RasterProcessor, MAX_DIMENSION,
};
pub use service::{ImagePage, ImageService, UploadRequest, DEFAULT_DELETE_DAYS, MAX_PAGE_SIZE};
