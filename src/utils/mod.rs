//! Utility functions for image processing
//!
//! - Grayscale conversion (RGBA to luma)
//! - Global threshold binarization

/// Global threshold binarization
pub mod binarization;
/// RGBA to luma conversion
pub mod grayscale;
