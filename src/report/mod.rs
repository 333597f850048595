//! Chart images and DOCX documents built from school aggregates.

pub mod chart;
pub mod document;
