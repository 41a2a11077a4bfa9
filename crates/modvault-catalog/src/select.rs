//! Variant selection: which files of a version get archived.
//!
//! Checkpoints are commonly published as several functionally equivalent
//! multi-gigabyte files (SafeTensor and PickleTensor encodings, full and
//! pruned sizes). Only one variant family is kept for them. Files whose
//! format is unspecified or `Other` are always kept, since nothing is known
//! about what they contain. Every other category is archived unfiltered.

use crate::model::{FileDescriptor, FileFormat, ModelType};

/// Formats tried in order; the first with at least one file wins.
pub const FORMAT_PRIORITY: [FileFormat; 2] = [FileFormat::SafeTensor, FileFormat::PickleTensor];

/// Pick the files of one version worth downloading.
///
/// The result lists the always-kept files first, then the chosen format
/// group, each in input order.
pub fn select_files<'a>(files: &'a [FileDescriptor], model_type: &ModelType) -> Vec<&'a FileDescriptor> {
    if !model_type.has_redundant_variants() {
        return files.iter().collect();
    }

    let mut selected: Vec<&FileDescriptor> = files.iter().filter(|f| is_always_kept(f)).collect();

    if let Some(group) = FORMAT_PRIORITY
        .iter()
        .map(|format| format_group(files, format))
        .find(|group| !group.is_empty())
    {
        selected.extend(group);
    }

    selected
}

/// Sum of declared sizes, in kilobytes.
pub fn declared_kb<'a>(files: impl IntoIterator<Item = &'a FileDescriptor>) -> f64 {
    files.into_iter().map(|f| f.size_kb).sum()
}

fn is_always_kept(file: &FileDescriptor) -> bool {
    matches!(file.format(), None | Some(FileFormat::Other))
}

/// Files of `format`; only the full ones if any member is full.
fn format_group<'a>(files: &'a [FileDescriptor], format: &FileFormat) -> Vec<&'a FileDescriptor> {
    let members: Vec<&FileDescriptor> = files.iter().filter(|f| f.format() == Some(format)).collect();
    if members.iter().any(|f| f.is_full()) {
        members.into_iter().filter(|f| f.is_full()).collect()
    } else {
        members
    }
}
