//! Tree walker: enumerate, load, substitute, write, aggregate.

use crate::engine::apply_setters;
use crate::rules::SelectionRules;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use refsync_setters::PolicyIndex;
use refsync_types::{ImagePolicy, UpdateResult, UpdateResultV2};
use refsync_yaml::SourceFile;
use tracing::debug;

/// Run the update and return the applied-references view.
///
/// Same pass as [`update_v2_with_setters`]; the result is its
/// `image_result` component.
pub fn update_with_setters(
    input_root: &Utf8Path,
    output_root: &Utf8Path,
    policies: &[ImagePolicy],
    rules: &SelectionRules,
) -> anyhow::Result<UpdateResult> {
    Ok(update_v2_with_setters(input_root, output_root, policies, rules)?.image_result)
}

/// Walk every regular file under `input_root`, apply the supplied
/// policies to files the rules select as YAML, and write each file —
/// rewritten or byte-identical — to the same relative path under
/// `output_root`.
///
/// Fatal conditions: an unreadable input root, a selected file that does
/// not parse as YAML, an unwritable output root. Everything the marker
/// grammar cannot act on is skipped silently. Files with no recorded
/// changes are absent from both result maps.
pub fn update_v2_with_setters(
    input_root: &Utf8Path,
    output_root: &Utf8Path,
    policies: &[ImagePolicy],
    rules: &SelectionRules,
) -> anyhow::Result<UpdateResultV2> {
    let index = PolicyIndex::new(policies.iter().cloned());
    let mut result = UpdateResultV2::default();

    let mut files = Vec::new();
    collect_files(input_root, input_root, &mut files)
        .with_context(|| format!("enumerate files under {input_root}"))?;

    for rel in files {
        let in_path = input_root.join(&rel);
        let out_path = output_root.join(&rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file_name = rel.file_name().unwrap_or_default();
        if !rules.matches(file_name) {
            let bytes = fs::read(&in_path)?;
            fs::write(&out_path, bytes)?;
            continue;
        }

        let text = fs::read_to_string(&in_path)?;
        let mut file =
            SourceFile::parse(text).with_context(|| format!("parse YAML in {in_path}"))?;
        apply_setters(&mut file, rel.as_str(), &index, &mut result);
        if file.is_modified() {
            debug!(file = %rel, "rewrote marked fields");
        }
        // The full output is in memory before the write; a crash cannot
        // leave a truncated file behind mid-computation.
        fs::write(&out_path, file.emit())?;
    }

    Ok(result)
}

/// Recursively list regular files under `dir` as paths relative to
/// `root`, in sorted order. Directories create no entries.
fn collect_files(
    root: &Utf8Path,
    dir: &Utf8Path,
    out: &mut Vec<Utf8PathBuf>,
) -> anyhow::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))?;
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .with_context(|| format!("relativize {path}"))?;
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}
