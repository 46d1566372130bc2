//! Encodes a directory tree as the multipart body of an `add` command.

use crate::error::local;
use futures::{TryStreamExt, stream};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use sitepin_core::ApiError;
use std::path::{Component, Path, PathBuf};
use tokio_util::io::ReaderStream;
use walkdir::WalkDir;

const FIELD: &str = "file";
const DIRECTORY_MIME: &str = "application/x-directory";
const SYMLINK_MIME: &str = "application/symlink";
const FILE_MIME: &str = "application/octet-stream";

/// Builds the multipart form for `root`.
///
/// Returns the form and the name the node will report for the root entry.
pub(crate) async fn directory_form(root: &Path) -> Result<(Form, String), ApiError> {
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| local(e, root.display()))?;
    let meta = tokio::fs::metadata(&root)
        .await
        .map_err(|e| local(e, root.display()))?;
    if !meta.is_dir() {
        return Err(ApiError::Local(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_owned());

    // Part names are escaped by `escape`, so the form must not encode them again.
    let mut form = Form::new().percent_encode_noop();
    let mut files = 0usize;
    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| ApiError::Local(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(&root)
            .map_err(|e| ApiError::Local(e.to_string()))?;
        let name = part_name(&root_name, relative);
        let file_type = entry.file_type();

        let part = if file_type.is_dir() {
            Part::bytes(Vec::new()).mime_str(DIRECTORY_MIME)
        } else if file_type.is_symlink() {
            let target = tokio::fs::read_link(entry.path())
                .await
                .map_err(|e| local(e, entry.path().display()))?;
            Part::bytes(target.to_string_lossy().into_owned().into_bytes()).mime_str(SYMLINK_MIME)
        } else if file_type.is_file() {
            let len = entry
                .metadata()
                .map_err(|e| ApiError::Local(e.to_string()))?
                .len();
            files += 1;
            Part::stream_with_length(file_body(entry.path().to_path_buf()), len).mime_str(FILE_MIME)
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping special file");
            continue;
        };
        let part = part.map_err(|e| ApiError::Local(e.to_string()))?;

        form = form.part(FIELD, part.file_name(escape(&name)));
    }

    tracing::debug!(root = %root.display(), files, "encoded directory for upload");
    Ok((form, root_name))
}

/// Streams the file at `path`, opening it on first poll so a built form
/// holds no descriptors.
fn file_body(path: PathBuf) -> Body {
    let open = async move { tokio::fs::File::open(path).await };
    Body::wrap_stream(stream::once(open).map_ok(ReaderStream::new).try_flatten())
}

/// `root_name` followed by the components of `relative`, joined with `/`.
fn part_name(root_name: &str, relative: &Path) -> String {
    let mut name = root_name.to_owned();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            name.push('/');
            name.push_str(&segment.to_string_lossy());
        }
    }
    name
}

fn escape(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes()).collect()
}
