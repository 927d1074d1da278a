//! Mapping from public object URLs back to blob store paths.
use percent_encoding::percent_decode_str;
use reqwest::Url;

/// An object inside a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageObject {
    pub bucket: String,
    pub path: String,
}

/// Parse a public object URL of the form
/// `{base}/storage/v1/object/public/{bucket}/{path...}`.
///
/// Segments are percent-decoded: the remove endpoint expects raw object names.
///
/// Anything else (foreign hosts with another layout, data URLs, garbage,
/// segments that do not decode to UTF-8) yields `None`: there is nothing for
/// us to remove.
pub fn storage_object_from_url(raw: &str) -> Option<StorageObject> {
    let url = Url::parse(raw.trim()).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let marker = segments
        .windows(2)
        .position(|w| w[0] == "object" && w[1] == "public")?;
    let rest = &segments[marker + 2..];
    let (bucket, path) = rest.split_first()?;
    if bucket.is_empty() || path.iter().all(|s| s.is_empty()) {
        return None;
    }
    let path = path
        .iter()
        .map(|s| decode_segment(s))
        .collect::<Option<Vec<_>>>()?;
    Some(StorageObject {
        bucket: decode_segment(bucket)?,
        path: path.join("/"),
    })
}

fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Objects referenced by an order's image list, in list order, without duplicates.
pub fn storage_objects<'a, I>(urls: I) -> Vec<StorageObject>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<StorageObject> = Vec::new();
    for obj in urls.into_iter().filter_map(|u| storage_object_from_url(u)) {
        if !out.contains(&obj) {
            out.push(obj);
        }
    }
    out
}
