//! Upload sources and content-type inference.

use std::path::Path;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::Result;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain";

/// Something to upload.
pub enum UploadSource<'a> {
  /// A local file, read whole.
  File(&'a Path),
  /// Raw bytes.
  Bytes(Bytes),
  /// A local file path if such a file exists, otherwise literal UTF-8 text.
  Text(&'a str),
  /// A caller-owned reader, read to the end and left open.
  Reader(&'a mut (dyn AsyncRead + Unpin + Send)),
}

/// Per-upload settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
  /// Upload with the public-read ACL.
  pub public:            bool,
  /// Overrides content-type inference.
  pub content_type:      Option<String>,
  /// Sent as `Content-Disposition: attachment; filename="…"`.
  pub download_filename: Option<String>,
}

impl UploadOptions {
  pub fn public() -> Self { Self { public: true, ..Self::default() } }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = Some(content_type.into());
    self
  }

  pub fn with_download_filename(mut self, name: impl Into<String>) -> Self {
    self.download_filename = Some(name.into());
    self
  }

  pub(crate) fn content_disposition(&self) -> Option<String> {
    self
      .download_filename
      .as_ref()
      .map(|name| format!("attachment; filename=\"{}\"", name.replace('"', "")))
  }
}

/// A source read into memory, ready to put.
pub(crate) struct Loaded {
  pub data:         Bytes,
  /// Basename of the source file, when the source was a file.
  pub file_name:    Option<String>,
  pub content_type: String,
}

impl UploadSource<'_> {
  pub(crate) async fn load(self) -> Result<Loaded> {
    match self {
      Self::File(path) => load_file(path).await,
      Self::Text(text) => {
        if tokio::fs::metadata(text).await.is_ok_and(|m| m.is_file()) {
          load_file(Path::new(text)).await
        } else {
          Ok(Loaded {
            data:         Bytes::copy_from_slice(text.as_bytes()),
            file_name:    None,
            content_type: TEXT_PLAIN.to_owned(),
          })
        }
      }
      Self::Bytes(data) => Ok(Loaded {
        content_type: sniff(&data).to_owned(),
        data,
        file_name: None,
      }),
      Self::Reader(reader) => {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(Loaded {
          content_type: sniff(&buf).to_owned(),
          data:         Bytes::from(buf),
          file_name:    None,
        })
      }
    }
  }
}

async fn load_file(path: &Path) -> Result<Loaded> {
  let data = Bytes::from(tokio::fs::read(path).await?);
  let content_type = mime_guess::from_path(path)
    .first_raw()
    .map(str::to_owned)
    .unwrap_or_else(|| sniff(&data).to_owned());
  Ok(Loaded {
    data,
    file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
    content_type,
  })
}

/// Guess a content type from leading magic bytes, falling back on whether
/// the content is valid UTF-8.
pub(crate) fn sniff(data: &[u8]) -> &'static str {
  const MAGIC: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
  ];

  MAGIC
    .iter()
    .find(|(magic, _)| data.starts_with(magic))
    .map(|(_, mime)| *mime)
    .unwrap_or_else(|| match std::str::from_utf8(data) {
      Ok(_) => TEXT_PLAIN,
      Err(_) => OCTET_STREAM,
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sniffs_text_binary_and_magic() {
    assert_eq!(sniff(b"a,b,c\r\n"), "text/plain");
    assert_eq!(sniff(&[0xff, 0xfe, 0x00, 0x9f]), "application/octet-stream");
    assert_eq!(sniff(b"%PDF-1.7 ..."), "application/pdf");
  }

  #[tokio::test]
  async fn text_naming_a_missing_file_is_uploaded_literally() {
    let loaded = UploadSource::Text("no/such/file.csv").load().await.unwrap();
    assert_eq!(&loaded.data[..], b"no/such/file.csv");
    assert_eq!(loaded.content_type, "text/plain");
    assert!(loaded.file_name.is_none());
  }

  #[tokio::test]
  async fn text_naming_an_existing_file_reads_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    tokio::fs::write(&path, "x,y\r\n").await.unwrap();

    let loaded = UploadSource::Text(path.to_str().unwrap()).load().await.unwrap();
    assert_eq!(&loaded.data[..], b"x,y\r\n");
    assert_eq!(loaded.content_type, "text/csv");
    assert_eq!(loaded.file_name.as_deref(), Some("out.csv"));
  }

  #[tokio::test]
  async fn reader_is_read_to_end() {
    let mut reader: &[u8] = b"streamed";
    let loaded = UploadSource::Reader(&mut reader).load().await.unwrap();
    assert_eq!(&loaded.data[..], b"streamed");
  }

  #[test]
  fn disposition_header() {
    let opts = UploadOptions::default().with_download_filename("r.csv");
    assert_eq!(
      opts.content_disposition().as_deref(),
      Some("attachment; filename=\"r.csv\"")
    );
  }
}
