use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use ipakit_errors::{Error, SignatureError};
use ipakit_events::{AppEvent, EventEmitter, EventSender, SignatureEvent};
use ipakit_store::{Item, Sinf};
use plist::Value;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::task;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const MANIFEST_SUFFIX: &str = ".app/SC_Info/Manifest.plist";
const INFO_SUFFIX: &str = ".app/Info.plist";
const METADATA_ENTRY: &str = "iTunesMetadata.plist";

/// Signature manifest embedded in the app bundle, listing the bundle-
/// relative paths where sinf blobs belong.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "SinfPaths")]
    paths: Vec<String>,
}

/// Patches a downloaded package archive in place.
///
/// Archive work is blocking file I/O and runs on the blocking pool. Each
/// step stages its new entry in a scoped temp dir first, so a failure
/// before the archive write leaves the archive as it was.
pub struct SignatureClient {
    path: PathBuf,
    tx: Option<EventSender>,
}

impl SignatureClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Write the purchaser's metadata into the archive root.
    ///
    /// The grant's metadata dictionary is carried verbatim except for the
    /// `apple-id` and `userName` keys, which are set to the account email.
    /// The result lands as a top-level `iTunesMetadata.plist` entry.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] kinds for archive and encoding failures.
    pub async fn append_metadata(&self, item: &Item, email: &str) -> Result<(), Error> {
        let path = self.path.clone();
        let metadata = item.metadata.clone();
        let email = email.to_string();
        task::spawn_blocking(move || append_metadata_blocking(&path, metadata, &email))
            .await
            .map_err(|e| Error::internal(format!("patch task failed: {e}")))??;

        self.emit(AppEvent::Signature(SignatureEvent::MetadataAppended {
            archive: self.path.display().to_string(),
        }));
        Ok(())
    }

    /// Write the primary signature blob at the path the embedded manifest
    /// dictates.
    ///
    /// Locates the app bundle inside the archive, reads its signature
    /// manifest, and adds the grant's id-0 sinf at
    /// `Payload/<bundle>.app/<manifest path>`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::EntryNotFound`] when the archive has no
    /// signature manifest, [`SignatureError::InvalidBundle`] when no app
    /// bundle can be located, and [`SignatureError::MissingSignature`] when
    /// the grant lacks an id-0 sinf or the manifest lists no paths. The
    /// archive is unmodified in all of those cases.
    pub async fn append_signature(&self, item: &Item) -> Result<(), Error> {
        let path = self.path.clone();
        let sinfs = item.sinfs.clone();
        let entry = task::spawn_blocking(move || append_signature_blocking(&path, &sinfs))
            .await
            .map_err(|e| Error::internal(format!("patch task failed: {e}")))??;

        self.emit(AppEvent::Signature(SignatureEvent::SignatureAppended {
            archive: self.path.display().to_string(),
            entry,
        }));
        Ok(())
    }
}

impl EventEmitter for SignatureClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

fn append_metadata_blocking(
    path: &Path,
    mut metadata: plist::Dictionary,
    email: &str,
) -> Result<(), Error> {
    metadata.insert("apple-id".to_string(), Value::String(email.to_string()));
    metadata.insert("userName".to_string(), Value::String(email.to_string()));

    let staging = TempDir::new()?;
    let staged = staging.path().join(METADATA_ENTRY);
    let file = File::create(&staged).map_err(|e| Error::io_with_path(&e, &staged))?;
    Value::Dictionary(metadata)
        .to_writer_xml(file)
        .map_err(|e| SignatureError::PlistEncoding {
            message: e.to_string(),
        })?;

    let mut writer = open_for_append(path)?;
    add_file_entry(&mut writer, METADATA_ENTRY, &staged)?;
    finish(writer, METADATA_ENTRY)
}

fn append_signature_blocking(path: &Path, sinfs: &[Sinf]) -> Result<String, Error> {
    let file = File::open(path).map_err(|e| Error::io_with_path(&e, path))?;
    let mut archive = ZipArchive::new(file).map_err(|e| SignatureError::InvalidArchive {
        message: e.to_string(),
    })?;

    let manifest: Manifest = read_plist_entry(&mut archive, MANIFEST_SUFFIX)?;

    let info_path = entry_with_suffix(&archive, INFO_SUFFIX).ok_or_else(|| {
        SignatureError::InvalidBundle {
            path: INFO_SUFFIX.to_string(),
        }
    })?;
    let bundle = bundle_name(&info_path).ok_or_else(|| SignatureError::InvalidBundle {
        path: info_path.clone(),
    })?;

    let sinf = sinfs
        .iter()
        .find(|s| s.id == 0)
        .ok_or(SignatureError::MissingSignature)?;
    let target = manifest
        .paths
        .first()
        .ok_or(SignatureError::MissingSignature)?;
    let entry_name = format!("Payload/{bundle}.app/{target}");

    let staging = TempDir::new()?;
    let staged = staging.path().join(&entry_name);
    if let Some(parent) = staged.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
    }
    std::fs::write(&staged, &sinf.data).map_err(|e| Error::io_with_path(&e, &staged))?;

    drop(archive);
    let mut writer = open_for_append(path)?;
    add_file_entry(&mut writer, &entry_name, &staged)?;
    finish(writer, &entry_name)?;
    Ok(entry_name)
}

/// App bundle name from an `Info.plist` entry path, e.g.
/// `Payload/Spotify.app/Info.plist` yields `Spotify`.
fn bundle_name(info_entry_path: &str) -> Option<&str> {
    let app_dir = info_entry_path.strip_suffix("/Info.plist")?;
    let stem = app_dir.strip_suffix(".app")?;
    stem.rsplit('/').next().filter(|name| !name.is_empty())
}

fn entry_with_suffix<R: Read + std::io::Seek>(
    archive: &ZipArchive<R>,
    suffix: &str,
) -> Option<String> {
    archive
        .file_names()
        .find(|name| name.ends_with(suffix))
        .map(ToString::to_string)
}

fn read_plist_entry<T, R>(archive: &mut ZipArchive<R>, suffix: &str) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
    R: Read + std::io::Seek,
{
    let name =
        entry_with_suffix(archive, suffix).ok_or_else(|| SignatureError::EntryNotFound {
            suffix: suffix.to_string(),
        })?;
    let mut entry = archive
        .by_name(&name)
        .map_err(|e| SignatureError::InvalidArchive {
            message: e.to_string(),
        })?;
    let mut raw = Vec::new();
    entry
        .read_to_end(&mut raw)
        .map_err(|e| SignatureError::InvalidArchive {
            message: e.to_string(),
        })?;
    plist::from_bytes(&raw).map_err(|e| {
        SignatureError::MalformedManifest {
            message: e.to_string(),
        }
        .into()
    })
}

fn open_for_append(path: &Path) -> Result<ZipWriter<File>, Error> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| Error::io_with_path(&e, path))?;
    ZipWriter::new_append(file).map_err(|e| {
        SignatureError::InvalidArchive {
            message: e.to_string(),
        }
        .into()
    })
}

fn add_file_entry(writer: &mut ZipWriter<File>, name: &str, source: &Path) -> Result<(), Error> {
    writer
        .start_file(name, SimpleFileOptions::default())
        .map_err(|e| archive_write(name, &e))?;
    let mut file = File::open(source).map_err(|e| Error::io_with_path(&e, source))?;
    std::io::copy(&mut file, writer).map_err(|e| archive_write(name, &e))?;
    Ok(())
}

fn finish(writer: ZipWriter<File>, entry: &str) -> Result<(), Error> {
    writer.finish().map_err(|e| archive_write(entry, &e))?;
    Ok(())
}

fn archive_write(entry: &str, e: &dyn std::fmt::Display) -> Error {
    SignatureError::ArchiveWrite {
        entry: entry.to_string(),
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::bundle_name;

    #[test]
    fn bundle_name_comes_from_the_segment_before_app() {
        assert_eq!(
            bundle_name("Payload/Spotify.app/Info.plist"),
            Some("Spotify")
        );
        assert_eq!(bundle_name("Demo.app/Info.plist"), Some("Demo"));
        assert_eq!(
            bundle_name("Payload/My App.app/Info.plist"),
            Some("My App")
        );
    }

    #[test]
    fn degenerate_paths_have_no_bundle_name() {
        assert_eq!(bundle_name(".app/Info.plist"), None);
        assert_eq!(bundle_name("Payload/Spotify/Info.plist"), None);
        assert_eq!(bundle_name("Info.plist"), None);
    }
}
