//! Tensor saving utilities.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

use super::TensorRecord;

/// JSON sidecar describing a saved payload.
#[derive(Debug, Serialize)]
struct TensorDescriptor<'a> {
    name: &'a str,
    data_type: u8,
    shape: &'a [u32],
    bytes: usize,
    data_file: &'a str,
}

/// Save a tensor record into `dir`.
///
/// Writes the raw payload to `<stem>.bin` and a JSON descriptor (name, type
/// code, shape, byte length, payload file name) to `<stem>.json`.
///
/// # Returns
///
/// Path of the payload file.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn save_tensor<P: AsRef<Path>>(tensor: &TensorRecord, dir: P, stem: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let data_file = format!("{stem}.bin");
    let data_path = dir.join(&data_file);
    let json_path = dir.join(format!("{stem}.json"));

    fs::write(&data_path, &tensor.data)?;

    let descriptor = TensorDescriptor {
        name: &tensor.name,
        data_type: tensor.data_type,
        shape: &tensor.shape,
        bytes: tensor.data.len(),
        data_file: &data_file,
    };

    let writer = BufWriter::new(File::create(&json_path)?);
    serde_json::to_writer_pretty(writer, &descriptor).map_err(|source| Error::TensorSave {
        path: json_path.clone(),
        source,
    })?;

    tracing::debug!("Saved {} ({} bytes)", data_path.display(), tensor.data.len());

    Ok(data_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_payload_and_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let tensor = TensorRecord {
            name: "image_tensor".to_string(),
            data_type: 0,
            shape: vec![1, 1, 2, 3],
            data: vec![1, 2, 3, 4, 5, 6],
        };

        let path = save_tensor(&tensor, dir.path(), "frame").unwrap();
        assert_eq!(path, dir.path().join("frame.bin"));
        assert_eq!(fs::read(&path).unwrap(), tensor.data);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("frame.json")).unwrap())
                .unwrap();
        assert_eq!(json["name"], "image_tensor");
        assert_eq!(json["data_type"], 0);
        assert_eq!(json["shape"], serde_json::json!([1, 1, 2, 3]));
        assert_eq!(json["bytes"], 6);
        assert_eq!(json["data_file"], "frame.bin");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tensor = TensorRecord {
            name: "image_tensor".to_string(),
            data_type: 0,
            shape: vec![1, 1, 1, 3],
            data: vec![0; 3],
        };

        let err = save_tensor(&tensor, dir.path().join("missing"), "frame").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
