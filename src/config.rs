//! YAML job configuration files.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::DefectPrepError;

/// Reads a YAML file into a job configuration.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DefectPrepError> {
    let text = fs::read_to_string(path).map_err(DefectPrepError::io_at(path))?;
    serde_yaml::from_str(&text).map_err(|source| DefectPrepError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{ClassSource, ScanConfig};
    use tempfile::tempdir;

    #[test]
    fn loads_scan_config() {
        let temp = tempdir().expect("create temp dir");
        let path = temp.path().join("scan.yaml");
        fs::write(
            &path,
            "output: info.json\n\
             datasets:\n  \
               - name: GC10-DET\n    \
                 images_dir: raw/gc10\n    \
                 class_source:\n      \
                   kind: parent_directory\n",
        )
        .expect("write config");

        let config: ScanConfig = load_yaml(&path).expect("load config");
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].class_source, ClassSource::ParentDirectory);
        assert_eq!(config.datasets[0].extensions, vec!["jpg", "png", "jpeg", "bmp"]);
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let temp = tempdir().expect("create temp dir");
        let path = temp.path().join("bad.yaml");
        fs::write(&path, "datasets: [").expect("write config");

        let err = load_yaml::<ScanConfig>(&path).unwrap_err();
        assert!(matches!(err, DefectPrepError::ConfigParse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }
}
