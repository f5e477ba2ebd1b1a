//! 记录文件存储管理

use hospital_core::{HospitalError, RecordKind, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 各记录集合对应的文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFiles {
    pub patients: String,
    pub doctors: String,
    pub appointments: String,
    pub records: String,
}

impl CollectionFiles {
    pub fn file_for(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Patient => &self.patients,
            RecordKind::Doctor => &self.doctors,
            RecordKind::Appointment => &self.appointments,
            RecordKind::MedicalRecord => &self.records,
        }
    }
}

impl Default for CollectionFiles {
    fn default() -> Self {
        Self {
            patients: RecordKind::Patient.default_file_name().to_string(),
            doctors: RecordKind::Doctor.default_file_name().to_string(),
            appointments: RecordKind::Appointment.default_file_name().to_string(),
            records: RecordKind::MedicalRecord.default_file_name().to_string(),
        }
    }
}

/// 文件存储
///
/// 不在两次调用之间保存任何状态：`load` 读取整个文件，`save` 覆盖整个文件。
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    pretty: bool,
}

impl FileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            pretty: true,
        }
    }

    /// 设置是否以缩进格式写出JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.base_path.join(file_name)
    }

    /// 读取文件中的JSON数组
    ///
    /// 文件不存在、不可读、为空或内容不是JSON数组时返回空序列。
    pub async fn load_values(&self, file_name: &str) -> Vec<Value> {
        let path = self.path_for(file_name);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No data file at {}, starting empty", path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {}, starting empty", path.display(), e);
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!("{} does not hold a JSON array, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to parse {}: {}, starting empty", path.display(), e);
                Vec::new()
            }
        }
    }

    /// 读取并解码记录，无法解码的条目被跳过
    pub async fn load<T: DeserializeOwned>(&self, file_name: &str) -> Vec<T> {
        let values = self.load_values(file_name).await;
        let total = values.len();

        let records: Vec<T> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping entry {} in {}: {}", index, file_name, e);
                    None
                }
            })
            .collect();

        debug!("Loaded {}/{} entries from {}", records.len(), total, file_name);
        records
    }

    /// 把整个序列写成JSON数组并覆盖文件
    pub async fn save<T: Serialize>(&self, file_name: &str, records: &[T]) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let content = if self.pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };

        let path = self.path_for(file_name);
        tokio::fs::write(&path, content).await.map_err(|e| {
            HospitalError::Storage(format!("failed to write {}: {}", path.display(), e))
        })?;

        debug!("Saved {} entries to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_core::{Appointment, Patient};

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let mut patient = Patient::new("P001", "Ali", 21);
        patient.notes = "allergic to penicillin".to_string();
        storage.save("patients.txt", &[patient.clone()]).await.unwrap();

        let loaded: Vec<Patient> = storage.load("patients.txt").await;
        assert_eq!(loaded, vec![patient]);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let loaded: Vec<Patient> = storage.load("patients.txt").await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_corrupt_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        std::fs::write(dir.path().join("empty.txt"), "  \n").unwrap();
        std::fs::write(dir.path().join("corrupt.txt"), "[{\"patient_id\":").unwrap();
        std::fs::write(dir.path().join("object.txt"), "{\"a\": 1}").unwrap();

        assert!(storage.load::<Patient>("empty.txt").await.is_empty());
        assert!(storage.load::<Patient>("corrupt.txt").await.is_empty());
        assert!(storage.load::<Patient>("object.txt").await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let content = r#"[
            {"patient_id": "P1", "name": "Ali", "age": 21},
            {"patient_id": "P2", "name": "Sara", "age": "old"},
            {"patient_id": "P3", "name": "Omar", "age": 40, "gender": "M"}
        ]"#;
        std::fs::write(dir.path().join("patients.txt"), content).unwrap();

        let loaded: Vec<Patient> = storage.load("patients.txt").await;
        let ids: Vec<&str> = loaded.iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested")).with_pretty(false);

        let first = Appointment::new("A1", "P1", "D1", "2024-05-01 09:30");
        let second = Appointment::new("A2", "P1", "D1", "2024-05-02 09:30");
        storage.save("appointments.txt", &[first, second.clone()]).await.unwrap();
        storage.save("appointments.txt", &[second.clone()]).await.unwrap();

        let loaded: Vec<Appointment> = storage.load("appointments.txt").await;
        assert_eq!(loaded, vec![second]);

        let raw = std::fs::read_to_string(storage.path_for("appointments.txt")).unwrap();
        assert!(raw.starts_with("[{"));
    }

    #[test]
    fn test_collection_files_default() {
        let files = CollectionFiles::default();
        assert_eq!(files.file_for(RecordKind::Patient), "patients.txt");
        assert_eq!(files.file_for(RecordKind::MedicalRecord), "records.txt");
    }
}
