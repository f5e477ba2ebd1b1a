//! 核心数据模型定义

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 记录类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Patient,       // 患者
    Doctor,        // 医生
    Appointment,   // 预约
    MedicalRecord, // 病历
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Patient,
        RecordKind::Doctor,
        RecordKind::Appointment,
        RecordKind::MedicalRecord,
    ];

    /// 自动生成ID时使用的前缀
    pub fn id_prefix(&self) -> &'static str {
        match self {
            RecordKind::Patient => "P",
            RecordKind::Doctor => "D",
            RecordKind::Appointment => "A",
            RecordKind::MedicalRecord => "R",
        }
    }

    /// 默认的持久化文件名
    pub fn default_file_name(&self) -> &'static str {
        match self {
            RecordKind::Patient => "patients.txt",
            RecordKind::Doctor => "doctors.txt",
            RecordKind::Appointment => "appointments.txt",
            RecordKind::MedicalRecord => "records.txt",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Patient => write!(f, "Patient"),
            RecordKind::Doctor => write!(f, "Doctor"),
            RecordKind::Appointment => write!(f, "Appointment"),
            RecordKind::MedicalRecord => write!(f, "Medical record"),
        }
    }
}

/// 可持久化的记录
///
/// 每条记录以字段名到值的JSON对象形式保存，`id()` 在所属集合内唯一。
pub trait Record: Clone + Serialize + DeserializeOwned {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    /// 参与子串搜索的文本字段
    fn search_text(&self) -> Vec<&str>;

    /// ID完全匹配，或任一搜索字段包含查询串（不区分大小写）
    fn matches(&self, query: &str) -> bool {
        if self.id() == query {
            return true;
        }
        let needle = query.to_lowercase();
        self.search_text()
            .iter()
            .any(|text| text.to_lowercase().contains(&needle))
    }
}

/// 患者信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

impl Patient {
    pub fn new(patient_id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: name.into(),
            age,
            gender: String::new(),
            phone: String::new(),
            notes: String::new(),
        }
    }
}

impl Record for Patient {
    const KIND: RecordKind = RecordKind::Patient;

    fn id(&self) -> &str {
        &self.patient_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}, age {}", self.patient_id, self.name, self.age)?;
        if !self.gender.is_empty() {
            write!(f, ", {}", self.gender)?;
        }
        if !self.phone.is_empty() {
            write!(f, ", phone {}", self.phone)?;
        }
        Ok(())
    }
}

/// 医生信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub phone: String,
}

impl Doctor {
    pub fn new(
        doctor_id: impl Into<String>,
        name: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            name: name.into(),
            specialization: specialization.into(),
            phone: String::new(),
        }
    }
}

impl Record for Doctor {
    const KIND: RecordKind = RecordKind::Doctor;

    fn id(&self) -> &str {
        &self.doctor_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.name, &self.specialization]
    }
}

impl fmt::Display for Doctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Dr. {} ({})", self.doctor_id, self.name, self.specialization)?;
        if !self.phone.is_empty() {
            write!(f, ", phone {}", self.phone)?;
        }
        Ok(())
    }
}

/// 预约信息
///
/// `date_time` 固定为 `YYYY-MM-DD HH:MM` 格式，因此按字符串排序即按时间排序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date_time: String,
    #[serde(default)]
    pub reason: String,
}

impl Appointment {
    pub fn new(
        appointment_id: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        date_time: impl Into<String>,
    ) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            date_time: date_time.into(),
            reason: String::new(),
        }
    }
}

impl Record for Appointment {
    const KIND: RecordKind = RecordKind::Appointment;

    fn id(&self) -> &str {
        &self.appointment_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.patient_id, &self.doctor_id, &self.reason]
    }
}

/// 病历记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicalRecord {
    pub record_id: String,
    pub patient_id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord {
    pub fn new(
        record_id: impl Into<String>,
        patient_id: impl Into<String>,
        diagnosis: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            patient_id: patient_id.into(),
            diagnosis: diagnosis.into(),
            notes: String::new(),
        }
    }
}

impl Record for MedicalRecord {
    const KIND: RecordKind = RecordKind::MedicalRecord;

    fn id(&self) -> &str {
        &self.record_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.patient_id, &self.diagnosis]
    }
}

impl fmt::Display for MedicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: patient {} | {}", self.record_id, self.patient_id, self.diagnosis)?;
        if !self.notes.is_empty() {
            write!(f, " | Notes: {}", self.notes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_serializes_field_names() {
        let patient = Patient::new("P001", "Ali", 21);
        let value = serde_json::to_value(&patient).unwrap();

        assert_eq!(value["patient_id"], "P001");
        assert_eq!(value["name"], "Ali");
        assert_eq!(value["age"], 21);
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let json = r#"{"appointment_id":"A1","patient_id":"P1","doctor_id":"D1","date_time":"2024-05-01 09:30"}"#;
        let appointment: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appointment.reason, "");

        let json = r#"{"record_id":"R1","patient_id":"P1","diagnosis":"Flu"}"#;
        let record: MedicalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.notes, "");
    }

    #[test]
    fn test_non_numeric_age_rejected() {
        let json = r#"{"patient_id":"P1","name":"Ali","age":"twenty"}"#;
        assert!(serde_json::from_str::<Patient>(json).is_err());

        let json = r#"{"patient_id":"P1","name":"Ali","age":-3}"#;
        assert!(serde_json::from_str::<Patient>(json).is_err());
    }

    #[test]
    fn test_matches_id_or_name_substring() {
        let patient = Patient::new("P001", "Ali Khan", 21);

        assert!(patient.matches("P001"));
        assert!(patient.matches("khan"));
        assert!(patient.matches("ALI"));
        assert!(!patient.matches("P00"));
        assert!(!patient.matches("Sara"));
    }

    #[test]
    fn test_doctor_matches_specialization() {
        let doctor = Doctor::new("D1", "House", "Diagnostics");
        assert!(doctor.matches("diag"));
        assert!(!doctor.matches("cardio"));
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(RecordKind::MedicalRecord.default_file_name(), "records.txt");
        assert_eq!(RecordKind::Appointment.id_prefix(), "A");
        assert_eq!(RecordKind::MedicalRecord.to_string(), "Medical record");
    }
}
